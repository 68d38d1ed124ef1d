//! Plain-text rendering of a comparison report

use crate::change::ChangeRecord;
use crate::diagnosis::DiagnosticEntry;
use crate::engine::ComparisonReport;
use crate::hypothesis::TestStatistics;
use crate::screener::AlarmLevel;

impl ComparisonReport {
    /// Human-readable summary: alarm, diagnostics, ranked table
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        let alarm = &self.alarm;

        let header = match alarm.alarm_level {
            AlarmLevel::Normal => "✅ ALARM LEVEL: NORMAL",
            AlarmLevel::Caution => "⚠️  ALARM LEVEL: CAUTION",
            AlarmLevel::Warning => "🟠 ALARM LEVEL: WARNING",
            AlarmLevel::Critical => "❌ ALARM LEVEL: CRITICAL",
        };
        report.push_str(header);
        report.push_str("\n\n");
        report.push_str(&format!(
            "Abnormal metrics: {} of {} (score {:.3})\n",
            alarm.abnormal_count, alarm.total_count, alarm.abnormal_score
        ));

        if !self.diagnostics.is_empty() {
            report.push_str(&format!(
                "\n📊 Significance diagnostics ({}):\n",
                self.diagnostics.len()
            ));
            for entry in &self.diagnostics {
                push_diagnostic(&mut report, entry);
            }
        }

        let page = &self.ranking;
        report.push_str(&format!(
            "\n📋 Ranked metrics (page {} of {}, {} matching):\n",
            page.page_index.saturating_add(1),
            page.total_pages.max(1),
            page.total_matches
        ));
        if page.records.is_empty() {
            report.push_str("  (none)\n");
        } else {
            report.push_str(&format!(
                "  {:<24} {:>6} {:>12} {:>12} {:>9}  {:<6} {}\n",
                "METRIC", "WEIGHT", "MEAN N-1", "MEAN N", "CHANGE", "TREND", "SEVERITY"
            ));
            for record in &page.records {
                push_row(&mut report, record);
            }
        }

        report
    }
}

fn push_diagnostic(report: &mut String, entry: &DiagnosticEntry) {
    report.push_str(&format!(
        "  {} ({}, confidence: {})\n",
        entry.change.name,
        format_percent(entry.change.percent_change),
        entry.confidence
    ));
    for test in &entry.tests {
        let detail = match test.statistics {
            TestStatistics::RankSum { u, z, .. } => format!("U={:.1}, z={:.3}", u, z),
            TestStatistics::Distribution { d, difference, .. } => {
                format!("D={:.3}, {} difference", d, difference)
            }
        };
        report.push_str(&format!(
            "    {} {}: p={:.4} ({})\n",
            if test.significant { "✓" } else { "·" },
            test.test,
            test.p_value,
            detail
        ));
    }
    if let Some(note) = &entry.note {
        report.push_str(&format!("    note: {}\n", note));
    }
}

fn push_row(report: &mut String, record: &ChangeRecord) {
    let mean = |stats: Option<crate::sample::PeriodStats>| {
        stats.map_or_else(|| "-".to_string(), |s| format!("{:.3}", s.mean))
    };
    report.push_str(&format!(
        "  {:<24} {:>6.1} {:>12} {:>12} {:>9}  {:<6} {}\n",
        record.name,
        record.weight,
        mean(record.period1),
        mean(record.period2),
        format_percent(record.percent_change),
        record.trend,
        record.severity
    ));
}

fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(pc) => format!("{:+.2}%", pc),
        None => "N/A".to_string(),
    }
}
