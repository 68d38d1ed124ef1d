// Change screening: which metrics moved enough to look at, and how alarming
// the run is overall.
//
// A metric is abnormal when |percent change| > screening_threshold (strict).
// Metrics missing a period, or with an undefined percent change, are never
// abnormal but still count towards the total.

use crate::change::ChangeRecord;
use crate::config::{AlarmThresholds, ComparisonConfig};
use crate::error::Result;
use crate::sample::MetricSample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse severity of an entire comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmLevel {
    Normal,
    Caution,
    Warning,
    Critical,
}

impl AlarmLevel {
    /// Classify an abnormal score; each boundary belongs to the higher level
    pub fn classify(score: f64, thresholds: &AlarmThresholds) -> Self {
        if score >= thresholds.critical {
            AlarmLevel::Critical
        } else if score >= thresholds.warning {
            AlarmLevel::Warning
        } else if score >= thresholds.caution {
            AlarmLevel::Caution
        } else {
            AlarmLevel::Normal
        }
    }
}

impl fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmLevel::Normal => write!(f, "normal"),
            AlarmLevel::Caution => write!(f, "caution"),
            AlarmLevel::Warning => write!(f, "warning"),
            AlarmLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Run-level alarm derived from the fraction of abnormal metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub abnormal_count: usize,
    pub total_count: usize,
    /// `abnormal_count / total_count`, 0 for an empty run
    pub abnormal_score: f64,
    pub alarm_level: AlarmLevel,
}

impl AlarmSummary {
    pub fn new(abnormal_count: usize, total_count: usize, thresholds: &AlarmThresholds) -> Self {
        let abnormal_score = if total_count == 0 {
            0.0
        } else {
            abnormal_count as f64 / total_count as f64
        };
        let alarm_level = if total_count == 0 {
            AlarmLevel::Normal
        } else {
            AlarmLevel::classify(abnormal_score, thresholds)
        };

        Self {
            abnormal_count,
            total_count,
            abnormal_score,
            alarm_level,
        }
    }
}

/// Output of [`screen`]
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    pub alarm: AlarmSummary,
    /// Abnormal metrics in input order
    pub abnormal: Vec<MetricSample>,
}

/// True when the record's |percent change| exceeds the screening threshold
pub fn is_abnormal(record: &ChangeRecord, screening_threshold: f64) -> bool {
    match record.percent_change {
        Some(pc) => record.has_both_periods() && pc.abs() > screening_threshold,
        None => false,
    }
}

/// Screen all metrics for abnormal period-over-period change
///
/// # Example
/// ```
/// use kpi_compare::{screen, ComparisonConfig, MetricSample, AlarmLevel};
///
/// let samples = vec![
///     MetricSample::new("RRC_SUCC", vec![100.0, 101.0], vec![100.0, 102.0]),
///     MetricSample::new("ERAB_DROP", vec![10.0, 11.0], vec![20.0, 21.0]),
/// ];
/// let outcome = screen(&samples, &ComparisonConfig::default()).unwrap();
/// assert_eq!(outcome.abnormal.len(), 1);
/// assert_eq!(outcome.alarm.alarm_level, AlarmLevel::Critical);
/// ```
pub fn screen(samples: &[MetricSample], config: &ComparisonConfig) -> Result<ScreeningOutcome> {
    config.validate()?;

    let abnormal: Vec<MetricSample> = samples
        .iter()
        .filter(|sample| {
            let record = ChangeRecord::from_sample(sample, config);
            is_abnormal(&record, config.screening_threshold)
        })
        .cloned()
        .collect();

    let alarm = AlarmSummary::new(abnormal.len(), samples.len(), &config.alarm_thresholds);

    tracing::debug!(
        total = alarm.total_count,
        abnormal = alarm.abnormal_count,
        score = alarm.abnormal_score,
        level = %alarm.alarm_level,
        "screening complete"
    );

    Ok(ScreeningOutcome { alarm, abnormal })
}
