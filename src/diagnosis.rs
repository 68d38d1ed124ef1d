// Significance aggregation for the most-changed abnormal metrics
//
// The top-K abnormal metrics by |percent change| get every test in the
// battery, run on their raw per-period observations. Metrics that only
// carry summary aggregates are reported with low confidence; no synthetic
// samples are ever generated to feed a test.

use crate::change::ChangeRecord;
use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::hypothesis::{default_tests, HypothesisTest, TestResult};
use crate::sample::MetricSample;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Note attached when a metric has only summary aggregates
pub const INSUFFICIENT_RAW_DATA: &str = "insufficient raw data for hypothesis testing";

/// How strongly the tests back the observed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// High when every test in the battery ran and was significant,
    /// medium when at least one was, low otherwise
    pub fn from_results(results: &[TestResult], battery_size: usize) -> Self {
        let significant = results.iter().filter(|r| r.significant).count();
        if battery_size > 0 && significant == battery_size {
            Confidence::High
        } else if significant > 0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Diagnosis of one abnormal metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub change: ChangeRecord,
    pub tests: Vec<TestResult>,
    pub confidence: Confidence,
    /// Why tests are missing, when they are
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runs the hypothesis-test battery over the top-K abnormal metrics
pub struct SignificanceAggregator {
    tests: Vec<Box<dyn HypothesisTest>>,
    config: ComparisonConfig,
}

impl SignificanceAggregator {
    /// Aggregator with the rank-sum and distribution tests
    pub fn new(config: &ComparisonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tests: default_tests(config.significance_alpha, config.distribution_thresholds),
            config: config.clone(),
        })
    }

    /// Replace the test battery
    pub fn with_tests(mut self, tests: Vec<Box<dyn HypothesisTest>>) -> Self {
        self.tests = tests;
        self
    }

    /// Diagnose the `top_k` metrics with the largest |percent change|
    ///
    /// Ties in |percent change| are broken by metric name, then input order.
    pub fn diagnose(&self, abnormal: &[MetricSample]) -> Vec<DiagnosticEntry> {
        let mut candidates: Vec<(&MetricSample, ChangeRecord)> = abnormal
            .iter()
            .map(|sample| (sample, ChangeRecord::from_sample(sample, &self.config)))
            .collect();

        candidates.sort_by(|(_, a), (_, b)| {
            magnitude(b)
                .total_cmp(&magnitude(a))
                .then_with(|| a.name.cmp(&b.name))
        });
        candidates.truncate(self.config.top_k);

        tracing::debug!(
            candidates = abnormal.len(),
            selected = candidates.len(),
            tests = self.tests.len(),
            "running significance tests"
        );

        if self.config.parallel {
            candidates
                .into_par_iter()
                .map(|(sample, record)| self.diagnose_one(sample, record))
                .collect()
        } else {
            candidates
                .into_iter()
                .map(|(sample, record)| self.diagnose_one(sample, record))
                .collect()
        }
    }

    fn diagnose_one(&self, sample: &MetricSample, change: ChangeRecord) -> DiagnosticEntry {
        let (Some(period1), Some(period2)) = (sample.period1.raw(), sample.period2.raw()) else {
            tracing::warn!(metric = %sample.name, "{}", INSUFFICIENT_RAW_DATA);
            return DiagnosticEntry {
                change,
                tests: Vec::new(),
                confidence: Confidence::Low,
                note: Some(INSUFFICIENT_RAW_DATA.to_string()),
            };
        };

        let mut results = Vec::with_capacity(self.tests.len());
        let mut failures = Vec::new();

        for test in &self.tests {
            match test.run(period1, period2) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(metric = %sample.name, test = %test.kind(), "test skipped: {}", e);
                    failures.push(e.to_string());
                }
            }
        }

        let confidence = Confidence::from_results(&results, self.tests.len());
        tracing::debug!(metric = %sample.name, %confidence, "metric diagnosed");

        DiagnosticEntry {
            change,
            tests: results,
            confidence,
            note: if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            },
        }
    }
}

fn magnitude(record: &ChangeRecord) -> f64 {
    record.percent_change.map(f64::abs).unwrap_or(f64::NEG_INFINITY)
}

/// Diagnose the top-K abnormal metrics with the default test battery
pub fn diagnose(abnormal: &[MetricSample], config: &ComparisonConfig) -> Result<Vec<DiagnosticEntry>> {
    Ok(SignificanceAggregator::new(config)?.diagnose(abnormal))
}

/// Order entries for display: confidence first, then |percent change|
pub fn by_confidence(a: &DiagnosticEntry, b: &DiagnosticEntry) -> Ordering {
    b.confidence
        .cmp(&a.confidence)
        .then_with(|| magnitude(&b.change).total_cmp(&magnitude(&a.change)))
        .then_with(|| a.change.name.cmp(&b.change.name))
}
