//! Period-over-period change of a single metric
//!
//! A `ChangeRecord` exists for every metric, including metrics with a
//! missing period or a zero baseline. Those carry `None` in the affected
//! fields plus a [`MetricFlag`], and classify as `stable` / `none`.

use crate::config::{ComparisonConfig, SeverityThresholds};
use crate::error::{EngineError, Result};
use crate::sample::{MetricSample, PeriodStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the period-over-period change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// Classify a percent change; the boundary itself is `stable`
    pub fn classify(percent_change: Option<f64>, threshold: f64) -> Self {
        match percent_change {
            Some(pc) if pc > threshold => Trend::Up,
            Some(pc) if pc < -threshold => Trend::Down,
            _ => Trend::Stable,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Per-metric severity from |percent change|
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Caution,
    Warning,
    Critical,
}

impl Severity {
    pub fn classify(percent_change: Option<f64>, thresholds: &SeverityThresholds) -> Self {
        let Some(pc) = percent_change else {
            return Severity::None;
        };
        let magnitude = pc.abs();
        if magnitude >= thresholds.critical {
            Severity::Critical
        } else if magnitude >= thresholds.warning {
            Severity::Warning
        } else if magnitude >= thresholds.caution {
            Severity::Caution
        } else {
            Severity::None
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Caution => write!(f, "caution"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Conditions recorded on a metric instead of aborting the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFlag {
    /// Period N-1 has no data
    MissingPeriod1,
    /// Period N has no data
    MissingPeriod2,
    /// Period N-1 mean is exactly zero, so percent change is undefined
    UndefinedRatio,
}

/// Comparison of one metric between period N-1 and period N
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub name: String,
    pub weight: f64,
    pub period1: Option<PeriodStats>,
    pub period2: Option<PeriodStats>,
    /// `mean2 - mean1`
    pub absolute_change: Option<f64>,
    /// `(mean2 - mean1) / mean1 * 100`
    pub percent_change: Option<f64>,
    pub trend: Trend,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<MetricFlag>,
}

impl ChangeRecord {
    /// Build the record for a sample under the given thresholds
    pub fn from_sample(sample: &MetricSample, config: &ComparisonConfig) -> Self {
        Self::with_weight(sample, sample.weight, config)
    }

    /// Build the record with an explicit weight (weight-map override)
    pub fn with_weight(sample: &MetricSample, weight: f64, config: &ComparisonConfig) -> Self {
        let period1 = sample.period1.stats();
        let period2 = sample.period2.stats();
        let mut flags = Vec::new();

        if period1.is_none() {
            flags.push(MetricFlag::MissingPeriod1);
        }
        if period2.is_none() {
            flags.push(MetricFlag::MissingPeriod2);
        }

        let (absolute_change, percent_change) = match (&period1, &period2) {
            (Some(p1), Some(p2)) => {
                let absolute = p2.mean - p1.mean;
                let percent = if p1.mean == 0.0 {
                    tracing::warn!(
                        metric = %sample.name,
                        "period N-1 mean is zero, percent change undefined"
                    );
                    flags.push(MetricFlag::UndefinedRatio);
                    None
                } else {
                    Some(absolute * 100.0 / p1.mean)
                };
                (Some(absolute), percent)
            }
            _ => (None, None),
        };

        Self {
            name: sample.name.clone(),
            weight,
            period1,
            period2,
            absolute_change,
            percent_change,
            trend: Trend::classify(percent_change, config.trend_threshold),
            severity: Severity::classify(percent_change, &config.severity_thresholds),
            flags,
        }
    }

    /// Percent change, or `UndefinedRatio` when it cannot be computed
    pub fn percent_change_checked(&self) -> Result<f64> {
        self.percent_change.ok_or_else(|| EngineError::UndefinedRatio {
            metric: self.name.clone(),
            quantity: "percent change",
        })
    }

    /// RSD of period N-1, or `UndefinedRatio` for a missing or zero-mean period
    pub fn rsd1_checked(&self) -> Result<f64> {
        self.period1
            .and_then(|p| p.rsd_percent)
            .ok_or_else(|| EngineError::UndefinedRatio {
                metric: self.name.clone(),
                quantity: "period N-1 RSD",
            })
    }

    /// RSD of period N, or `UndefinedRatio` for a missing or zero-mean period
    pub fn rsd2_checked(&self) -> Result<f64> {
        self.period2
            .and_then(|p| p.rsd_percent)
            .ok_or_else(|| EngineError::UndefinedRatio {
                metric: self.name.clone(),
                quantity: "period N RSD",
            })
    }

    pub fn has_both_periods(&self) -> bool {
        self.period1.is_some() && self.period2.is_some()
    }

    pub fn has_flag(&self, flag: MetricFlag) -> bool {
        self.flags.contains(&flag)
    }
}
