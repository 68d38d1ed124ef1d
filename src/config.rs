// Configuration for two-period KPI comparison
//
// Every threshold the engine uses lives here. Nothing is read from the
// environment; callers pass a config value into each entry point.

use crate::error::{EngineError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// |percent change| boundaries for the per-metric severity rating
///
/// `< caution` → none, `[caution, warning)` → caution,
/// `[warning, critical)` → warning, `>= critical` → critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub caution: f64,
    pub warning: f64,
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            caution: 10.0,
            warning: 20.0,
            critical: 30.0,
        }
    }
}

/// Abnormal-score boundaries (fraction of abnormal metrics) for the run alarm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmThresholds {
    pub caution: f64,
    pub warning: f64,
    pub critical: f64,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            caution: 0.1,
            warning: 0.2,
            critical: 0.3,
        }
    }
}

/// KS D-statistic boundaries: `< small` → small, `< medium` → medium, else large
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionThresholds {
    pub small: f64,
    pub medium: f64,
}

impl Default for DistributionThresholds {
    fn default() -> Self {
        Self {
            small: 0.1,
            medium: 0.2,
        }
    }
}

/// Lower bounds of the weight buckets used by the ranked table
///
/// `weight >= high` → high, `weight >= medium` → medium, otherwise low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightBuckets {
    pub high: f64,
    pub medium: f64,
}

impl Default for WeightBuckets {
    fn default() -> Self {
        Self {
            high: 8.0,
            medium: 6.0,
        }
    }
}

/// Configuration for a comparison run
///
/// # Example
/// ```
/// use kpi_compare::ComparisonConfig;
///
/// let config = ComparisonConfig::default();
/// assert_eq!(config.significance_alpha, 0.05);
/// assert_eq!(config.top_k, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// A metric is abnormal when |percent change| is strictly above this (percent)
    pub screening_threshold: f64,

    /// Significance level for both hypothesis tests
    ///
    /// - 0.05 (default): 5% false positive rate per test
    /// - 0.01: stricter, fewer false alarms
    /// - 0.10: looser, catches marginal shifts
    pub significance_alpha: f64,

    /// Trend is `up` above +threshold, `down` below -threshold (percent, strict)
    pub trend_threshold: f64,

    pub severity_thresholds: SeverityThresholds,

    pub alarm_thresholds: AlarmThresholds,

    pub distribution_thresholds: DistributionThresholds,

    pub weight_buckets: WeightBuckets,

    /// Number of most-changed abnormal metrics that get hypothesis tests
    pub top_k: usize,

    /// Run per-metric hypothesis tests on the rayon pool
    pub parallel: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            screening_threshold: 10.0,
            significance_alpha: 0.05,
            trend_threshold: 5.0,
            severity_thresholds: SeverityThresholds::default(),
            alarm_thresholds: AlarmThresholds::default(),
            distribution_thresholds: DistributionThresholds::default(),
            weight_buckets: WeightBuckets::default(),
            top_k: 5,
            parallel: true,
        }
    }
}

impl ComparisonConfig {
    /// Stricter significance, more metrics screened in
    ///
    /// Use when a false alarm costs more than a late one.
    pub fn strict() -> Self {
        Self {
            screening_threshold: 5.0,
            significance_alpha: 0.01,
            top_k: 10,
            ..Self::default()
        }
    }

    /// Looser significance, only large changes screened in
    pub fn permissive() -> Self {
        Self {
            screening_threshold: 15.0,
            significance_alpha: 0.10,
            top_k: 3,
            ..Self::default()
        }
    }

    /// Parse a config from TOML; missing keys fall back to defaults
    ///
    /// # Example TOML
    /// ```toml
    /// significance_alpha = 0.01
    /// top_k = 8
    ///
    /// [severity_thresholds]
    /// caution = 5.0
    /// warning = 15.0
    /// critical = 25.0
    /// ```
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_alpha > 0.0 && self.significance_alpha < 1.0) {
            return Err(invalid(format!(
                "significance_alpha must be in (0, 1), got {}",
                self.significance_alpha
            )));
        }

        if self.top_k == 0 {
            return Err(invalid("top_k must be >= 1, got 0".to_string()));
        }

        non_negative("screening_threshold", self.screening_threshold)?;
        non_negative("trend_threshold", self.trend_threshold)?;

        let s = &self.severity_thresholds;
        ordered(
            "severity_thresholds",
            &[("caution", s.caution), ("warning", s.warning), ("critical", s.critical)],
        )?;

        let a = &self.alarm_thresholds;
        ordered(
            "alarm_thresholds",
            &[("caution", a.caution), ("warning", a.warning), ("critical", a.critical)],
        )?;
        if a.critical > 1.0 {
            return Err(invalid(format!(
                "alarm_thresholds.critical must be <= 1, got {}",
                a.critical
            )));
        }

        let d = &self.distribution_thresholds;
        ordered("distribution_thresholds", &[("small", d.small), ("medium", d.medium)])?;
        if d.medium > 1.0 {
            return Err(invalid(format!(
                "distribution_thresholds.medium must be <= 1, got {}",
                d.medium
            )));
        }

        let w = &self.weight_buckets;
        if !w.high.is_finite() || !w.medium.is_finite() || w.medium > w.high {
            return Err(invalid(format!(
                "weight_buckets must satisfy medium <= high, got medium={} high={}",
                w.medium, w.high
            )));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> EngineError {
    EngineError::InvalidConfig(msg)
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

fn ordered(group: &str, values: &[(&str, f64)]) -> Result<()> {
    for (name, value) in values {
        non_negative(&format!("{}.{}", group, name), *value)?;
    }
    for pair in values.windows(2) {
        if pair[0].1 > pair[1].1 {
            return Err(invalid(format!(
                "{}: {} ({}) must not exceed {} ({})",
                group, pair[0].0, pair[0].1, pair[1].0, pair[1].1
            )));
        }
    }
    Ok(())
}
