//! Per-metric period data and descriptive statistics
//!
//! A period is either a raw observation array, a pre-aggregated summary, or
//! missing. Missing data is never treated as zero.

use serde::{Deserialize, Serialize};

/// Pre-aggregated statistics for a period when raw observations are unavailable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryAggregate {
    pub mean: f64,
    pub count: usize,
    #[serde(default)]
    pub std_dev: f64,
}

/// Observations of one metric over one comparison window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodData {
    /// Raw per-observation values
    Raw(Vec<f64>),
    /// Only the aggregate is known
    Summary(SummaryAggregate),
    /// No data for this period
    #[default]
    Missing,
}

impl PeriodData {
    /// Descriptive statistics, or `None` when the period holds no data
    pub fn stats(&self) -> Option<PeriodStats> {
        match self {
            PeriodData::Raw(values) => PeriodStats::from_observations(values),
            PeriodData::Summary(summary) => PeriodStats::from_summary(summary),
            PeriodData::Missing => None,
        }
    }

    /// Raw observations, if this period carries them
    pub fn raw(&self) -> Option<&[f64]> {
        match self {
            PeriodData::Raw(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.stats().is_some()
    }
}

impl From<Vec<f64>> for PeriodData {
    fn from(values: Vec<f64>) -> Self {
        PeriodData::Raw(values)
    }
}

impl From<SummaryAggregate> for PeriodData {
    fn from(summary: SummaryAggregate) -> Self {
        PeriodData::Summary(summary)
    }
}

/// One performance counter (PEG) observed over the N-1 and N periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub name: String,
    #[serde(default)]
    pub period1: PeriodData,
    #[serde(default)]
    pub period2: PeriodData,
    /// Caller-supplied importance; used for ranking only
    #[serde(default)]
    pub weight: f64,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, period1: Vec<f64>, period2: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            period1: PeriodData::Raw(period1),
            period2: PeriodData::Raw(period2),
            weight: 0.0,
        }
    }

    /// Sample built from aggregates only (no hypothesis testing possible)
    pub fn from_summaries(
        name: impl Into<String>,
        period1: SummaryAggregate,
        period2: SummaryAggregate,
    ) -> Self {
        Self {
            name: name.into(),
            period1: PeriodData::Summary(period1),
            period2: PeriodData::Summary(period2),
            weight: 0.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn has_both_periods(&self) -> bool {
        self.period1.is_present() && self.period2.is_present()
    }
}

/// Descriptive statistics of one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub mean: f64,
    pub count: usize,
    /// Sample standard deviation (n - 1 denominator, 0 for a single observation)
    pub std_dev: f64,
    /// `std_dev / |mean| * 100`; `None` when the mean is exactly zero
    pub rsd_percent: Option<f64>,
}

impl PeriodStats {
    /// Compute statistics from raw observations; `None` for an empty slice
    pub fn from_observations(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };

        Some(Self {
            mean,
            count: values.len(),
            std_dev,
            rsd_percent: rsd(mean, std_dev),
        })
    }

    /// Wrap a caller-supplied aggregate
    ///
    /// `None` when it covers zero observations or carries a non-finite mean
    /// or a negative or non-finite standard deviation. Such a period is
    /// reported as missing rather than flowing into RSD and percent change.
    pub fn from_summary(summary: &SummaryAggregate) -> Option<Self> {
        if summary.count == 0 {
            return None;
        }
        if !summary.mean.is_finite() || !summary.std_dev.is_finite() || summary.std_dev < 0.0 {
            tracing::warn!(
                mean = summary.mean,
                std_dev = summary.std_dev,
                "summary aggregate rejected, period treated as missing"
            );
            return None;
        }
        Some(Self {
            mean: summary.mean,
            count: summary.count,
            std_dev: summary.std_dev,
            rsd_percent: rsd(summary.mean, summary.std_dev),
        })
    }
}

fn rsd(mean: f64, std_dev: f64) -> Option<f64> {
    if mean == 0.0 {
        None
    } else {
        Some(std_dev / mean.abs() * 100.0)
    }
}
