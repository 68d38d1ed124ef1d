//! Full comparison run: screening, significance diagnosis and ranking
//!
//! The engine is a pure function of its inputs. It holds no state between
//! runs, so one engine can be shared across threads.

use crate::change::ChangeRecord;
use crate::config::ComparisonConfig;
use crate::diagnosis::{DiagnosticEntry, SignificanceAggregator};
use crate::error::Result;
use crate::ranking::{rank_records, RankQuery, RankedPage};
use crate::sample::MetricSample;
use crate::screener::{screen, AlarmSummary};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Everything one comparison run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub alarm: AlarmSummary,
    /// Top-K abnormal metrics, largest |percent change| first
    pub diagnostics: Vec<DiagnosticEntry>,
    pub ranking: RankedPage,
}

/// Configured comparison pipeline
pub struct ComparisonEngine {
    config: ComparisonConfig,
    weights: HashMap<String, f64>,
    query: RankQuery,
    aggregator: SignificanceAggregator,
}

impl ComparisonEngine {
    /// Fails fast with `InvalidConfig` before any metric is touched
    pub fn new(config: &ComparisonConfig) -> Result<Self> {
        let aggregator = SignificanceAggregator::new(config)?;
        Ok(Self {
            config: config.clone(),
            weights: HashMap::new(),
            query: RankQuery::all(),
            aggregator,
        })
    }

    /// Per-metric weights that override the weights carried by the samples
    pub fn with_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.weights = weights;
        self
    }

    /// Filter, sort and page applied to the ranked table
    pub fn with_query(mut self, query: RankQuery) -> Self {
        self.query = query;
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    pub fn analyze(&self, samples: &[MetricSample]) -> Result<ComparisonReport> {
        self.query.validate()?;
        let samples = self.apply_weights(samples);

        let outcome = screen(&samples, &self.config)?;
        let diagnostics = self.aggregator.diagnose(&outcome.abnormal);

        let records: Vec<ChangeRecord> = samples
            .iter()
            .map(|sample| ChangeRecord::from_sample(sample, &self.config))
            .collect();
        let ranking = rank_records(records, &self.config, &self.query)?;

        tracing::info!(
            metrics = samples.len(),
            abnormal = outcome.alarm.abnormal_count,
            diagnosed = diagnostics.len(),
            level = %outcome.alarm.alarm_level,
            "comparison complete"
        );

        Ok(ComparisonReport {
            alarm: outcome.alarm,
            diagnostics,
            ranking,
        })
    }

    fn apply_weights<'a>(&self, samples: &'a [MetricSample]) -> Cow<'a, [MetricSample]> {
        if self.weights.is_empty() {
            return Cow::Borrowed(samples);
        }

        for name in self.weights.keys() {
            if !samples.iter().any(|s| &s.name == name) {
                tracing::warn!(metric = %name, "weight given for unknown metric");
            }
        }

        Cow::Owned(
            samples
                .iter()
                .map(|sample| match self.weights.get(&sample.name) {
                    Some(&weight) => sample.clone().with_weight(weight),
                    None => sample.clone(),
                })
                .collect(),
        )
    }
}

/// Run the whole pipeline with default ranking (all metrics, weight descending)
pub fn analyze(samples: &[MetricSample], config: &ComparisonConfig) -> Result<ComparisonReport> {
    ComparisonEngine::new(config)?.analyze(samples)
}
