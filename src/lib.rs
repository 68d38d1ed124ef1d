//! kpi-compare - two-period KPI comparison with significance testing
//!
//! This library compares performance counters between period N-1 and
//! period N: it screens every metric for abnormal change, runs Mann-Whitney U
//! and Kolmogorov-Smirnov tests on the most-changed ones, and produces a
//! filterable, sortable ranked table of all metrics.

pub mod change;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod hypothesis;
pub mod input;
pub mod ranking;
pub mod report;
pub mod sample;
pub mod screener;

pub use change::{ChangeRecord, MetricFlag, Severity, Trend};
pub use config::ComparisonConfig;
pub use diagnosis::{diagnose, Confidence, DiagnosticEntry, SignificanceAggregator};
pub use engine::{analyze, ComparisonEngine, ComparisonReport};
pub use error::{EngineError, Result};
pub use hypothesis::{DistributionTest, HypothesisTest, RankSumTest, TestKind, TestResult};
pub use ranking::{
    rank, NameFilter, RankQuery, RankedPage, SortKey, SortOrder, TrendFilter, WeightBucket,
};
pub use sample::{MetricSample, PeriodData, PeriodStats, SummaryAggregate};
pub use screener::{screen, AlarmLevel, AlarmSummary, ScreeningOutcome};
