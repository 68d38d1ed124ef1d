//! CLI argument parsing for kpi-compare

use crate::error::Result;
use crate::ranking::{NameFilter, RankQuery, SortKey, SortOrder, TrendFilter, WeightBucket};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the comparison report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Threshold preset used when no config file is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Default,
    Strict,
    Permissive,
}

#[derive(Parser, Debug)]
#[command(name = "kpi-compare")]
#[command(version)]
#[command(about = "Compare KPI counters between two periods and test which changes are significant", long_about = None)]
pub struct Cli {
    /// JSON file with the metrics to compare
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// TOML file with comparison thresholds (overrides --preset)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in threshold preset
    #[arg(long, value_enum, default_value = "default")]
    pub preset: Preset,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Number of abnormal metrics to run significance tests on
    #[arg(long = "top-k", value_name = "K")]
    pub top_k: Option<usize>,

    /// Significance level for the hypothesis tests
    #[arg(long, value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Only rank metrics with this trend (all, up, down, stable)
    #[arg(long, default_value = "all")]
    pub trend: TrendFilter,

    /// Only rank metrics whose name contains this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub name: Option<String>,

    /// Treat --name as a regular expression
    #[arg(long, requires = "name")]
    pub regex: bool,

    /// Only rank metrics in this weight bucket (high, medium, low)
    #[arg(long)]
    pub bucket: Option<WeightBucket>,

    /// Sort key for the ranked table (weight, percent-change, name)
    #[arg(long, default_value = "weight")]
    pub sort: SortKey,

    /// Sort order (asc or desc)
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,

    /// Zero-based page of the ranked table
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Rows per page of the ranked table
    #[arg(long = "page-size", default_value_t = 20)]
    pub page_size: usize,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Ranking query described by the filter, sort and paging flags
    pub fn rank_query(&self) -> Result<RankQuery> {
        let name = match (&self.name, self.regex) {
            (Some(pattern), true) => Some(NameFilter::pattern(pattern)?),
            (Some(text), false) => Some(NameFilter::substring(text.as_str())),
            (None, _) => None,
        };

        Ok(RankQuery {
            name,
            bucket: self.bucket,
            trend: self.trend,
            sort_key: self.sort,
            order: self.order,
            page: self.page,
            page_size: self.page_size,
        })
    }
}
