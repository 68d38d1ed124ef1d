//! Ranked comparison table
//!
//! One [`ChangeRecord`] per metric, independent of screening. Supports name,
//! weight-bucket and trend filters, three sort keys and stateless paging.
//! The same inputs and query always produce the same page.

use crate::change::{ChangeRecord, Trend};
use crate::config::{ComparisonConfig, WeightBuckets};
use crate::error::{EngineError, Result};
use crate::sample::MetricSample;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Importance class of a metric weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightBucket {
    High,
    Medium,
    Low,
}

impl WeightBucket {
    pub fn classify(weight: f64, buckets: &WeightBuckets) -> Self {
        if weight >= buckets.high {
            WeightBucket::High
        } else if weight >= buckets.medium {
            WeightBucket::Medium
        } else {
            WeightBucket::Low
        }
    }
}

impl FromStr for WeightBucket {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(WeightBucket::High),
            "medium" => Ok(WeightBucket::Medium),
            "low" => Ok(WeightBucket::Low),
            other => Err(format!("unknown weight bucket '{}' (expected high|medium|low)", other)),
        }
    }
}

/// Trend filter; `All` keeps every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendFilter {
    #[default]
    All,
    Up,
    Down,
    Stable,
}

impl TrendFilter {
    pub fn matches(&self, trend: Trend) -> bool {
        match self {
            TrendFilter::All => true,
            TrendFilter::Up => trend == Trend::Up,
            TrendFilter::Down => trend == Trend::Down,
            TrendFilter::Stable => trend == Trend::Stable,
        }
    }
}

impl FromStr for TrendFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(TrendFilter::All),
            "up" => Ok(TrendFilter::Up),
            "down" => Ok(TrendFilter::Down),
            "stable" => Ok(TrendFilter::Stable),
            other => Err(format!("unknown trend '{}' (expected all|up|down|stable)", other)),
        }
    }
}

/// Case-insensitive metric name filter
#[derive(Debug, Clone)]
pub struct NameFilter(NameMatcher);

#[derive(Debug, Clone)]
enum NameMatcher {
    /// Needle is stored lowercased
    Substring(String),
    Pattern(Regex),
}

impl NameFilter {
    pub fn substring(text: impl Into<String>) -> Self {
        NameFilter(NameMatcher::Substring(text.into().to_lowercase()))
    }

    /// Compile a regex filter; a malformed pattern is a caller error
    pub fn pattern(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(|re| NameFilter(NameMatcher::Pattern(re)))
            .map_err(|e| EngineError::InvalidConfig(format!("invalid name pattern: {}", e)))
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.0 {
            NameMatcher::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            NameMatcher::Pattern(re) => re.is_match(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Weight,
    PercentChange,
    Name,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "weight" => Ok(SortKey::Weight),
            "percent_change" | "change" => Ok(SortKey::PercentChange),
            "name" => Ok(SortKey::Name),
            other => Err(format!(
                "unknown sort key '{}' (expected weight|percent-change|name)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{}' (expected asc|desc)", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

/// Filter, sort and page request for the ranked table
#[derive(Debug, Clone)]
pub struct RankQuery {
    pub name: Option<NameFilter>,
    pub bucket: Option<WeightBucket>,
    pub trend: TrendFilter,
    pub sort_key: SortKey,
    pub order: SortOrder,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            name: None,
            bucket: None,
            trend: TrendFilter::All,
            sort_key: SortKey::Weight,
            order: SortOrder::Descending,
            page: 0,
            page_size: 20,
        }
    }
}

impl RankQuery {
    /// Query returning every record on a single page, sorted by weight
    pub fn all() -> Self {
        Self {
            page_size: usize::MAX,
            ..Self::default()
        }
    }

    pub fn with_trend(mut self, trend: TrendFilter) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.order = order;
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Reject paging that can never produce a page
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(EngineError::InvalidConfig(
                "page_size must be >= 1, got 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of the ranked table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub records: Vec<ChangeRecord>,
    /// Records matching the filters, across all pages
    pub total_matches: usize,
    pub total_pages: usize,
    pub page_index: usize,
    pub page_size: usize,
}

/// Rank all metrics and return the requested page
pub fn rank(
    samples: &[MetricSample],
    config: &ComparisonConfig,
    query: &RankQuery,
) -> Result<RankedPage> {
    config.validate()?;
    query.validate()?;
    let records = samples
        .iter()
        .map(|sample| ChangeRecord::from_sample(sample, config))
        .collect();
    rank_records(records, config, query)
}

/// Filter, sort and page already-built records
pub fn rank_records(
    records: Vec<ChangeRecord>,
    config: &ComparisonConfig,
    query: &RankQuery,
) -> Result<RankedPage> {
    query.validate()?;

    let mut matching: Vec<ChangeRecord> = records
        .into_iter()
        .filter(|record| {
            query.name.as_ref().map_or(true, |f| f.matches(&record.name))
                && query.bucket.map_or(true, |b| {
                    WeightBucket::classify(record.weight, &config.weight_buckets) == b
                })
                && query.trend.matches(record.trend)
        })
        .collect();

    // stable sort: equal keys keep input order after the name tie-break
    matching.sort_by(|a, b| compare(a, b, query.sort_key, query.order));

    let total_matches = matching.len();
    let total_pages = total_matches.div_ceil(query.page_size);
    let start = query.page.saturating_mul(query.page_size).min(total_matches);
    let end = start.saturating_add(query.page_size).min(total_matches);

    tracing::debug!(
        total_matches,
        page = query.page,
        page_size = query.page_size,
        "ranked comparison table"
    );

    Ok(RankedPage {
        records: matching.drain(start..end).collect(),
        total_matches,
        total_pages,
        page_index: query.page,
        page_size: query.page_size,
    })
}

fn compare(a: &ChangeRecord, b: &ChangeRecord, key: SortKey, order: SortOrder) -> Ordering {
    let directed = |ord: Ordering| match order {
        SortOrder::Ascending => ord,
        SortOrder::Descending => ord.reverse(),
    };

    let primary = match key {
        SortKey::Weight => directed(a.weight.total_cmp(&b.weight)),
        SortKey::Name => directed(a.name.cmp(&b.name)),
        // undefined changes sort last in either direction
        SortKey::PercentChange => match (a.percent_change, b.percent_change) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };

    primary.then_with(|| a.name.cmp(&b.name))
}
