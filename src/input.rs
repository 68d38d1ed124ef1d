//! JSON input document for the `kpi-compare` binary
//!
//! ```json
//! {
//!   "metrics": [
//!     { "name": "DL_THROUGHPUT", "weight": 9,
//!       "period1": [140, 142, 145], "period2": [150, 149, 151] },
//!     { "name": "PAGING_DISCARD",
//!       "period1": { "mean": 12.5, "count": 96, "std_dev": 1.2 },
//!       "period2": { "mean": 19.0, "count": 96 } }
//!   ],
//!   "weights": { "PAGING_DISCARD": 4 }
//! }
//! ```

use crate::sample::MetricSample;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Metrics plus an optional weight map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub metrics: Vec<MetricSample>,
    /// Overrides the per-metric `weight` field
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub weights: HashMap<String, f64>,
}

impl ComparisonInput {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse comparison input JSON")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        Self::from_json_str(&content)
    }
}
