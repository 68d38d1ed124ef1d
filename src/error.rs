//! Error taxonomy for the comparison engine
//!
//! Only `InvalidConfig` aborts a whole comparison run. `InsufficientData` and
//! `UndefinedRatio` are per-metric conditions: the engine records them on the
//! affected metric and carries on with the rest.

use thiserror::Error;

/// Errors raised by the comparison engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Insufficient data for {test}: {group} needs at least {required} observations, got {actual}")]
    InsufficientData {
        test: &'static str,
        group: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Undefined ratio: {quantity} of '{metric}' has a zero denominator")]
    UndefinedRatio {
        metric: String,
        quantity: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
