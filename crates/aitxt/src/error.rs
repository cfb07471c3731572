//! Error model for operations that fail outright.
//!
//! Data-quality problems in parsed input are reported as diagnostics, not
//! through this type.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    #[error("invalid document: {}", .violations.join("; "))]
    InvalidDocument { violations: Vec<String> },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
