//! ai.txt: policy documents for AI crawlers and trainers
//!
//! A site publishes its rules for AI training, scraping, indexing and caching
//! either as line-oriented text (`ai.txt`) or as JSON (`ai.json`). This crate
//! holds the shared document model and the parsers and generators for both
//! formats.
//!
//! ```text
//! ai.txt ──parse_text──┐                ┌──generate_text──▶ ai.txt
//!                      ├──▶ Document ───┤
//! ai.json ─parse_json──┘                └──generate_json──▶ ai.json
//! ```
//!
//! # Example
//!
//! ```
//! use aitxt::{parse_text, generate_text, PolicyValue};
//!
//! let result = parse_text("Site-Name: My Blog\nSite-URL: https://myblog.com\n");
//! assert!(result.success);
//!
//! let doc = result.document.unwrap();
//! assert_eq!(doc.policies.training, PolicyValue::Deny);
//! assert!(doc.agents.contains_key("*"));
//!
//! let text = generate_text(&doc);
//! assert_eq!(parse_text(&text).document, Some(doc));
//! ```

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod json;
pub mod limits;
pub mod parser;
pub mod sanitize;
pub mod schema;
pub mod serializer;

pub use ast::{
    normalize_agent_name, AgentPolicy, Compliance, ContentRequirements, Document, Licensing,
    Policies, PolicyField, PolicyValue, RateLimit, RateWindow, RequirementLevel, SiteInfo,
    TrainingPaths, DEFAULT_SPEC_VERSION, WILDCARD_AGENT,
};
pub use diagnostics::{Diagnostic, ParseResult};
pub use error::FormatError;
pub use json::parse_json;
pub use parser::parse_text;
pub use sanitize::sanitize_value;
pub use serializer::{generate_json, generate_text};

use serde::{Deserialize, Serialize};

/// Wire format of a policy document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Json,
}

impl Format {
    /// Guess the format from the content: JSON documents open with `{`
    pub fn detect(input: &str) -> Self {
        if input.trim_start_matches('\u{FEFF}').trim_start().starts_with('{') {
            Format::Json
        } else {
            Format::Text
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Json => write!(f, "json"),
        }
    }
}

/// Parse a document in either format, detecting which one it is
pub fn parse_document(input: &str) -> ParseResult {
    parse_as(input, Format::detect(input))
}

/// Parse a document in a known format
pub fn parse_as(input: &str, format: Format) -> ParseResult {
    match format {
        Format::Text => parse_text(input),
        Format::Json => parse_json(input),
    }
}

/// Render a document in the given format
pub fn generate_as(doc: &Document, format: Format) -> Result<String, FormatError> {
    match format {
        Format::Text => Ok(generate_text(doc)),
        Format::Json => generate_json(doc),
    }
}
