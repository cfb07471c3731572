//! Parse outcome and diagnostics.

use crate::ast::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parse error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line (text format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Dotted field path (JSON format) or field name (text format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            path: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, &self.path) {
            (Some(line), _) => write!(f, "line {}: {}", line, self.message),
            (None, Some(path)) => write!(f, "{}: {}", path, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Result of parsing a document in either format
///
/// `document` is present exactly when `success` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn ok(document: Document, warnings: Vec<Diagnostic>) -> Self {
        Self {
            success: true,
            document: Some(document),
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn failed(errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            document: None,
            errors,
            warnings,
        }
    }

    /// Convert into the document, or the error diagnostics
    pub fn into_result(self) -> Result<Document, Vec<Diagnostic>> {
        match self.document {
            Some(doc) if self.success => Ok(doc),
            _ => Err(self.errors),
        }
    }
}
