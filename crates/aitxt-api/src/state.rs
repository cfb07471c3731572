//! The published policy, rendered once at startup.

use crate::error::ServerError;
use aitxt::{generate_json, generate_text, parse_as, Document, Format};
use aitxt_policy::validate;
use std::path::Path;
use tracing::{info, warn};

/// A rendered response body with its validator
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: String,
    pub etag: String,
}

impl Rendered {
    fn new(body: String) -> Self {
        let etag = etag_for(body.as_bytes());
        Self { body, etag }
    }
}

/// Quoted strong entity tag derived from the body hash
pub fn etag_for(body: &[u8]) -> String {
    let hash = blake3::hash(body);
    format!("\"{}\"", &hash.to_hex()[..16])
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub site_name: String,
    pub text: Rendered,
    pub json: Rendered,
    pub max_age: u64,
}

impl AppState {
    /// Render both formats of `doc`
    pub fn from_document(doc: &Document, max_age: u64) -> Result<Self, ServerError> {
        Ok(Self {
            site_name: doc.site.name.clone(),
            text: Rendered::new(generate_text(doc)),
            json: Rendered::new(generate_json(doc)?),
            max_age,
        })
    }

    /// Load and render the policy file at `path`
    pub fn load(path: &Path, max_age: u64) -> Result<Self, ServerError> {
        let doc = load_document(path)?;
        Self::from_document(&doc, max_age)
    }
}

/// Read a policy file; `.json` files are parsed as ai.json
///
/// Parse failures are fatal. Parser warnings and validator findings are
/// logged so a publisher notices them without the server refusing to start.
pub fn load_document(path: &Path) -> Result<Document, ServerError> {
    let input = std::fs::read_to_string(path).map_err(|source| ServerError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let format = if is_json { Format::Json } else { Format::Text };

    let result = parse_as(&input, format);
    for warning in &result.warnings {
        warn!(path = %path.display(), "policy warning: {}", warning);
    }
    let doc = match result.into_result() {
        Ok(doc) => doc,
        Err(errors) => {
            return Err(ServerError::Policy {
                path: path.to_path_buf(),
                errors: errors.iter().map(ToString::to_string).collect(),
            })
        }
    };

    let report = validate(&doc);
    for finding in report.errors.iter().chain(&report.warnings) {
        warn!(path = %path.display(), "policy validation: {}", finding);
    }

    info!(
        path = %path.display(),
        format = %format,
        site = %doc.site.name,
        agents = doc.agents.len(),
        "loaded policy"
    );
    Ok(doc)
}
