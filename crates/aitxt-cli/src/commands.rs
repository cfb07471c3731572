//! Subcommand implementations.
//!
//! Each command returns an [`Outcome`] holding what to print on stdout and
//! whether the process should exit successfully; `main` does the printing.

use aitxt::{generate_as, parse_as, parse_document, Document, Format, ParseResult, PolicyField};
use aitxt_client::{AiTxtClient, ClientConfig};
use aitxt_policy::{can_access, resolve_policy, validate};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Detect from the file content
    Auto,
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
        }
    }
}

/// What a command produced
#[derive(Debug)]
pub struct Outcome {
    pub stdout: String,
    pub success: bool,
}

impl Outcome {
    fn json<T: Serialize>(value: &T, success: bool) -> Result<Self> {
        Ok(Self {
            stdout: serde_json::to_string_pretty(value)?,
            success,
        })
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_file(path: &Path, format: InputFormat) -> Result<ParseResult> {
    let input = read_input(path)?;
    let result = match format {
        InputFormat::Auto => parse_document(&input),
        InputFormat::Text => parse_as(&input, Format::Text),
        InputFormat::Json => parse_as(&input, Format::Json),
    };
    debug!(
        path = %path.display(),
        success = result.success,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "parsed input"
    );
    Ok(result)
}

/// Parse and require success; the failed result becomes the output otherwise
fn load(path: &Path) -> Result<std::result::Result<Document, Outcome>> {
    let result = parse_file(path, InputFormat::Auto)?;
    if result.success {
        if let Some(doc) = result.document {
            return Ok(Ok(doc));
        }
    }
    Ok(Err(Outcome::json(&result, false)?))
}

pub fn parse(path: &Path, format: InputFormat) -> Result<Outcome> {
    let result = parse_file(path, format)?;
    let success = result.success;
    Outcome::json(&result, success)
}

pub fn validate_file(path: &Path, strict: bool) -> Result<Outcome> {
    let result = parse_file(path, InputFormat::Auto)?;
    let Some(doc) = result.document.as_ref().filter(|_| result.success) else {
        return Outcome::json(&result, false);
    };

    let report = validate(doc);
    let has_warnings = !report.warnings.is_empty() || !result.warnings.is_empty();
    let success = report.valid && !(strict && has_warnings);

    Outcome::json(
        &json!({
            "valid": report.valid,
            "strict": strict,
            "parseWarnings": result.warnings,
            "errors": report.errors,
            "warnings": report.warnings,
        }),
        success,
    )
}

pub fn generate(
    path: &Path,
    to: OutputFormat,
    output: Option<&PathBuf>,
    timestamp: bool,
) -> Result<Outcome> {
    let mut doc = match load(path)? {
        Ok(doc) => doc,
        Err(failed) => return Ok(failed),
    };
    if timestamp {
        doc.generated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    let rendered = generate_as(&doc, to.into()).context("document cannot be rendered")?;
    match output {
        Some(out) => {
            std::fs::write(out, &rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            Ok(Outcome {
                stdout: String::new(),
                success: true,
            })
        }
        None => Ok(Outcome {
            stdout: rendered.trim_end().to_string(),
            success: true,
        }),
    }
}

pub fn resolve(path: &Path, agent: &str) -> Result<Outcome> {
    match load(path)? {
        Ok(doc) => Outcome::json(&resolve_policy(&doc, agent), true),
        Err(failed) => Ok(failed),
    }
}

/// Exit status follows the decision: denied access is a failure
pub fn check(path: &Path, agent: &str, field: PolicyField, request_path: Option<&str>) -> Result<Outcome> {
    match load(path)? {
        Ok(doc) => {
            let result = can_access(&doc, agent, field, request_path);
            let allowed = result.allowed;
            Outcome::json(&result, allowed)
        }
        Err(failed) => Ok(failed),
    }
}

pub fn fetch(site_url: &str, agent: Option<&str>) -> Result<Outcome> {
    let client = AiTxtClient::new(ClientConfig::default())?;
    let discovery = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(client.discover(site_url))
        .with_context(|| format!("no policy could be fetched for {}", site_url))?;

    let success = discovery.result.success;
    let resolved = match (agent, discovery.result.document.as_ref()) {
        (Some(agent), Some(doc)) => Some(resolve_policy(doc, agent)),
        _ => None,
    };

    Outcome::json(
        &json!({
            "url": discovery.url,
            "format": discovery.format,
            "result": discovery.result,
            "resolved": resolved,
        }),
        success,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const POLICY: &str = "\
Site-Name: Example
Site-URL: https://example.com
Training: conditional
Training-Allow: /blog/**

Agent: GPTBot
  Scraping: deny
";

    fn policy_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_outputs_result() {
        let file = policy_file(POLICY, ".txt");
        let outcome = parse(file.path(), InputFormat::Auto).unwrap();
        assert!(outcome.success);

        let value: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();
        assert_eq!(value["document"]["site"]["name"], "Example");
        assert!(value["document"]["agents"]["gptbot"].is_object());
    }

    #[test]
    fn test_parse_forced_format_fails() {
        let file = policy_file(POLICY, ".txt");
        let outcome = parse(file.path(), InputFormat::Json).unwrap();
        assert!(!outcome.success);
        assert!(outcome.stdout.contains("Invalid JSON"));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(parse(Path::new("/nonexistent/ai.txt"), InputFormat::Auto).is_err());
    }

    #[test]
    fn test_validate_strict() {
        let file = policy_file("Site-Name: A\nSite-URL: http://a.example\n", ".txt");
        assert!(validate_file(file.path(), false).unwrap().success);

        let strict = validate_file(file.path(), true).unwrap();
        assert!(!strict.success);
        assert!(strict.stdout.contains("site.url.insecure"));
    }

    #[test]
    fn test_validate_reports_errors() {
        let file = policy_file(
            "Site-Name: A\nSite-URL: https://a.example\nCaching: conditional\n",
            ".txt",
        );
        let outcome = validate_file(file.path(), false).unwrap();
        assert!(!outcome.success);
        let value: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();
        assert_eq!(value["valid"], false);
        assert_eq!(value["parseWarnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_generate_converts_and_writes() {
        let file = policy_file(POLICY, ".txt");
        let json = generate(file.path(), OutputFormat::Json, None, false).unwrap();
        assert!(json.success);
        let value: serde_json::Value = serde_json::from_str(&json.stdout).unwrap();
        assert_eq!(value["trainingPaths"]["allow"][0], "/blog/**");

        let out = tempfile::NamedTempFile::new().unwrap();
        let written = generate(
            file.path(),
            OutputFormat::Text,
            Some(&out.path().to_path_buf()),
            true,
        )
        .unwrap();
        assert!(written.stdout.is_empty());
        let text = std::fs::read_to_string(out.path()).unwrap();
        assert!(text.contains("Generated-At: "));
        assert!(text.contains("Agent: gptbot\n  Scraping: deny\n"));
    }

    #[test]
    fn test_resolve_and_check() {
        let file = policy_file(POLICY, ".txt");

        let resolved = resolve(file.path(), "GPTBot").unwrap();
        let value: serde_json::Value = serde_json::from_str(&resolved.stdout).unwrap();
        assert_eq!(value["scraping"], "deny");
        assert_eq!(value["training"], "conditional");

        let allowed = check(file.path(), "GPTBot", PolicyField::Training, Some("/blog/a")).unwrap();
        assert!(allowed.success);

        let denied = check(file.path(), "GPTBot", PolicyField::Scraping, None).unwrap();
        assert!(!denied.success);
        assert!(denied.stdout.contains("scraping is denied for GPTBot"));
    }

    #[test]
    fn test_commands_surface_parse_failure() {
        let file = policy_file("Site-Name: A\n", ".txt");
        let outcome = resolve(file.path(), "bot").unwrap();
        assert!(!outcome.success);
        assert!(outcome.stdout.contains("Site-URL"));
    }
}
