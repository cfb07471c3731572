//! Effective policy resolution.
//!
//! Each field resolves independently through three tiers: the named agent's
//! block, then the wildcard block, then the site-wide policies. A field may
//! therefore come from a different tier than its siblings.

use crate::glob::match_glob;
use crate::verdict::AccessResult;
use aitxt::ast::{
    normalize_agent_name, AgentPolicy, ContentRequirements, Document, PolicyField, PolicyValue,
    RateLimit, TrainingPaths, WILDCARD_AGENT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The policy that applies to one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPolicy {
    pub training: PolicyValue,
    pub scraping: PolicyValue,
    pub indexing: PolicyValue,
    pub caching: PolicyValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentRequirements>,
}

impl ResolvedPolicy {
    pub fn get(&self, field: PolicyField) -> PolicyValue {
        match field {
            PolicyField::Training => self.training,
            PolicyField::Scraping => self.scraping,
            PolicyField::Indexing => self.indexing,
            PolicyField::Caching => self.caching,
        }
    }
}

/// Resolve the effective policy for `agent`
///
/// Agent names are matched case-insensitively. `"*"` or a blank name
/// resolves through the wildcard and site-wide tiers only.
pub fn resolve_policy(doc: &Document, agent: &str) -> ResolvedPolicy {
    let name = normalize_agent_name(agent);
    let specific = if name.is_empty() || name == WILDCARD_AGENT {
        None
    } else {
        doc.agent(&name)
    };
    let wildcard = doc.wildcard();

    let pick = |field: PolicyField| {
        tier(specific, field)
            .or_else(|| tier(wildcard, field))
            .unwrap_or_else(|| doc.policies.get(field))
    };

    let rate_limit = specific
        .and_then(|a| a.rate_limit)
        .or_else(|| wildcard.and_then(|a| a.rate_limit));

    let resolved = ResolvedPolicy {
        training: pick(PolicyField::Training),
        scraping: pick(PolicyField::Scraping),
        indexing: pick(PolicyField::Indexing),
        caching: pick(PolicyField::Caching),
        rate_limit,
        content: doc.content.clone(),
    };

    debug!(
        agent = %name,
        specific = specific.is_some(),
        training = %resolved.training,
        "resolved policy"
    );
    resolved
}

fn tier(block: Option<&AgentPolicy>, field: PolicyField) -> Option<PolicyValue> {
    block.and_then(|b| b.get(field))
}

/// Decide whether `agent` may use the site for `field`
///
/// Only training supports path rules; a conditional value on any other
/// field is treated as a denial.
pub fn can_access(
    doc: &Document,
    agent: &str,
    field: PolicyField,
    path: Option<&str>,
) -> AccessResult {
    let policy = resolve_policy(doc, agent);

    match (policy.get(field), field) {
        (PolicyValue::Allow, _) => AccessResult::allow(format!("{} is allowed for {}", field, agent)),
        (PolicyValue::Deny, _) => AccessResult::deny(format!("{} is denied for {}", field, agent)),
        (PolicyValue::Conditional, PolicyField::Training) => {
            let Some(path) = path else {
                return AccessResult::deny(
                    "training is conditional on the request path but no path was provided",
                );
            };
            match &doc.training_paths {
                Some(paths) => match_path(path, paths),
                None => AccessResult::deny(
                    "training is conditional but the document defines no training paths",
                ),
            }
        }
        (PolicyValue::Conditional, other) => AccessResult::deny(format!(
            "{} is conditional, but path rules only apply to training",
            other
        )),
    }
}

/// Match a path against training path rules
///
/// Deny patterns are checked first and win over allow patterns. A path that
/// matches neither list is denied.
pub fn match_path(path: &str, paths: &TrainingPaths) -> AccessResult {
    if let Some(pattern) = paths.deny.iter().find(|p| match_glob(path, p)) {
        debug!(path, pattern = %pattern, "training deny pattern matched");
        return AccessResult::deny(format!(
            "Path '{}' matches training deny pattern '{}'",
            path, pattern
        ));
    }

    if let Some(pattern) = paths.allow.iter().find(|p| match_glob(path, p)) {
        debug!(path, pattern = %pattern, "training allow pattern matched");
        return AccessResult::allow(format!(
            "Path '{}' matches training allow pattern '{}'",
            path, pattern
        ));
    }

    AccessResult::deny(format!("Path '{}' matched no training path rule", path))
}
