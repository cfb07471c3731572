//! Document model for ai.txt policy documents.
//!
//! The same types back both wire formats: the text format is mapped by the
//! parser and serializer by hand, the JSON format goes through serde with
//! camelCase keys.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Agent key that applies to every agent not named explicitly
pub const WILDCARD_AGENT: &str = "*";

/// Spec version assumed when a document does not declare one
pub const DEFAULT_SPEC_VERSION: &str = "1.0";

lazy_static! {
    static ref SPEC_VERSION: Regex = Regex::new(r"^\d+\.\d+$").unwrap();
    static ref RATE_LIMIT: Regex =
        Regex::new(r"(?i)^(\d+)/(second|minute|hour|day)$").unwrap();
}

/// Check that a spec version has the `major.minor` shape
pub fn is_valid_spec_version(version: &str) -> bool {
    SPEC_VERSION.is_match(version)
}

/// Normalize an agent name for use as an `agents` key
pub fn normalize_agent_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A parsed policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_spec_version")]
    pub spec_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    pub site: SiteInfo,

    #[serde(default)]
    pub policies: Policies,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_paths: Option<TrainingPaths>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensing: Option<Licensing>,

    #[serde(default)]
    pub agents: BTreeMap<String, AgentPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentRequirements>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Compliance>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

fn default_spec_version() -> String {
    DEFAULT_SPEC_VERSION.to_string()
}

impl Document {
    /// Create a document with every optional section unset
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut doc = Self {
            spec_version: default_spec_version(),
            generated_at: None,
            site: SiteInfo {
                name: name.into(),
                url: url.into(),
                description: None,
                contact: None,
                policy_url: None,
            },
            policies: Policies::default(),
            training_paths: None,
            licensing: None,
            agents: BTreeMap::new(),
            content: None,
            compliance: None,
            metadata: BTreeMap::new(),
        };
        doc.ensure_wildcard();
        doc
    }

    /// Make sure the wildcard agent entry exists
    pub fn ensure_wildcard(&mut self) {
        self.agents.entry(WILDCARD_AGENT.to_string()).or_default();
    }

    /// Look up an agent block by name, ignoring case
    pub fn agent(&self, name: &str) -> Option<&AgentPolicy> {
        self.agents.get(&normalize_agent_name(name))
    }

    /// The wildcard agent block, if declared
    pub fn wildcard(&self) -> Option<&AgentPolicy> {
        self.agents.get(WILDCARD_AGENT)
    }
}

/// Site identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_url: Option<String>,
}

/// The value of one policy field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyValue {
    Allow,
    Deny,
    /// Governed by training path rules
    Conditional,
}

impl PolicyValue {
    pub const ALL: [PolicyValue; 3] = [PolicyValue::Allow, PolicyValue::Deny, PolicyValue::Conditional];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyValue::Allow => "allow",
            PolicyValue::Deny => "deny",
            PolicyValue::Conditional => "conditional",
        }
    }
}

impl fmt::Display for PolicyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(PolicyValue::Allow),
            "deny" => Ok(PolicyValue::Deny),
            "conditional" => Ok(PolicyValue::Conditional),
            other => Err(format!(
                "invalid policy value '{}' (expected allow, deny or conditional)",
                other
            )),
        }
    }
}

/// One of the four policy fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyField {
    Training,
    Scraping,
    Indexing,
    Caching,
}

impl PolicyField {
    pub const ALL: [PolicyField; 4] = [
        PolicyField::Training,
        PolicyField::Scraping,
        PolicyField::Indexing,
        PolicyField::Caching,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyField::Training => "training",
            PolicyField::Scraping => "scraping",
            PolicyField::Indexing => "indexing",
            PolicyField::Caching => "caching",
        }
    }

    /// Key used in the text format
    pub fn text_key(&self) -> &'static str {
        match self {
            PolicyField::Training => "Training",
            PolicyField::Scraping => "Scraping",
            PolicyField::Indexing => "Indexing",
            PolicyField::Caching => "Caching",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "training" => Ok(PolicyField::Training),
            "scraping" => Ok(PolicyField::Scraping),
            "indexing" => Ok(PolicyField::Indexing),
            "caching" => Ok(PolicyField::Caching),
            other => Err(format!(
                "unknown policy field '{}' (expected training, scraping, indexing or caching)",
                other
            )),
        }
    }
}

/// Site-wide policies, always fully populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policies {
    pub training: PolicyValue,
    pub scraping: PolicyValue,
    pub indexing: PolicyValue,
    pub caching: PolicyValue,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            training: PolicyValue::Deny,
            scraping: PolicyValue::Allow,
            indexing: PolicyValue::Allow,
            caching: PolicyValue::Allow,
        }
    }
}

impl Policies {
    pub fn get(&self, field: PolicyField) -> PolicyValue {
        match field {
            PolicyField::Training => self.training,
            PolicyField::Scraping => self.scraping,
            PolicyField::Indexing => self.indexing,
            PolicyField::Caching => self.caching,
        }
    }

    pub fn set(&mut self, field: PolicyField, value: PolicyValue) {
        match field {
            PolicyField::Training => self.training = value,
            PolicyField::Scraping => self.scraping = value,
            PolicyField::Indexing => self.indexing = value,
            PolicyField::Caching => self.caching = value,
        }
    }
}

/// Path rules consulted when training is `conditional`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPaths {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl TrainingPaths {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// Licensing terms for training use
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Licensing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_url: Option<String>,
}

impl Licensing {
    pub fn is_empty(&self) -> bool {
        self.license.is_none() && self.fee_url.is_none()
    }
}

/// Partial per-agent override
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training: Option<PolicyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraping: Option<PolicyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing: Option<PolicyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caching: Option<PolicyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

impl AgentPolicy {
    pub fn get(&self, field: PolicyField) -> Option<PolicyValue> {
        match field {
            PolicyField::Training => self.training,
            PolicyField::Scraping => self.scraping,
            PolicyField::Indexing => self.indexing,
            PolicyField::Caching => self.caching,
        }
    }

    pub fn set(&mut self, field: PolicyField, value: PolicyValue) {
        match field {
            PolicyField::Training => self.training = Some(value),
            PolicyField::Scraping => self.scraping = Some(value),
            PolicyField::Indexing => self.indexing = Some(value),
            PolicyField::Caching => self.caching = Some(value),
        }
    }
}

/// Time window of an advisory rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateWindow {
    Second,
    Minute,
    Hour,
    Day,
}

impl RateWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateWindow::Second => "second",
            RateWindow::Minute => "minute",
            RateWindow::Hour => "hour",
            RateWindow::Day => "day",
        }
    }
}

impl FromStr for RateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "second" => Ok(RateWindow::Second),
            "minute" => Ok(RateWindow::Minute),
            "hour" => Ok(RateWindow::Hour),
            "day" => Ok(RateWindow::Day),
            other => Err(format!(
                "invalid rate limit window '{}' (expected second, minute, hour or day)",
                other
            )),
        }
    }
}

/// Advisory request rate; carried through resolution, never enforced here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests: u32,
    pub window: RateWindow,
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.requests, self.window.as_str())
    }
}

impl FromStr for RateLimit {
    type Err = String;

    /// Parse the `<requests>/<window>` text form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let caps = RATE_LIMIT.captures(value).ok_or_else(|| {
            format!(
                "invalid rate limit '{}' (expected <requests>/<second|minute|hour|day>)",
                value
            )
        })?;

        let requests: u32 = caps[1]
            .parse()
            .map_err(|_| format!("rate limit request count '{}' is out of range", &caps[1]))?;
        if requests == 0 {
            return Err("rate limit request count must be a positive integer".to_string());
        }

        Ok(RateLimit {
            requests,
            window: caps[2].parse()?,
        })
    }
}

/// How strongly a content requirement applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementLevel {
    Required,
    Recommended,
    Optional,
    None,
}

impl RequirementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementLevel::Required => "required",
            RequirementLevel::Recommended => "recommended",
            RequirementLevel::Optional => "optional",
            RequirementLevel::None => "none",
        }
    }
}

impl fmt::Display for RequirementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "required" => Ok(RequirementLevel::Required),
            "recommended" => Ok(RequirementLevel::Recommended),
            "optional" => Ok(RequirementLevel::Optional),
            "none" => Ok(RequirementLevel::None),
            other => Err(format!(
                "invalid requirement level '{}' (expected required, recommended, optional or none)",
                other
            )),
        }
    }
}

/// Attribution and disclosure requirements for derived content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<RequirementLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_disclosure: Option<RequirementLevel>,
}

impl ContentRequirements {
    pub fn is_empty(&self) -> bool {
        self.attribution.is_none() && self.ai_disclosure.is_none()
    }
}

/// Audit expectations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<RequirementLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_format: Option<String>,
}

impl Compliance {
    pub fn is_empty(&self) -> bool {
        self.audit.is_none() && self.audit_format.is_none()
    }
}
