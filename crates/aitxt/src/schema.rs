//! Structural validation of the JSON form.
//!
//! Walks a decoded `serde_json::Value` and reports one diagnostic per
//! violation, each carrying the dotted path of the offending field. Both the
//! JSON parser and the JSON generator run documents through here.
//! Optional fields given as `null` are treated as absent.

use crate::ast::is_valid_spec_version;
use crate::diagnostics::Diagnostic;
use serde_json::{Map, Value};

const POLICY_VALUES: &[&str] = &["allow", "deny", "conditional"];
const REQUIREMENT_LEVELS: &[&str] = &["required", "recommended", "optional", "none"];
const RATE_WINDOWS: &[&str] = &["second", "minute", "hour", "day"];
const POLICY_KEYS: &[&str] = &["training", "scraping", "indexing", "caching"];

const ROOT_KEYS: &[&str] = &[
    "specVersion",
    "generatedAt",
    "site",
    "policies",
    "trainingPaths",
    "licensing",
    "agents",
    "content",
    "compliance",
    "metadata",
];

/// Outcome of a schema check
#[derive(Debug, Default)]
pub struct SchemaReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl SchemaReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a decoded JSON document
pub fn validate_value(value: &Value) -> SchemaReport {
    let mut checker = Checker::default();
    checker.root(value);
    checker.report
}

#[derive(Default)]
struct Checker {
    report: SchemaReport,
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Look up an optional field, treating `null` as absent
fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

impl Checker {
    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.report
            .errors
            .push(Diagnostic::new(message).at_path(path));
    }

    fn object<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                self.error(path, "must be an object");
                None
            }
        }
    }

    fn no_unknown_keys(&mut self, path: &str, map: &Map<String, Value>, allowed: &[&str]) {
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.error(&join(path, key), "unknown property");
            }
        }
    }

    fn required_string(&mut self, path: &str, map: &Map<String, Value>, key: &str) {
        let path = join(path, key);
        match field(map, key) {
            None => self.error(&path, "is required"),
            Some(Value::String(s)) if s.trim().is_empty() => self.error(&path, "must not be empty"),
            Some(Value::String(_)) => {}
            Some(_) => self.error(&path, "must be a string"),
        }
    }

    fn optional_string(&mut self, path: &str, map: &Map<String, Value>, key: &str) {
        if let Some(value) = field(map, key) {
            if !value.is_string() {
                self.error(&join(path, key), "must be a string");
            }
        }
    }

    fn optional_enum(&mut self, path: &str, map: &Map<String, Value>, key: &str, allowed: &[&str]) {
        let Some(value) = field(map, key) else {
            return;
        };
        let path = join(path, key);
        match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            _ => self.error(&path, format!("must be one of: {}", allowed.join(", "))),
        }
    }

    fn string_array(&mut self, path: &str, map: &Map<String, Value>, key: &str) {
        let Some(value) = field(map, key) else {
            return;
        };
        let path = join(path, key);
        let Some(items) = value.as_array() else {
            self.error(&path, "must be an array of strings");
            return;
        };
        for (idx, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.error(&format!("{}[{}]", path, idx), "must be a string");
            }
        }
    }

    fn root(&mut self, value: &Value) {
        let Some(root) = value.as_object() else {
            self.error("", "document must be a JSON object");
            return;
        };

        for key in root.keys() {
            if !ROOT_KEYS.contains(&key.as_str()) {
                self.report
                    .warnings
                    .push(Diagnostic::new("unknown property ignored").at_path(key.as_str()));
            }
        }

        if let Some(version) = field(root, "specVersion") {
            match version.as_str() {
                Some(v) if is_valid_spec_version(v) => {}
                Some(_) => self.error("specVersion", "must match major.minor (e.g. \"1.0\")"),
                None => self.error("specVersion", "must be a string"),
            }
        }
        self.optional_string("", root, "generatedAt");

        match field(root, "site") {
            None => self.error("site", "is required"),
            Some(site) => self.site(site),
        }

        match field(root, "policies") {
            None => self.error("policies", "is required"),
            Some(policies) => {
                if let Some(map) = self.object("policies", policies) {
                    self.no_unknown_keys("policies", map, POLICY_KEYS);
                    for key in POLICY_KEYS {
                        self.optional_enum("policies", map, key, POLICY_VALUES);
                    }
                }
            }
        }

        if let Some(paths) = field(root, "trainingPaths") {
            if let Some(map) = self.object("trainingPaths", paths) {
                self.no_unknown_keys("trainingPaths", map, &["allow", "deny"]);
                self.string_array("trainingPaths", map, "allow");
                self.string_array("trainingPaths", map, "deny");
            }
        }

        if let Some(licensing) = field(root, "licensing") {
            if let Some(map) = self.object("licensing", licensing) {
                self.no_unknown_keys("licensing", map, &["license", "feeUrl"]);
                self.optional_string("licensing", map, "license");
                self.optional_string("licensing", map, "feeUrl");
            }
        }

        if let Some(agents) = field(root, "agents") {
            if let Some(map) = self.object("agents", agents) {
                for (name, agent) in map {
                    self.agent(name, agent);
                }
            }
        }

        if let Some(content) = field(root, "content") {
            if let Some(map) = self.object("content", content) {
                self.no_unknown_keys("content", map, &["attribution", "aiDisclosure"]);
                self.optional_enum("content", map, "attribution", REQUIREMENT_LEVELS);
                self.optional_enum("content", map, "aiDisclosure", REQUIREMENT_LEVELS);
            }
        }

        if let Some(compliance) = field(root, "compliance") {
            if let Some(map) = self.object("compliance", compliance) {
                self.no_unknown_keys("compliance", map, &["audit", "auditFormat"]);
                self.optional_enum("compliance", map, "audit", REQUIREMENT_LEVELS);
                self.optional_string("compliance", map, "auditFormat");
            }
        }

        if let Some(metadata) = field(root, "metadata") {
            if let Some(map) = self.object("metadata", metadata) {
                for (key, value) in map {
                    if !value.is_string() {
                        self.error(&join("metadata", key), "must be a string");
                    }
                }
            }
        }
    }

    fn site(&mut self, site: &Value) {
        let Some(map) = self.object("site", site) else {
            return;
        };
        self.no_unknown_keys(
            "site",
            map,
            &["name", "url", "description", "contact", "policyUrl"],
        );
        self.required_string("site", map, "name");
        self.required_string("site", map, "url");
        self.optional_string("site", map, "description");
        self.optional_string("site", map, "contact");
        self.optional_string("site", map, "policyUrl");
    }

    fn agent(&mut self, name: &str, agent: &Value) {
        let path = join("agents", name);
        if name.trim().is_empty() {
            self.error(&path, "agent name must not be empty");
        }

        let Some(map) = self.object(&path, agent) else {
            return;
        };
        self.no_unknown_keys(
            &path,
            map,
            &["training", "scraping", "indexing", "caching", "rateLimit"],
        );
        for key in POLICY_KEYS {
            self.optional_enum(&path, map, key, POLICY_VALUES);
        }

        if let Some(limit) = field(map, "rateLimit") {
            let limit_path = join(&path, "rateLimit");
            if let Some(limit) = self.object(&limit_path, limit) {
                self.no_unknown_keys(&limit_path, limit, &["requests", "window"]);

                let requests_path = join(&limit_path, "requests");
                match field(limit, "requests") {
                    None => self.error(&requests_path, "is required"),
                    Some(v) => match v.as_u64() {
                        Some(n) if n >= 1 && n <= u64::from(u32::MAX) => {}
                        _ => self.error(&requests_path, "must be a positive integer"),
                    },
                }

                if field(limit, "window").is_none() {
                    self.error(&join(&limit_path, "window"), "is required");
                } else {
                    self.optional_enum(&limit_path, limit, "window", RATE_WINDOWS);
                }
            }
        }
    }
}
