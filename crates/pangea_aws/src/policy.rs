//! IAM policy documents.
//!
//! Documents are kept as the JSON the caller supplied, so key order and
//! condition blocks survive emission untouched. Callers may pass either an
//! object or a JSON-encoded string.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use pangea_core::validation::{field_path, index_path};
use pangea_core::{RuleKind, Validator};

pub const POLICY_VERSIONS: &[&str] = &["2012-10-17", "2008-10-17"];

const ACTION_PATTERN: &str = r"^(\*|[a-zA-Z0-9-]+:[a-zA-Z0-9*]+)$";

const READ_ONLY_VERBS: &[&str] = &["Get", "List", "Describe", "Head", "View", "Query", "Scan", "Select"];

/// What a policy document is attached as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// A role's trust (assume-role) policy: statements name principals.
    Trust,
    /// An identity policy: statements name resources.
    Identity,
}

/// A JSON IAM policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument(Value);

impl PolicyDocument {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn version(&self) -> Option<&str> {
        self.0.get("Version").and_then(Value::as_str)
    }

    /// Statements, whether given as a single object or an array.
    pub fn statements(&self) -> Vec<&Map<String, Value>> {
        match self.0.get("Statement") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            Some(Value::Object(statement)) => vec![statement],
            _ => Vec::new(),
        }
    }

    /// Every `Action` entry across all statements.
    pub fn actions(&self) -> Vec<&str> {
        self.statements()
            .into_iter()
            .flat_map(|s| string_or_list(s.get("Action")))
            .collect()
    }

    /// Service principals such as `lambda.amazonaws.com`.
    pub fn service_principals(&self) -> Vec<&str> {
        self.principals("Service")
    }

    pub fn aws_principals(&self) -> Vec<&str> {
        self.principals("AWS")
    }

    pub fn federated_principals(&self) -> Vec<&str> {
        self.principals("Federated")
    }

    fn principals(&self, kind: &str) -> Vec<&str> {
        self.statements()
            .into_iter()
            .filter_map(|s| s.get("Principal"))
            .flat_map(|principal| match principal {
                Value::Object(map) => string_or_list(map.get(kind)),
                Value::String(any) if kind == "AWS" => vec![any.as_str()],
                _ => Vec::new(),
            })
            .collect()
    }

    /// An `Allow` statement grants `*` or `service:*`.
    pub fn allows_wildcard_action(&self) -> bool {
        self.statements()
            .into_iter()
            .filter(|s| s.get("Effect").and_then(Value::as_str) == Some("Allow"))
            .flat_map(|s| string_or_list(s.get("Action")))
            .any(|action| action == "*" || action.ends_with(":*"))
    }

    /// Every action is a read verb.
    pub fn is_read_only(&self) -> bool {
        let actions = self.actions();
        !actions.is_empty()
            && actions.iter().all(|action| {
                action
                    .split_once(':')
                    .map(|(_, verb)| READ_ONLY_VERBS.iter().any(|prefix| verb.starts_with(prefix)))
                    .unwrap_or(false)
            })
    }

    /// Check document structure for the given attachment kind.
    pub fn validate(&self, v: &mut Validator, field: &str, kind: PolicyKind) {
        if !self.0.is_object() {
            v.violation(RuleKind::Format, field, "policy document must be a JSON object");
            return;
        }

        match self.version() {
            Some(version) => v.one_of(&field_path(field, "Version"), version, POLICY_VERSIONS),
            None => v.required(&field_path(field, "Version"), false),
        }

        let statement_field = field_path(field, "Statement");
        let statements = self.statements();
        v.count(&statement_field, statements.len(), 1, usize::MAX);

        let sids: Vec<&str> = statements
            .iter()
            .filter_map(|s| s.get("Sid").and_then(Value::as_str))
            .collect();
        v.unique(&field_path(&statement_field, "Sid"), sids);

        for (i, statement) in statements.iter().enumerate() {
            validate_statement(v, &index_path(&statement_field, i), statement, kind);
        }
    }
}

fn validate_statement(v: &mut Validator, path: &str, statement: &Map<String, Value>, kind: PolicyKind) {
    match statement.get("Effect").and_then(Value::as_str) {
        Some(effect) => v.one_of(&field_path(path, "Effect"), effect, &["Allow", "Deny"]),
        None => v.required(&field_path(path, "Effect"), false),
    }

    let has = |key: &str| statement.contains_key(key);
    exactly_one_key(v, path, statement, "Action", "NotAction");

    for key in ["Action", "NotAction"] {
        for action in string_or_list(statement.get(key)) {
            v.format(&field_path(path, key), action, ACTION_PATTERN, "an IAM action");
        }
    }

    match kind {
        PolicyKind::Trust => {
            exactly_one_key(v, path, statement, "Principal", "NotPrincipal");
        }
        PolicyKind::Identity => {
            exactly_one_key(v, path, statement, "Resource", "NotResource");
            v.forbids(
                &field_path(path, "Principal"),
                has("Principal"),
                true,
                "in an identity policy",
            );
        }
    }
}

fn exactly_one_key(v: &mut Validator, path: &str, statement: &Map<String, Value>, key: &str, negated: &str) {
    let key_path = field_path(path, key);
    let negated_path = field_path(path, negated);
    v.exactly_one_of(&[
        (key_path.as_str(), statement.contains_key(key)),
        (negated_path.as_str(), statement.contains_key(negated)),
    ]);
}

fn string_or_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

impl<'de> Deserialize<'de> for PolicyDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(encoded) => serde_json::from_str(&encoded)
                .map(PolicyDocument)
                .map_err(|e| de::Error::custom(format!("policy is not valid JSON: {}", e))),
            value @ Value::Object(_) => Ok(PolicyDocument(value)),
            _ => Err(de::Error::custom(
                "policy must be a JSON object or a JSON-encoded string",
            )),
        }
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}
