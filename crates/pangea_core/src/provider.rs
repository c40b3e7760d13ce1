//! Provider, variable and output declarations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::Block;

/// A Terraform provider with its `required_providers` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBlock {
    /// Local provider name, e.g. `aws`.
    pub name: String,
    /// Registry source, e.g. `hashicorp/aws`.
    pub source: String,
    /// Version constraint, e.g. `~> 5.0`.
    pub version: String,
    /// Provider configuration body.
    pub settings: Block,
}

impl ProviderBlock {
    pub fn new(name: impl Into<String>, source: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            version: version.into(),
            settings: Block::new(),
        }
    }

    pub fn with_settings(mut self, settings: Block) -> Self {
        self.settings = settings;
        self
    }

    /// The `required_providers` entry for this provider.
    pub fn requirement(&self) -> Value {
        Block::new()
            .attr("source", self.source.as_str())
            .attr("version", self.version.as_str())
            .into_value()
    }
}

/// Provider settings as written in a declaration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
    #[serde(default)]
    pub default_tags: std::collections::BTreeMap<String, String>,
}

/// A Terraform input variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variable {
    #[serde(rename = "type")]
    pub var_type: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    #[serde(default)]
    pub sensitive: bool,
}

impl Variable {
    pub fn new(var_type: impl Into<String>) -> Self {
        Self {
            var_type: Some(var_type.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn to_block(&self) -> Block {
        let block = Block::new()
            .opt_str("type", self.var_type.as_ref())
            .opt_str("description", self.description.as_ref())
            .opt("default", self.default.clone());
        if self.sensitive {
            block.attr("sensitive", true)
        } else {
            block
        }
    }
}

/// A Terraform output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
}

impl Output {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
            sensitive: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn to_block(&self) -> Block {
        let block = Block::new()
            .attr("value", self.value.clone())
            .opt_str("description", self.description.as_ref());
        if self.sensitive {
            block.attr("sensitive", true)
        } else {
            block
        }
    }
}

/// Outputs in a declaration file may be a bare value or a full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    Full(Output),
    Value(Value),
}

impl From<OutputSpec> for Output {
    fn from(spec: OutputSpec) -> Self {
        match spec {
            OutputSpec::Full(output) => output,
            OutputSpec::Value(value) => Output::new(value),
        }
    }
}
