//! Declaration files.
//!
//! A template lists the resources of one Terraform configuration as plain
//! key-value hashes:
//!
//! ```yaml
//! name: network
//! provider:
//!   region: eu-west-1
//! resources:
//!   - type: aws_vpc
//!     name: main
//!     attributes:
//!       cidr_block: 10.0.0.0/16
//! outputs:
//!   vpc_id: ${aws_vpc.main.id}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PangeaError, PangeaResult};
use crate::provider::{OutputSpec, ProviderSettings, Variable};
use crate::synthesizer::validate_name;

/// File extensions recognised as templates.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// One resource declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default = "empty_object")]
    pub attributes: Value,
}

/// A parsed declaration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub provider: Option<ProviderSettings>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
    #[serde(default)]
    pub resources: Vec<Declaration>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputSpec>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: None,
            variables: BTreeMap::new(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Append a resource declaration.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        attributes: Value,
    ) -> Self {
        self.resources.push(Declaration {
            resource_type: resource_type.into(),
            name: name.into(),
            attributes,
        });
        self
    }

    pub fn from_yaml(content: &str) -> PangeaResult<Self> {
        let template: Template = serde_yaml::from_str(content)?;
        template.validate()?;
        Ok(template)
    }

    pub fn from_json(content: &str) -> PangeaResult<Self> {
        let template: Template = serde_json::from_str(content)?;
        template.validate()?;
        Ok(template)
    }

    /// Check the template name, which becomes the output file name.
    pub fn validate(&self) -> PangeaResult<()> {
        validate_name(&self.name)
    }

    /// Load a template, choosing the parser by file extension.
    pub fn from_file(path: &Path) -> PangeaResult<Self> {
        debug!("Loading template from {}", path.display());
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(PangeaError::UnsupportedTemplateFormat(path.to_path_buf())),
        }
    }

    /// Output file name for the synthesized document.
    pub fn output_file_name(&self) -> String {
        format!("{}.tf.json", self.name)
    }
}

/// Check whether a path looks like a template file.
pub fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEMPLATE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const NETWORK: &str = r#"
name: network
provider:
  region: eu-west-1
  default_tags:
    Team: platform
variables:
  environment:
    type: string
    default: dev
resources:
  - type: aws_vpc
    name: main
    attributes:
      cidr_block: 10.0.0.0/16
  - type: aws_subnet
    name: public_a
    attributes:
      vpc_id: ${aws_vpc.main.id}
      cidr_block: 10.0.1.0/24
outputs:
  vpc_id: ${aws_vpc.main.id}
"#;

    #[test]
    fn test_parse_yaml_template() {
        let template = Template::from_yaml(NETWORK).unwrap();
        assert_eq!(template.name, "network");
        assert_eq!(template.resources.len(), 2);
        assert_eq!(template.resources[1].resource_type, "aws_subnet");
        assert_eq!(template.resources[1].attributes["vpc_id"], json!("${aws_vpc.main.id}"));
        assert_eq!(
            template.provider.as_ref().unwrap().region.as_deref(),
            Some("eu-west-1")
        );
        assert_eq!(template.variables["environment"].default, Some(json!("dev")));
        assert_eq!(template.output_file_name(), "network.tf.json");
    }

    #[test]
    fn test_attributes_default_to_empty_object() {
        let template = Template::from_json(
            r#"{ "name": "t", "resources": [{ "type": "aws_s3_bucket", "name": "logs" }] }"#,
        )
        .unwrap();
        assert_eq!(template.resources[0].attributes, json!({}));
    }

    #[test]
    fn test_name_must_be_a_plain_identifier() {
        for name in ["../escaped", "", "nested/network", "1network"] {
            let content = json!({ "name": name }).to_string();
            let err = Template::from_json(&content).unwrap_err();
            assert!(
                matches!(err, PangeaError::InvalidResourceName { .. }),
                "accepted template name {:?}",
                name
            );
        }
        assert!(Template::from_yaml("name: web-stack_2").is_ok());
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("network.yml");
        fs::write(&yaml, NETWORK).unwrap();
        assert_eq!(Template::from_file(&yaml).unwrap().name, "network");

        let txt = dir.path().join("network.txt");
        fs::write(&txt, NETWORK).unwrap();
        assert!(matches!(
            Template::from_file(&txt),
            Err(PangeaError::UnsupportedTemplateFormat(_))
        ));
        assert!(!is_template_file(&txt));
        assert!(is_template_file(&yaml));
    }
}
