//! Terraform JSON synthesis.
//!
//! The [`Synthesizer`] accumulates provider, variable, resource and output
//! declarations and serializes them into a single Terraform JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{PangeaError, PangeaResult};
use crate::provider::{Output, ProviderBlock, Variable};
use crate::reference::{DeclaredResource, ResourceReference};
use crate::resource::ResourceAttributes;
use crate::validation::cached_regex;

const NAME_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_-]*$";

/// Accumulates declarations into a Terraform JSON document.
#[derive(Debug, Default)]
pub struct Synthesizer {
    providers: Vec<ProviderBlock>,
    variables: Map<String, Value>,
    resources: Map<String, Value>,
    outputs: Map<String, Value>,
    declared: Vec<DeclaredResource>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A provider with the same name is replaced.
    pub fn provider(&mut self, provider: ProviderBlock) -> &mut Self {
        debug!("Registering provider: {}", provider.name);
        self.providers.retain(|p| p.name != provider.name);
        self.providers.push(provider);
        self
    }

    /// Declare an input variable.
    pub fn variable(&mut self, name: &str, variable: Variable) -> PangeaResult<&mut Self> {
        validate_name(name)?;
        self.variables
            .insert(name.to_string(), variable.to_block().into_value());
        Ok(self)
    }

    /// Declare an output value.
    pub fn output(&mut self, name: &str, output: Output) -> PangeaResult<&mut Self> {
        validate_name(name)?;
        self.outputs
            .insert(name.to_string(), output.to_block().into_value());
        Ok(self)
    }

    /// Validate and emit a resource, returning a reference to it.
    pub fn declare<A: ResourceAttributes>(
        &mut self,
        name: &str,
        attributes: A,
    ) -> PangeaResult<ResourceReference<A>> {
        validate_name(name)?;
        attributes.validate()?;

        let by_name = self
            .resources
            .entry(A::RESOURCE_TYPE.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(by_name) = by_name {
            if by_name.contains_key(name) {
                return Err(PangeaError::DuplicateResource(format!(
                    "{}.{}",
                    A::RESOURCE_TYPE,
                    name
                )));
            }
            by_name.insert(name.to_string(), attributes.to_block().into_value());
        }

        debug!("Declared {}.{}", A::RESOURCE_TYPE, name);

        let reference = ResourceReference::new(name, attributes);
        self.declared.push(reference.summary());
        Ok(reference)
    }

    /// Deserialize a plain key-value hash into `A` and declare it.
    pub fn declare_value<A: ResourceAttributes>(
        &mut self,
        name: &str,
        attributes: Value,
    ) -> PangeaResult<ResourceReference<A>> {
        let attributes = A::from_value(attributes)?;
        self.declare(name, attributes)
    }

    /// Summaries of every declared resource, in declaration order.
    pub fn declared(&self) -> &[DeclaredResource] {
        &self.declared
    }

    pub fn resource_count(&self) -> usize {
        self.declared.len()
    }

    /// Check whether `type.name` has been declared.
    pub fn contains(&self, resource_type: &str, name: &str) -> bool {
        self.resources
            .get(resource_type)
            .and_then(Value::as_object)
            .is_some_and(|by_name| by_name.contains_key(name))
    }

    /// Emitted body of a declared resource.
    pub fn resource(&self, resource_type: &str, name: &str) -> Option<&Value> {
        self.resources
            .get(resource_type)
            .and_then(Value::as_object)
            .and_then(|by_name| by_name.get(name))
    }

    /// Total of the known monthly cost estimates.
    pub fn estimated_monthly_cost(&self) -> f64 {
        self.declared
            .iter()
            .filter_map(|r| r.estimated_monthly_cost)
            .sum()
    }

    /// Build the Terraform JSON document.
    pub fn synthesize(&self) -> Value {
        let mut document = Map::new();

        if !self.providers.is_empty() {
            let mut required = Map::new();
            let mut providers = Map::new();
            for provider in &self.providers {
                required.insert(provider.name.clone(), provider.requirement());
                providers.insert(provider.name.clone(), provider.settings.clone().into_value());
            }

            let mut terraform = Map::new();
            terraform.insert("required_providers".to_string(), Value::Object(required));
            document.insert("terraform".to_string(), Value::Object(terraform));
            document.insert("provider".to_string(), Value::Object(providers));
        }

        for (key, section) in [
            ("variable", &self.variables),
            ("resource", &self.resources),
            ("output", &self.outputs),
        ] {
            if !section.is_empty() {
                document.insert(key.to_string(), Value::Object(section.clone()));
            }
        }

        Value::Object(document)
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> PangeaResult<String> {
        Ok(serde_json::to_string_pretty(&self.synthesize())?)
    }

    /// Write the document to a file, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> PangeaResult<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = self.to_json_pretty()?;
        content.push('\n');
        fs::write(path, content)?;

        info!(
            "Wrote {} resource(s) to {}",
            self.resource_count(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}

/// Check a resource, variable or output name against Terraform's rules.
pub fn validate_name(name: &str) -> PangeaResult<()> {
    let re = cached_regex(NAME_PATTERN).map_err(|e| PangeaError::Config(e.to_string()))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(PangeaError::InvalidResourceName {
            name: name.to_string(),
            message: "must start with a letter or underscore and contain only letters, digits, underscores and hyphens".to_string(),
        })
    }
}
