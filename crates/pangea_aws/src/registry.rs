//! Resource type registry for declaration files.
//!
//! Declaration files name resources by their Terraform type. The registry
//! maps each type to the typed attribute struct that validates and emits it.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use pangea_core::{
    DeclaredResource, Output, PangeaConfig, PangeaError, PangeaResult, ResourceAttributes,
    Synthesizer, Template,
};

use crate::provider::{aws_provider, validate_region};
use crate::resources::{
    CloudwatchMetricAlarmAttributes, IamPolicyAttributes, IamRoleAttributes, LbTargetGroupAttributes,
    S3BucketAttributes, SecurityGroupAttributes, SubnetAttributes, VpcAttributes,
    Wafv2WebAclAttributes,
};
use crate::types::Tags;

type DeclareFn = fn(&mut Synthesizer, &str, Value) -> PangeaResult<DeclaredResource>;

/// A registered resource type.
#[derive(Clone, Copy)]
pub struct ResourceType {
    pub name: &'static str,
    pub outputs: &'static [&'static str],
    declare: DeclareFn,
}

impl std::fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("outputs", &self.outputs)
            .finish()
    }
}

fn declare_as<A: ResourceAttributes>(
    synth: &mut Synthesizer,
    name: &str,
    attributes: Value,
) -> PangeaResult<DeclaredResource> {
    let reference = synth.declare_value::<A>(name, attributes)?;
    Ok(reference.summary())
}

/// Maps Terraform resource type names to typed implementations.
#[derive(Default)]
pub struct ResourceRegistry {
    types: HashMap<String, ResourceType>,
}

impl ResourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// A registry holding every AWS resource type in this crate.
    pub fn aws() -> Self {
        let mut registry = Self::new();
        registry.register::<IamRoleAttributes>();
        registry.register::<IamPolicyAttributes>();
        registry.register::<LbTargetGroupAttributes>();
        registry.register::<Wafv2WebAclAttributes>();
        registry.register::<CloudwatchMetricAlarmAttributes>();
        registry.register::<S3BucketAttributes>();
        registry.register::<VpcAttributes>();
        registry.register::<SubnetAttributes>();
        registry.register::<SecurityGroupAttributes>();
        registry
    }

    /// Register a resource type under its Terraform type name.
    ///
    /// A type registered twice replaces the earlier entry.
    pub fn register<A: ResourceAttributes>(&mut self) {
        debug!("Registering resource type: {}", A::RESOURCE_TYPE);
        self.types.insert(
            A::RESOURCE_TYPE.to_string(),
            ResourceType {
                name: A::RESOURCE_TYPE,
                outputs: A::OUTPUTS,
                declare: declare_as::<A>,
            },
        );
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceType> {
        self.types.get(resource_type)
    }

    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.contains_key(resource_type)
    }

    /// Registered types, sorted by name.
    pub fn types(&self) -> Vec<&ResourceType> {
        let mut types: Vec<&ResourceType> = self.types.values().collect();
        types.sort_by_key(|t| t.name);
        types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Validate a plain key-value hash as `resource_type` and declare it.
    pub fn declare(
        &self,
        synth: &mut Synthesizer,
        resource_type: &str,
        name: &str,
        attributes: Value,
    ) -> PangeaResult<DeclaredResource> {
        let entry = self
            .get(resource_type)
            .ok_or_else(|| PangeaError::UnknownResourceType(resource_type.to_string()))?;
        (entry.declare)(synth, name, attributes)
    }

    /// Build a synthesizer holding the provider, variables, resources and
    /// outputs of a template.
    ///
    /// Provider settings in the template win over the configuration; default
    /// tags from both are merged.
    pub fn synthesize_template(
        &self,
        template: &Template,
        config: &PangeaConfig,
    ) -> PangeaResult<Synthesizer> {
        template.validate()?;
        let settings = template.provider.clone().unwrap_or_default();
        let region = settings.region.unwrap_or_else(|| config.region.clone());
        validate_region(&region)?;
        let profile = settings.profile.or_else(|| config.profile.clone());

        let mut tags: Tags = config.default_tags.clone();
        tags.extend(settings.default_tags);

        let mut provider = aws_provider(&region, profile.as_deref(), &tags);
        provider.version = config.provider_version.clone();

        let mut synth = Synthesizer::new();
        synth.provider(provider);

        for (name, variable) in &template.variables {
            synth.variable(name, variable.clone())?;
        }
        for declaration in &template.resources {
            self.declare(
                &mut synth,
                &declaration.resource_type,
                &declaration.name,
                declaration.attributes.clone(),
            )?;
        }
        for (name, spec) in &template.outputs {
            synth.output(name, Output::from(spec.clone()))?;
        }

        info!(
            "Synthesized template '{}' ({} resource(s), region {})",
            template.name,
            synth.resource_count(),
            region
        );
        Ok(synth)
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
