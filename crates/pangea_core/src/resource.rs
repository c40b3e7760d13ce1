//! The contract every typed resource implements.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::block::Block;
use crate::error::{PangeaError, PangeaResult};

/// Properties derived from a resource's attributes.
///
/// These never consult real infrastructure; they are pure functions of the
/// declared configuration.
pub trait ComputedProperties: Serialize {
    /// Rough monthly cost in USD, when the resource has a fixed price.
    fn estimated_monthly_cost(&self) -> Option<f64> {
        None
    }
}

/// A validated attribute set for one Terraform resource type.
pub trait ResourceAttributes: Clone + DeserializeOwned {
    /// Terraform resource type, e.g. `aws_iam_role`.
    const RESOURCE_TYPE: &'static str;

    /// Attributes exported by the resource, in the order references list them.
    const OUTPUTS: &'static [&'static str];

    type Computed: ComputedProperties;

    /// Check cross-field constraints.
    fn validate(&self) -> PangeaResult<()>;

    /// Emit the Terraform JSON body of the resource block.
    fn to_block(&self) -> Block;

    /// Derive convenience properties from the attributes.
    fn computed(&self) -> Self::Computed;

    /// Deserialize a plain key-value hash and validate it.
    fn from_value(value: Value) -> PangeaResult<Self> {
        let attributes: Self = serde_json::from_value(value)
            .map_err(|e| PangeaError::invalid_attributes(Self::RESOURCE_TYPE, e.to_string()))?;
        attributes.validate()?;
        Ok(attributes)
    }
}
