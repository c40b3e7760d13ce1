//! Handles to declared resources.

use std::cell::OnceCell;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::interpolation::resource_attribute;
use crate::resource::{ComputedProperties, ResourceAttributes};

/// A declared resource, held by callers to wire dependent resources.
///
/// Output attributes are exposed as Terraform interpolation strings. Computed
/// properties are derived from the declared attributes on first access and
/// cached for the lifetime of the reference.
pub struct ResourceReference<A: ResourceAttributes> {
    name: String,
    attributes: A,
    outputs: Vec<(String, String)>,
    computed: OnceCell<A::Computed>,
}

impl<A: ResourceAttributes> ResourceReference<A> {
    pub fn new(name: impl Into<String>, attributes: A) -> Self {
        let name = name.into();
        let outputs = A::OUTPUTS
            .iter()
            .map(|attr| {
                (
                    attr.to_string(),
                    resource_attribute(A::RESOURCE_TYPE, &name, attr),
                )
            })
            .collect();

        Self {
            name,
            attributes,
            outputs,
            computed: OnceCell::new(),
        }
    }

    pub fn resource_type(&self) -> &'static str {
        A::RESOURCE_TYPE
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terraform address, `type.name`.
    pub fn address(&self) -> String {
        format!("{}.{}", A::RESOURCE_TYPE, self.name)
    }

    pub fn attributes(&self) -> &A {
        &self.attributes
    }

    /// Declared outputs in order, as `(attribute, interpolation)` pairs.
    pub fn outputs(&self) -> &[(String, String)] {
        &self.outputs
    }

    /// Interpolation for a declared output attribute.
    pub fn output(&self, attribute: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value.as_str())
    }

    /// Interpolation for any attribute, declared as an output or not.
    pub fn interpolate(&self, attribute: &str) -> String {
        resource_attribute(A::RESOURCE_TYPE, &self.name, attribute)
    }

    pub fn id(&self) -> String {
        self.interpolate("id")
    }

    pub fn arn(&self) -> String {
        self.interpolate("arn")
    }

    /// Computed properties, derived once and cached.
    pub fn computed(&self) -> &A::Computed {
        self.computed.get_or_init(|| self.attributes.computed())
    }

    /// A type-erased summary of this reference.
    pub fn summary(&self) -> DeclaredResource {
        let computed = self.computed();
        DeclaredResource {
            resource_type: A::RESOURCE_TYPE.to_string(),
            name: self.name.clone(),
            outputs: self.outputs.clone(),
            computed: serde_json::to_value(computed).unwrap_or(Value::Null),
            estimated_monthly_cost: computed.estimated_monthly_cost(),
        }
    }
}

impl<A: ResourceAttributes> Clone for ResourceReference<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            outputs: self.outputs.clone(),
            computed: OnceCell::new(),
        }
    }
}

impl<A: ResourceAttributes + fmt::Debug> fmt::Debug for ResourceReference<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReference")
            .field("address", &self.address())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<A: ResourceAttributes> fmt::Display for ResourceReference<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

/// Summary of a declared resource without its attribute type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredResource {
    pub resource_type: String,
    pub name: String,
    pub outputs: Vec<(String, String)>,
    pub computed: Value,
    pub estimated_monthly_cost: Option<f64>,
}

impl DeclaredResource {
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    pub fn output(&self, attribute: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestQueue;

    fn reference() -> ResourceReference<TestQueue> {
        ResourceReference::new(
            "jobs",
            TestQueue {
                queue_name: "jobs".to_string(),
                retention_seconds: 600,
                fifo: true,
            },
        )
    }

    #[test]
    fn test_outputs_follow_declared_order() {
        let r = reference();
        let names: Vec<&str> = r.outputs().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "arn", "url"]);
        assert_eq!(r.output("url"), Some("${test_queue.jobs.url}"));
        assert_eq!(r.output("missing"), None);
    }

    #[test]
    fn test_interpolate_any_attribute() {
        let r = reference();
        assert_eq!(r.interpolate("dead_letter_arn"), "${test_queue.jobs.dead_letter_arn}");
        assert_eq!(r.arn(), "${test_queue.jobs.arn}");
        assert_eq!(r.to_string(), "test_queue.jobs");
    }

    #[test]
    fn test_computed_is_memoized() {
        let r = reference();
        let first: *const _ = r.computed();
        let second: *const _ = r.computed();
        assert_eq!(first, second);
        assert!(r.computed().is_fifo);
    }

    #[test]
    fn test_summary() {
        let summary = reference().summary();
        assert_eq!(summary.address(), "test_queue.jobs");
        assert_eq!(summary.computed["is_fifo"], serde_json::json!(true));
        assert_eq!(summary.estimated_monthly_cost, Some(0.4));
        assert_eq!(summary.output("id"), Some("${test_queue.jobs.id}"));
    }
}
