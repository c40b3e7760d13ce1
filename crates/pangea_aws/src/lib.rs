//! # pangea_aws
//!
//! Typed AWS resources for Pangea.
//!
//! Each resource type is an attribute struct implementing
//! [`pangea_core::ResourceAttributes`]: it rejects unknown fields, validates
//! cross-field rules, emits its Terraform JSON block and derives computed
//! properties such as cost estimates.
//!
//! # Resources
//!
//! - `aws_iam_role`, `aws_iam_policy`
//! - `aws_lb_target_group`
//! - `aws_wafv2_web_acl`
//! - `aws_cloudwatch_metric_alarm`
//! - `aws_s3_bucket`
//! - `aws_vpc`, `aws_subnet`, `aws_security_group`
//!
//! # Example
//!
//! ```rust,ignore
//! use pangea_aws::{aws_provider, SubnetAttributes, VpcAttributes};
//! use pangea_core::Synthesizer;
//!
//! let mut synth = Synthesizer::new();
//! synth.provider(aws_provider("us-east-1", None, &Default::default()));
//!
//! let vpc = synth.declare("main", VpcAttributes::new("10.0.0.0/16"))?;
//! synth.declare("public", SubnetAttributes::new(vpc.id(), "10.0.1.0/24").public())?;
//!
//! synth.write(Path::new("terraform/network.tf.json"))?;
//! ```

pub mod policy;
pub mod provider;
pub mod registry;
pub mod resources;
pub mod types;

pub use policy::{PolicyDocument, PolicyKind};
pub use provider::{aws_provider, validate_region};
pub use registry::{ResourceRegistry, ResourceType};
pub use resources::{
    CloudwatchMetricAlarmAttributes, IamPolicyAttributes, IamRoleAttributes, LbTargetGroupAttributes,
    S3BucketAttributes, SecurityGroupAttributes, SecurityGroupRule, SubnetAttributes, VpcAttributes,
    Wafv2WebAclAttributes,
};
pub use types::{Ipv4Cidr, Tags};
