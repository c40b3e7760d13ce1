//! Typed AWS resources.

pub mod cloudwatch_metric_alarm;
pub mod iam_policy;
pub mod iam_role;
pub mod lb_target_group;
pub mod s3_bucket;
pub mod security_group;
pub mod subnet;
pub mod vpc;
pub mod wafv2_web_acl;

pub use cloudwatch_metric_alarm::CloudwatchMetricAlarmAttributes;
pub use iam_policy::IamPolicyAttributes;
pub use iam_role::IamRoleAttributes;
pub use lb_target_group::LbTargetGroupAttributes;
pub use s3_bucket::S3BucketAttributes;
pub use security_group::{SecurityGroupAttributes, SecurityGroupRule};
pub use subnet::SubnetAttributes;
pub use vpc::VpcAttributes;
pub use wafv2_web_acl::Wafv2WebAclAttributes;
