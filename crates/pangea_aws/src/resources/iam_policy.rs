//! `aws_iam_policy`

use serde::{Deserialize, Serialize};

use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::policy::{PolicyDocument, PolicyKind};
use crate::types::{validate_name_or_prefix, validate_tags, Tags};

const NAME_PATTERN: &str = r"^[\w+=,.@-]+$";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamPolicyAttributes {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    pub description: Option<String>,
    pub policy: PolicyDocument,
    #[serde(default)]
    pub tags: Tags,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IamPolicyComputed {
    pub statement_count: usize,
    pub allows_wildcard_action: bool,
    pub is_read_only: bool,
}

impl ComputedProperties for IamPolicyComputed {}

impl ResourceAttributes for IamPolicyAttributes {
    const RESOURCE_TYPE: &'static str = "aws_iam_policy";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "name", "policy_id"];

    type Computed = IamPolicyComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_name_or_prefix(
            &mut v,
            ("name", self.name.as_ref()),
            ("name_prefix", self.name_prefix.as_ref()),
        );
        for (field, value) in [("name", &self.name), ("name_prefix", &self.name_prefix)] {
            if let Some(value) = value {
                v.length(field, value, 1, 128);
                v.format(field, value, NAME_PATTERN, "a valid policy name");
            }
        }

        v.check(
            self.path.starts_with('/') && self.path.ends_with('/'),
            RuleKind::Format,
            "path",
            "must begin and end with '/'",
        );
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }

        self.policy.validate(&mut v, "policy", PolicyKind::Identity);
        v.length("policy", &self.policy.as_value().to_string(), 1, 6144);

        if self.policy.allows_wildcard_action() {
            v.warning("policy grants wildcard actions");
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("name", self.name.as_ref())
            .opt_str("name_prefix", self.name_prefix.as_ref())
            .attr("path", self.path.as_str())
            .opt_str("description", self.description.as_ref())
            .json("policy", self.policy.as_value())
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        IamPolicyComputed {
            statement_count: self.policy.statements().len(),
            allows_wildcard_action: self.policy.allows_wildcard_action(),
            is_read_only: self.policy.is_read_only(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_bucket() -> serde_json::Value {
        json!({
            "name": "read-artifacts",
            "policy": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["s3:GetObject", "s3:ListBucket"],
                    "Resource": ["arn:aws:s3:::artifacts", "arn:aws:s3:::artifacts/*"]
                }]
            }
        })
    }

    #[test]
    fn test_valid_policy() {
        let policy = IamPolicyAttributes::from_value(read_bucket()).unwrap();
        let computed = policy.computed();
        assert_eq!(computed.statement_count, 1);
        assert!(computed.is_read_only);
        assert!(!computed.allows_wildcard_action);
    }

    #[test]
    fn test_policy_round_trips_through_block() {
        let policy = IamPolicyAttributes::from_value(read_bucket()).unwrap();
        let block = policy.to_block().into_value();
        assert!(block["policy"].is_string());
        assert_eq!(IamPolicyAttributes::from_value(block).unwrap(), policy);
    }

    #[test]
    fn test_bad_path() {
        let mut value = read_bucket();
        value["path"] = json!("/team");
        let err = IamPolicyAttributes::from_value(value).unwrap_err();
        assert!(err.validation_errors().unwrap().has_rule(RuleKind::Format));
    }

    #[test]
    fn test_principal_not_allowed() {
        let mut value = read_bucket();
        value["policy"]["Statement"][0]["Principal"] = json!("*");
        let err = IamPolicyAttributes::from_value(value).unwrap_err();
        assert!(err.validation_errors().unwrap().has_rule(RuleKind::Conditional));
    }
}
