//! `aws_iam_role`

use serde::{Deserialize, Serialize};

use pangea_core::validation::index_path;
use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, Validator};

use crate::policy::{PolicyDocument, PolicyKind};
use crate::types::{validate_arn, validate_name_or_prefix, validate_tags, Tags};

const NAME_PATTERN: &str = r"^[\w+=,.@-]+$";
const PATH_PATTERN: &str = r"^/([\x21-\x7E]+/)?$";

/// An inline policy embedded in a role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlinePolicy {
    pub name: String,
    pub policy: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamRoleAttributes {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub assume_role_policy: PolicyDocument,
    pub description: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_max_session_duration")]
    pub max_session_duration: u32,
    pub permissions_boundary: Option<String>,
    #[serde(default)]
    pub force_detach_policies: bool,
    #[serde(default)]
    pub inline_policy: Vec<InlinePolicy>,
    #[serde(default)]
    pub managed_policy_arns: Vec<String>,
    #[serde(default)]
    pub tags: Tags,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_max_session_duration() -> u32 {
    3600
}

impl IamRoleAttributes {
    /// A role with the given trust policy and every other field defaulted.
    pub fn new(assume_role_policy: PolicyDocument) -> Self {
        Self {
            name: None,
            name_prefix: None,
            assume_role_policy,
            description: None,
            path: default_path(),
            max_session_duration: default_max_session_duration(),
            permissions_boundary: None,
            force_detach_policies: false,
            inline_policy: Vec::new(),
            managed_policy_arns: Vec::new(),
            tags: Tags::new(),
        }
    }
}

/// Who may assume the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustKind {
    Service,
    Account,
    Federated,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IamRoleComputed {
    pub trusted_services: Vec<String>,
    pub trust_kind: TrustKind,
    pub is_service_role: bool,
    pub inline_policy_count: usize,
    pub managed_policy_count: usize,
}

impl ComputedProperties for IamRoleComputed {}

impl ResourceAttributes for IamRoleAttributes {
    const RESOURCE_TYPE: &'static str = "aws_iam_role";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "name", "unique_id", "create_date"];

    type Computed = IamRoleComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_name_or_prefix(
            &mut v,
            ("name", self.name.as_ref()),
            ("name_prefix", self.name_prefix.as_ref()),
        );
        if let Some(name) = &self.name {
            v.length("name", name, 1, 64);
            v.format("name", name, NAME_PATTERN, "a valid role name");
        }
        if let Some(prefix) = &self.name_prefix {
            v.length("name_prefix", prefix, 1, 38);
            v.format("name_prefix", prefix, NAME_PATTERN, "a valid role name prefix");
        }
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }

        v.length("path", &self.path, 1, 512);
        v.format("path", &self.path, PATH_PATTERN, "'/' or a path beginning and ending with '/'");
        v.range("max_session_duration", self.max_session_duration, 3600, 43200);

        if let Some(boundary) = &self.permissions_boundary {
            validate_arn(&mut v, "permissions_boundary", boundary);
        }

        self.assume_role_policy
            .validate(&mut v, "assume_role_policy", PolicyKind::Trust);

        v.unique("inline_policy.name", self.inline_policy.iter().map(|p| p.name.as_str()));
        for (i, inline) in self.inline_policy.iter().enumerate() {
            let path = index_path("inline_policy", i);
            v.length(&format!("{}.name", path), &inline.name, 1, 128);
            inline
                .policy
                .validate(&mut v, &format!("{}.policy", path), PolicyKind::Identity);
        }

        v.count("managed_policy_arns", self.managed_policy_arns.len(), 0, 20);
        v.unique("managed_policy_arns", self.managed_policy_arns.iter().map(String::as_str));
        for (i, arn) in self.managed_policy_arns.iter().enumerate() {
            validate_arn(&mut v, &index_path("managed_policy_arns", i), arn);
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("name", self.name.as_ref())
            .opt_str("name_prefix", self.name_prefix.as_ref())
            .json("assume_role_policy", self.assume_role_policy.as_value())
            .opt_str("description", self.description.as_ref())
            .attr("path", self.path.as_str())
            .attr("max_session_duration", self.max_session_duration)
            .opt_str("permissions_boundary", self.permissions_boundary.as_ref())
            .attr("force_detach_policies", self.force_detach_policies)
            .blocks(
                "inline_policy",
                self.inline_policy.iter().map(|p| {
                    Block::new()
                        .attr("name", p.name.as_str())
                        .json("policy", p.policy.as_value())
                }),
            )
            .list("managed_policy_arns", self.managed_policy_arns.iter().map(String::as_str))
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let policy = &self.assume_role_policy;
        let services: Vec<String> = policy
            .service_principals()
            .into_iter()
            .map(str::to_string)
            .collect();

        let kinds = [
            !services.is_empty(),
            !policy.aws_principals().is_empty(),
            !policy.federated_principals().is_empty(),
        ];
        let trust_kind = match kinds {
            [true, false, false] => TrustKind::Service,
            [false, true, false] => TrustKind::Account,
            [false, false, true] => TrustKind::Federated,
            _ => TrustKind::Mixed,
        };

        IamRoleComputed {
            is_service_role: trust_kind == TrustKind::Service,
            trusted_services: services,
            trust_kind,
            inline_policy_count: self.inline_policy.len(),
            managed_policy_count: self.managed_policy_arns.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_core::{PangeaError, RuleKind};
    use serde_json::json;

    fn trust() -> serde_json::Value {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" },
                "Action": "sts:AssumeRole"
            }]
        })
    }

    #[test]
    fn test_defaults_applied() {
        let role = IamRoleAttributes::from_value(json!({ "assume_role_policy": trust() })).unwrap();
        assert_eq!(role.path, "/");
        assert_eq!(role.max_session_duration, 3600);
        assert!(!role.force_detach_policies);
        assert_eq!(role, IamRoleAttributes::new(PolicyDocument::new(trust())));
    }

    #[test]
    fn test_name_and_prefix_exclusive() {
        let err = IamRoleAttributes::from_value(json!({
            "name": "app",
            "name_prefix": "app-",
            "assume_role_policy": trust()
        }))
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_rule(RuleKind::MutuallyExclusive));
        assert!(err.to_string().contains("mutually_exclusive"));
    }

    #[test]
    fn test_session_duration_range() {
        let err = IamRoleAttributes::from_value(json!({
            "assume_role_policy": trust(),
            "max_session_duration": 60
        }))
        .unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("max_session_duration"));
    }

    #[test]
    fn test_managed_policy_arns_limits() {
        let arns: Vec<String> = (0..21)
            .map(|i| format!("arn:aws:iam::123456789012:policy/app-{}", i))
            .collect();
        let err = IamRoleAttributes::from_value(json!({
            "assume_role_policy": trust(),
            "managed_policy_arns": arns
        }))
        .unwrap_err();
        assert!(err.validation_errors().unwrap().has_rule(RuleKind::Count));

        let readonly = "arn:aws:iam::aws:policy/ReadOnlyAccess";
        let err = IamRoleAttributes::from_value(json!({
            "assume_role_policy": trust(),
            "managed_policy_arns": [readonly, readonly]
        }))
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("managed_policy_arns"));
        assert!(errors.has_rule(RuleKind::Unique));
    }

    #[test]
    fn test_path_format() {
        for (path, ok) in [("/", true), ("/service/", true), ("service/", false), ("/service", false)] {
            let result = IamRoleAttributes::from_value(json!({
                "assume_role_policy": trust(),
                "path": path
            }));
            assert_eq!(result.is_ok(), ok, "path {}", path);
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = IamRoleAttributes::from_value(json!({
            "assume_role_policy": trust(),
            "max_session": 3600
        }))
        .unwrap_err();
        assert!(matches!(err, PangeaError::InvalidAttributes { .. }));
    }

    #[test]
    fn test_inline_policies_validated() {
        let err = IamRoleAttributes::from_value(json!({
            "assume_role_policy": trust(),
            "inline_policy": [
                { "name": "logs", "policy": { "Version": "2012-10-17", "Statement": [{ "Effect": "Allow", "Action": "logs:PutLogEvents", "Resource": "*" }] } },
                { "name": "logs", "policy": { "Version": "2012-10-17", "Statement": [{ "Effect": "Allow", "Action": "logs:PutLogEvents" }] } }
            ]
        }))
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("inline_policy.name"));
        assert!(errors.has_rule(RuleKind::ExactlyOne));
    }

    #[test]
    fn test_block_encodes_policies() {
        let mut role = IamRoleAttributes::new(PolicyDocument::new(trust()));
        role.name = Some("lambda-exec".to_string());
        role.managed_policy_arns = vec![
            "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole".to_string(),
        ];
        role.validate().unwrap();

        let block = role.to_block().into_value();
        assert_eq!(block["name"], json!("lambda-exec"));
        assert!(block["assume_role_policy"].is_string());
        assert_eq!(block["managed_policy_arns"].as_array().unwrap().len(), 1);
        assert!(block.get("inline_policy").is_none());
        assert!(block.get("tags").is_none());

        let parsed = IamRoleAttributes::from_value(block).unwrap();
        assert_eq!(parsed, role);
    }

    #[test]
    fn test_computed_trust_kind() {
        let role = IamRoleAttributes::new(PolicyDocument::new(trust()));
        let computed = role.computed();
        assert!(computed.is_service_role);
        assert_eq!(computed.trusted_services, vec!["lambda.amazonaws.com"]);

        let cross_account = IamRoleAttributes::new(PolicyDocument::new(json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": "arn:aws:iam::123456789012:root" },
                "Action": "sts:AssumeRole"
            }]
        })));
        assert_eq!(cross_account.computed().trust_kind, TrustKind::Account);
        assert!(!cross_account.computed().is_service_role);
    }
}
