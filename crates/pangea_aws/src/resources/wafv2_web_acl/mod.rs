//! `aws_wafv2_web_acl`
//!
//! A web ACL is an ordered list of rules plus a default action. Rules that
//! reference a rule group take an `override_action`; all others take an
//! `action`.

mod statement;

use serde::{Deserialize, Serialize};

use pangea_core::validation::{field_path, index_path};
use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::types::{validate_tags, Tags};

pub use statement::{
    BlockAction, ByteMatchStatement, CustomResponse, EmptyBlock, FieldToMatch, GeoMatchStatement,
    IpSetReferenceStatement, LabelMatchStatement, ManagedRuleGroupStatement, MatchStatement,
    NamedField, Nesting, NotStatement, RateBasedStatement, RegexPatternSetReferenceStatement,
    RuleAction, RuleActionOverride, RuleGroupReferenceStatement, SizeConstraintStatement, Statement,
    StatementList, TextTransformation,
};

const NAME_PATTERN: &str = r"^[\w-]+$";
const METRIC_NAME_PATTERN: &str = r"^[\w#:.\-/]+$";

/// Capacity every web ACL gets before additional charges apply.
pub const DEFAULT_CAPACITY: u32 = 1500;

/// Hard AWS limit on web ACL capacity.
pub const MAX_CAPACITY: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Regional,
    Cloudfront,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Regional => "REGIONAL",
            Scope::Cloudfront => "CLOUDFRONT",
        }
    }
}

/// Action applied to requests no rule matched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultAction {
    pub allow: Option<EmptyBlock>,
    pub block: Option<BlockAction>,
}

/// Action for rules that reference a rule group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverrideAction {
    pub none: Option<EmptyBlock>,
    pub count: Option<EmptyBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisibilityConfig {
    pub cloudwatch_metrics_enabled: bool,
    pub metric_name: String,
    pub sampled_requests_enabled: bool,
}

impl VisibilityConfig {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            cloudwatch_metrics_enabled: true,
            metric_name: metric_name.into(),
            sampled_requests_enabled: true,
        }
    }

    fn validate(&self, v: &mut Validator, path: &str) {
        let field = field_path(path, "metric_name");
        v.length(&field, &self.metric_name, 1, 128);
        v.format(&field, &self.metric_name, METRIC_NAME_PATTERN, "a valid metric name");
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("cloudwatch_metrics_enabled", self.cloudwatch_metrics_enabled)
            .attr("metric_name", self.metric_name.as_str())
            .attr("sampled_requests_enabled", self.sampled_requests_enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleLabel {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub name: String,
    pub priority: u32,
    pub action: Option<RuleAction>,
    pub override_action: Option<OverrideAction>,
    pub statement: Statement,
    pub visibility_config: VisibilityConfig,
    #[serde(default)]
    pub rule_label: Vec<RuleLabel>,
}

impl Rule {
    fn validate(&self, v: &mut Validator, path: &str) {
        let name = field_path(path, "name");
        v.length(&name, &self.name, 1, 128);
        v.format(&name, &self.name, NAME_PATTERN, "a valid rule name");

        let action = field_path(path, "action");
        let override_action = field_path(path, "override_action");
        v.exactly_one_of(&[
            (action.as_str(), self.action.is_some()),
            (override_action.as_str(), self.override_action.is_some()),
        ]);

        let rule_group = self.statement.is_rule_group();
        v.forbids(&action, self.action.is_some(), rule_group, "for rule group statements");
        v.forbids(
            &override_action,
            self.override_action.is_some(),
            !rule_group,
            "unless the statement references a rule group",
        );

        if let Some(a) = &self.action {
            a.validate(v, &action);
        }
        if let Some(o) = &self.override_action {
            let none = field_path(&override_action, "none");
            let count = field_path(&override_action, "count");
            v.exactly_one_of(&[
                (none.as_str(), o.none.is_some()),
                (count.as_str(), o.count.is_some()),
            ]);
        }

        self.statement
            .validate(v, &field_path(path, "statement"), Nesting::TopLevel);
        self.visibility_config
            .validate(v, &field_path(path, "visibility_config"));

        let labels = field_path(path, "rule_label");
        for (i, label) in self.rule_label.iter().enumerate() {
            v.length(&field_path(&index_path(&labels, i), "name"), &label.name, 1, 1024);
        }
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("name", self.name.as_str())
            .attr("priority", self.priority)
            .opt_block("action", self.action.as_ref().map(RuleAction::to_block))
            .opt_block(
                "override_action",
                self.override_action.as_ref().map(|o| {
                    Block::new()
                        .opt_block("none", o.none.as_ref().map(|_| Block::new()))
                        .opt_block("count", o.count.as_ref().map(|_| Block::new()))
                }),
            )
            .block("statement", self.statement.to_block())
            .block("visibility_config", self.visibility_config.to_block())
            .blocks(
                "rule_label",
                self.rule_label
                    .iter()
                    .map(|l| Block::new().attr("name", l.name.as_str())),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wafv2WebAclAttributes {
    pub name: String,
    pub description: Option<String>,
    pub scope: Scope,
    pub default_action: DefaultAction,
    #[serde(default, alias = "rules")]
    pub rule: Vec<Rule>,
    pub visibility_config: VisibilityConfig,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wafv2WebAclComputed {
    pub rule_count: usize,
    pub estimated_capacity: u32,
    pub exceeds_default_capacity: bool,
    pub managed_rule_groups: Vec<String>,
    pub uses_managed_rules: bool,
    pub has_rate_limiting: bool,
    pub monthly_cost: f64,
}

impl ComputedProperties for Wafv2WebAclComputed {
    fn estimated_monthly_cost(&self) -> Option<f64> {
        Some(self.monthly_cost)
    }
}

impl Wafv2WebAclAttributes {
    /// Estimated capacity units across all rules.
    pub fn estimated_capacity(&self) -> u32 {
        self.rule.iter().map(|r| r.statement.capacity()).sum()
    }
}

impl ResourceAttributes for Wafv2WebAclAttributes {
    const RESOURCE_TYPE: &'static str = "aws_wafv2_web_acl";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "capacity", "lock_token"];

    type Computed = Wafv2WebAclComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        v.length("name", &self.name, 1, 128);
        v.format("name", &self.name, NAME_PATTERN, "a valid web ACL name");
        if let Some(description) = &self.description {
            v.length("description", description, 1, 256);
        }

        v.exactly_one_of(&[
            ("default_action.allow", self.default_action.allow.is_some()),
            ("default_action.block", self.default_action.block.is_some()),
        ]);
        if let Some(block) = &self.default_action.block {
            block.validate(&mut v, "default_action.block");
        }

        v.unique("rule.name", self.rule.iter().map(|r| r.name.as_str()));
        v.unique("rule.priority", self.rule.iter().map(|r| r.priority));
        for (i, rule) in self.rule.iter().enumerate() {
            rule.validate(&mut v, &index_path("rule", i));
        }

        let capacity = self.estimated_capacity();
        v.check(
            capacity <= MAX_CAPACITY,
            RuleKind::Range,
            "rule",
            format!("estimated capacity {} exceeds the limit of {}", capacity, MAX_CAPACITY),
        );
        if capacity > DEFAULT_CAPACITY {
            v.warning(format!(
                "estimated capacity {} exceeds the {} WCUs included in the base price",
                capacity, DEFAULT_CAPACITY
            ));
        }

        self.visibility_config.validate(&mut v, "visibility_config");
        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        let default_action = Block::new()
            .opt_block("allow", self.default_action.allow.as_ref().map(|_| Block::new()))
            .opt_block(
                "block",
                self.default_action.block.as_ref().map(BlockAction::to_block),
            );

        Block::new()
            .attr("name", self.name.as_str())
            .opt_str("description", self.description.as_ref())
            .attr("scope", self.scope.as_str())
            .block("default_action", default_action)
            .blocks("rule", self.rule.iter().map(Rule::to_block))
            .block("visibility_config", self.visibility_config.to_block())
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let managed_rule_groups: Vec<String> = self
            .rule
            .iter()
            .flat_map(|r| r.statement.managed_rule_groups())
            .collect();
        let estimated_capacity = self.estimated_capacity();

        // $5 per ACL, $1 per rule, $1 per managed rule group subscription.
        let monthly_cost = 5.0 + self.rule.len() as f64 + managed_rule_groups.len() as f64;

        Wafv2WebAclComputed {
            rule_count: self.rule.len(),
            estimated_capacity,
            exceeds_default_capacity: estimated_capacity > DEFAULT_CAPACITY,
            uses_managed_rules: !managed_rule_groups.is_empty(),
            managed_rule_groups,
            has_rate_limiting: self.rule.iter().any(|r| r.statement.has_rate_limit()),
            monthly_cost,
        }
    }
}
