//! WAFv2 rule statements.
//!
//! A statement carries exactly one inspection kind. Logical statements
//! (`and`, `or`, `not`) nest further statements, so validation, emission and
//! capacity estimation all recurse.

use serde::Deserialize;

use pangea_core::validation::{field_path, index_path};
use pangea_core::{Block, Validator};

use crate::types::validate_arn;

pub const TEXT_TRANSFORMATIONS: &[&str] = &[
    "NONE",
    "COMPRESS_WHITE_SPACE",
    "HTML_ENTITY_DECODE",
    "LOWERCASE",
    "CMD_LINE",
    "URL_DECODE",
    "BASE64_DECODE",
    "HEX_DECODE",
    "MD5",
    "REPLACE_COMMENTS",
    "ESCAPE_SEQ_DECODE",
    "SQL_HEX_DECODE",
    "CSS_DECODE",
    "JS_DECODE",
    "NORMALIZE_PATH",
    "NORMALIZE_PATH_WIN",
    "REMOVE_NULLS",
    "REPLACE_NULLS",
    "BASE64_DECODE_EXT",
    "URL_DECODE_UNI",
    "UTF8_TO_UNICODE",
];

pub const POSITIONAL_CONSTRAINTS: &[&str] =
    &["EXACTLY", "STARTS_WITH", "ENDS_WITH", "CONTAINS", "CONTAINS_WORD"];

pub const COMPARISON_OPERATORS: &[&str] = &["EQ", "NE", "LE", "LT", "GE", "GT"];

pub const AGGREGATE_KEY_TYPES: &[&str] = &["IP", "FORWARDED_IP", "CONSTANT"];

const MAX_SIZE_CONSTRAINT: u64 = 21_474_836_480;

/// A block with no arguments, e.g. `allow {}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyBlock {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomResponse {
    pub response_code: u16,
    pub custom_response_body_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockAction {
    pub custom_response: Option<CustomResponse>,
}

impl BlockAction {
    pub(crate) fn validate(&self, v: &mut Validator, path: &str) {
        if let Some(response) = &self.custom_response {
            v.range(
                &field_path(path, "custom_response.response_code"),
                response.response_code,
                200,
                599,
            );
        }
    }

    pub(crate) fn to_block(&self) -> Block {
        Block::new().opt_block(
            "custom_response",
            self.custom_response.as_ref().map(|r| {
                Block::new()
                    .attr("response_code", r.response_code)
                    .opt_str("custom_response_body_key", r.custom_response_body_key.as_ref())
            }),
        )
    }
}

/// Terminating or counting action for a rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleAction {
    pub allow: Option<EmptyBlock>,
    pub block: Option<BlockAction>,
    pub count: Option<EmptyBlock>,
    pub captcha: Option<EmptyBlock>,
    pub challenge: Option<EmptyBlock>,
}

impl RuleAction {
    pub(crate) fn validate(&self, v: &mut Validator, path: &str) {
        let names: Vec<String> = ["allow", "block", "count", "captcha", "challenge"]
            .iter()
            .map(|name| field_path(path, name))
            .collect();
        v.exactly_one_of(&[
            (names[0].as_str(), self.allow.is_some()),
            (names[1].as_str(), self.block.is_some()),
            (names[2].as_str(), self.count.is_some()),
            (names[3].as_str(), self.captcha.is_some()),
            (names[4].as_str(), self.challenge.is_some()),
        ]);
        if let Some(block) = &self.block {
            block.validate(v, &names[1]);
        }
    }

    pub(crate) fn to_block(&self) -> Block {
        let empty = |present: bool| present.then(Block::new);
        Block::new()
            .opt_block("allow", empty(self.allow.is_some()))
            .opt_block("block", self.block.as_ref().map(BlockAction::to_block))
            .opt_block("count", empty(self.count.is_some()))
            .opt_block("captcha", empty(self.captcha.is_some()))
            .opt_block("challenge", empty(self.challenge.is_some()))
    }
}

/// Overrides the actions of a rule group's own rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleActionOverride {
    pub name: String,
    pub action_to_use: RuleAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedField {
    pub name: String,
}

/// The part of a web request to inspect.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldToMatch {
    pub all_query_arguments: Option<EmptyBlock>,
    pub body: Option<EmptyBlock>,
    pub method: Option<EmptyBlock>,
    pub query_string: Option<EmptyBlock>,
    pub single_header: Option<NamedField>,
    pub single_query_argument: Option<NamedField>,
    pub uri_path: Option<EmptyBlock>,
}

impl FieldToMatch {
    fn validate(&self, v: &mut Validator, path: &str) {
        let path = field_path(path, "field_to_match");
        let fields = [
            ("all_query_arguments", self.all_query_arguments.is_some()),
            ("body", self.body.is_some()),
            ("method", self.method.is_some()),
            ("query_string", self.query_string.is_some()),
            ("single_header", self.single_header.is_some()),
            ("single_query_argument", self.single_query_argument.is_some()),
            ("uri_path", self.uri_path.is_some()),
        ];
        let names: Vec<String> = fields.iter().map(|(name, _)| field_path(&path, name)).collect();
        let group: Vec<(&str, bool)> = names
            .iter()
            .zip(fields.iter())
            .map(|(name, (_, present))| (name.as_str(), *present))
            .collect();
        v.exactly_one_of(&group);

        for (field, named) in [
            ("single_header", &self.single_header),
            ("single_query_argument", &self.single_query_argument),
        ] {
            if let Some(named) = named {
                v.length(&field_path(&path, &format!("{}.name", field)), &named.name, 1, 64);
            }
        }
    }

    fn to_block(&self) -> Block {
        let empty = |present: bool| present.then(Block::new);
        let named = |field: &Option<NamedField>| {
            field
                .as_ref()
                .map(|f| Block::new().attr("name", f.name.as_str()))
        };
        Block::new()
            .opt_block("all_query_arguments", empty(self.all_query_arguments.is_some()))
            .opt_block("body", empty(self.body.is_some()))
            .opt_block("method", empty(self.method.is_some()))
            .opt_block("query_string", empty(self.query_string.is_some()))
            .opt_block("single_header", named(&self.single_header))
            .opt_block("single_query_argument", named(&self.single_query_argument))
            .opt_block("uri_path", empty(self.uri_path.is_some()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextTransformation {
    pub priority: u32,
    #[serde(rename = "type")]
    pub transformation_type: String,
}

fn validate_transformations(v: &mut Validator, path: &str, transformations: &[TextTransformation]) {
    let field = field_path(path, "text_transformation");
    v.count(&field, transformations.len(), 1, 10);
    v.unique(&format!("{}.priority", field), transformations.iter().map(|t| t.priority));
    for (i, t) in transformations.iter().enumerate() {
        v.one_of(
            &format!("{}.type", index_path(&field, i)),
            &t.transformation_type,
            TEXT_TRANSFORMATIONS,
        );
    }
}

fn transformation_blocks(transformations: &[TextTransformation]) -> Vec<Block> {
    transformations
        .iter()
        .map(|t| {
            Block::new()
                .attr("priority", t.priority)
                .attr("type", t.transformation_type.as_str())
        })
        .collect()
}

/// Extra capacity for transformations that actually transform.
fn transformation_cost(transformations: &[TextTransformation]) -> u32 {
    10 * transformations
        .iter()
        .filter(|t| t.transformation_type != "NONE")
        .count() as u32
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByteMatchStatement {
    pub search_string: String,
    pub positional_constraint: String,
    pub field_to_match: FieldToMatch,
    pub text_transformation: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoMatchStatement {
    pub country_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpSetReferenceStatement {
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedRuleGroupStatement {
    pub name: String,
    pub vendor_name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub rule_action_override: Vec<RuleActionOverride>,
    pub scope_down_statement: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateBasedStatement {
    pub limit: u64,
    #[serde(default = "default_aggregate_key_type")]
    pub aggregate_key_type: String,
    pub evaluation_window_sec: Option<u32>,
    pub scope_down_statement: Option<Box<Statement>>,
}

fn default_aggregate_key_type() -> String {
    "IP".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatementList {
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotStatement {
    pub statement: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeConstraintStatement {
    pub comparison_operator: String,
    pub size: u64,
    pub field_to_match: FieldToMatch,
    pub text_transformation: Vec<TextTransformation>,
}

/// Body of the SQL injection and cross-site scripting match statements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchStatement {
    pub field_to_match: FieldToMatch,
    pub text_transformation: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexPatternSetReferenceStatement {
    pub arn: String,
    pub field_to_match: FieldToMatch,
    pub text_transformation: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelMatchStatement {
    pub scope: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroupReferenceStatement {
    pub arn: String,
    #[serde(default)]
    pub rule_action_override: Vec<RuleActionOverride>,
}

/// Where a statement sits; nested statements may not reference rule groups
/// or be rate-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    TopLevel,
    Nested,
}

/// A WAFv2 rule statement. Exactly one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Statement {
    pub byte_match_statement: Option<ByteMatchStatement>,
    pub geo_match_statement: Option<GeoMatchStatement>,
    pub ip_set_reference_statement: Option<IpSetReferenceStatement>,
    pub managed_rule_group_statement: Option<ManagedRuleGroupStatement>,
    pub rate_based_statement: Option<RateBasedStatement>,
    pub and_statement: Option<StatementList>,
    pub or_statement: Option<StatementList>,
    pub not_statement: Option<NotStatement>,
    pub size_constraint_statement: Option<SizeConstraintStatement>,
    pub sqli_match_statement: Option<MatchStatement>,
    pub xss_match_statement: Option<MatchStatement>,
    pub regex_pattern_set_reference_statement: Option<RegexPatternSetReferenceStatement>,
    pub label_match_statement: Option<LabelMatchStatement>,
    pub rule_group_reference_statement: Option<RuleGroupReferenceStatement>,
}

impl Statement {
    /// Names of the statement kinds that are set.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.presence()
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| name)
            .collect()
    }

    fn presence(&self) -> [(&'static str, bool); 14] {
        [
            ("byte_match_statement", self.byte_match_statement.is_some()),
            ("geo_match_statement", self.geo_match_statement.is_some()),
            ("ip_set_reference_statement", self.ip_set_reference_statement.is_some()),
            ("managed_rule_group_statement", self.managed_rule_group_statement.is_some()),
            ("rate_based_statement", self.rate_based_statement.is_some()),
            ("and_statement", self.and_statement.is_some()),
            ("or_statement", self.or_statement.is_some()),
            ("not_statement", self.not_statement.is_some()),
            ("size_constraint_statement", self.size_constraint_statement.is_some()),
            ("sqli_match_statement", self.sqli_match_statement.is_some()),
            ("xss_match_statement", self.xss_match_statement.is_some()),
            (
                "regex_pattern_set_reference_statement",
                self.regex_pattern_set_reference_statement.is_some(),
            ),
            ("label_match_statement", self.label_match_statement.is_some()),
            ("rule_group_reference_statement", self.rule_group_reference_statement.is_some()),
        ]
    }

    /// References a managed or customer rule group.
    pub fn is_rule_group(&self) -> bool {
        self.managed_rule_group_statement.is_some() || self.rule_group_reference_statement.is_some()
    }

    /// Contains a rate-based statement.
    pub fn has_rate_limit(&self) -> bool {
        self.rate_based_statement.is_some() || self.children().iter().any(|s| s.has_rate_limit())
    }

    /// Names of managed rule groups referenced by this statement tree.
    pub fn managed_rule_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .managed_rule_group_statement
            .iter()
            .map(|m| format!("{}/{}", m.vendor_name, m.name))
            .collect();
        for child in self.children() {
            groups.extend(child.managed_rule_groups());
        }
        groups
    }

    fn children(&self) -> Vec<&Statement> {
        let mut children: Vec<&Statement> = Vec::new();
        if let Some(list) = &self.and_statement {
            children.extend(list.statement.iter());
        }
        if let Some(list) = &self.or_statement {
            children.extend(list.statement.iter());
        }
        if let Some(not) = &self.not_statement {
            children.push(&not.statement);
        }
        if let Some(scope_down) = self
            .rate_based_statement
            .as_ref()
            .and_then(|r| r.scope_down_statement.as_deref())
        {
            children.push(scope_down);
        }
        if let Some(scope_down) = self
            .managed_rule_group_statement
            .as_ref()
            .and_then(|m| m.scope_down_statement.as_deref())
        {
            children.push(scope_down);
        }
        children
    }

    /// Estimated web ACL capacity units consumed.
    pub fn capacity(&self) -> u32 {
        let own = if let Some(s) = &self.byte_match_statement {
            1 + transformation_cost(&s.text_transformation)
        } else if self.geo_match_statement.is_some() || self.ip_set_reference_statement.is_some() {
            1
        } else if let Some(m) = &self.managed_rule_group_statement {
            managed_group_capacity(&m.name)
        } else if self.rate_based_statement.is_some() {
            2
        } else if let Some(s) = &self.size_constraint_statement {
            1 + transformation_cost(&s.text_transformation)
        } else if let Some(s) = &self.sqli_match_statement {
            20 + transformation_cost(&s.text_transformation)
        } else if let Some(s) = &self.xss_match_statement {
            40 + transformation_cost(&s.text_transformation)
        } else if let Some(s) = &self.regex_pattern_set_reference_statement {
            25 + transformation_cost(&s.text_transformation)
        } else if self.label_match_statement.is_some() {
            1
        } else if self.rule_group_reference_statement.is_some() {
            100
        } else {
            0
        };

        own + self.children().iter().map(|s| s.capacity()).sum::<u32>()
    }

    pub fn validate(&self, v: &mut Validator, path: &str, nesting: Nesting) {
        let presence = self.presence();
        let names: Vec<String> = presence.iter().map(|(name, _)| field_path(path, name)).collect();
        let group: Vec<(&str, bool)> = names
            .iter()
            .zip(presence.iter())
            .map(|(name, (_, present))| (name.as_str(), *present))
            .collect();
        v.exactly_one_of(&group);

        if nesting == Nesting::Nested {
            for kind in [
                "managed_rule_group_statement",
                "rule_group_reference_statement",
                "rate_based_statement",
            ] {
                let present = presence.iter().any(|(name, set)| *name == kind && *set);
                v.forbids(&field_path(path, kind), present, true, "inside another statement");
            }
        }

        if let Some(s) = &self.byte_match_statement {
            let path = field_path(path, "byte_match_statement");
            v.length(&field_path(&path, "search_string"), &s.search_string, 1, 200);
            v.one_of(
                &field_path(&path, "positional_constraint"),
                &s.positional_constraint,
                POSITIONAL_CONSTRAINTS,
            );
            s.field_to_match.validate(v, &path);
            validate_transformations(v, &path, &s.text_transformation);
        }

        if let Some(s) = &self.geo_match_statement {
            let path = field_path(path, "geo_match_statement.country_codes");
            v.count(&path, s.country_codes.len(), 1, usize::MAX);
            v.unique(&path, s.country_codes.iter().map(String::as_str));
            for (i, code) in s.country_codes.iter().enumerate() {
                v.format(&index_path(&path, i), code, r"^[A-Z]{2}$", "an ISO 3166 alpha-2 country code");
            }
        }

        if let Some(s) = &self.ip_set_reference_statement {
            validate_arn(v, &field_path(path, "ip_set_reference_statement.arn"), &s.arn);
        }

        if let Some(s) = &self.managed_rule_group_statement {
            let path = field_path(path, "managed_rule_group_statement");
            v.not_blank(&field_path(&path, "name"), &s.name);
            v.not_blank(&field_path(&path, "vendor_name"), &s.vendor_name);
            validate_overrides(v, &path, &s.rule_action_override);
            if let Some(scope_down) = &s.scope_down_statement {
                scope_down.validate(v, &field_path(&path, "scope_down_statement"), Nesting::Nested);
            }
        }

        if let Some(s) = &self.rate_based_statement {
            let path = field_path(path, "rate_based_statement");
            v.range(&field_path(&path, "limit"), s.limit, 100, 2_000_000_000);
            v.one_of(
                &field_path(&path, "aggregate_key_type"),
                &s.aggregate_key_type,
                AGGREGATE_KEY_TYPES,
            );
            if s.aggregate_key_type == "CONSTANT" {
                v.requires(
                    &field_path(&path, "aggregate_key_type"),
                    true,
                    "scope_down_statement",
                    s.scope_down_statement.is_some(),
                );
            }
            if let Some(window) = s.evaluation_window_sec {
                v.one_of(
                    &field_path(&path, "evaluation_window_sec"),
                    &window.to_string(),
                    &["60", "120", "300", "600"],
                );
            }
            if let Some(scope_down) = &s.scope_down_statement {
                scope_down.validate(v, &field_path(&path, "scope_down_statement"), Nesting::Nested);
            }
        }

        for (kind, list) in [("and_statement", &self.and_statement), ("or_statement", &self.or_statement)] {
            if let Some(list) = list {
                let path = field_path(&field_path(path, kind), "statement");
                v.count(&path, list.statement.len(), 2, usize::MAX);
                for (i, child) in list.statement.iter().enumerate() {
                    child.validate(v, &index_path(&path, i), Nesting::Nested);
                }
            }
        }

        if let Some(s) = &self.not_statement {
            s.statement
                .validate(v, &field_path(path, "not_statement.statement"), Nesting::Nested);
        }

        if let Some(s) = &self.size_constraint_statement {
            let path = field_path(path, "size_constraint_statement");
            v.one_of(
                &field_path(&path, "comparison_operator"),
                &s.comparison_operator,
                COMPARISON_OPERATORS,
            );
            v.range(&field_path(&path, "size"), s.size, 0, MAX_SIZE_CONSTRAINT);
            s.field_to_match.validate(v, &path);
            validate_transformations(v, &path, &s.text_transformation);
        }

        for (kind, s) in [
            ("sqli_match_statement", &self.sqli_match_statement),
            ("xss_match_statement", &self.xss_match_statement),
        ] {
            if let Some(s) = s {
                let path = field_path(path, kind);
                s.field_to_match.validate(v, &path);
                validate_transformations(v, &path, &s.text_transformation);
            }
        }

        if let Some(s) = &self.regex_pattern_set_reference_statement {
            let path = field_path(path, "regex_pattern_set_reference_statement");
            validate_arn(v, &field_path(&path, "arn"), &s.arn);
            s.field_to_match.validate(v, &path);
            validate_transformations(v, &path, &s.text_transformation);
        }

        if let Some(s) = &self.label_match_statement {
            let path = field_path(path, "label_match_statement");
            v.one_of(&field_path(&path, "scope"), &s.scope, &["LABEL", "NAMESPACE"]);
            v.length(&field_path(&path, "key"), &s.key, 1, 1024);
        }

        if let Some(s) = &self.rule_group_reference_statement {
            let path = field_path(path, "rule_group_reference_statement");
            validate_arn(v, &field_path(&path, "arn"), &s.arn);
            validate_overrides(v, &path, &s.rule_action_override);
        }
    }

    pub fn to_block(&self) -> Block {
        let transform = |t: &[TextTransformation]| transformation_blocks(t);

        Block::new()
            .opt_block(
                "byte_match_statement",
                self.byte_match_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("search_string", s.search_string.as_str())
                        .attr("positional_constraint", s.positional_constraint.as_str())
                        .block("field_to_match", s.field_to_match.to_block())
                        .blocks("text_transformation", transform(&s.text_transformation))
                }),
            )
            .opt_block(
                "geo_match_statement",
                self.geo_match_statement
                    .as_ref()
                    .map(|s| Block::new().list("country_codes", s.country_codes.iter().map(String::as_str))),
            )
            .opt_block(
                "ip_set_reference_statement",
                self.ip_set_reference_statement
                    .as_ref()
                    .map(|s| Block::new().attr("arn", s.arn.as_str())),
            )
            .opt_block(
                "managed_rule_group_statement",
                self.managed_rule_group_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("name", s.name.as_str())
                        .attr("vendor_name", s.vendor_name.as_str())
                        .opt_str("version", s.version.as_ref())
                        .blocks("rule_action_override", override_blocks(&s.rule_action_override))
                        .opt_block(
                            "scope_down_statement",
                            s.scope_down_statement.as_ref().map(|st| st.to_block()),
                        )
                }),
            )
            .opt_block(
                "rate_based_statement",
                self.rate_based_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("limit", s.limit)
                        .attr("aggregate_key_type", s.aggregate_key_type.as_str())
                        .opt("evaluation_window_sec", s.evaluation_window_sec)
                        .opt_block(
                            "scope_down_statement",
                            s.scope_down_statement.as_ref().map(|st| st.to_block()),
                        )
                }),
            )
            .opt_block(
                "and_statement",
                self.and_statement.as_ref().map(StatementList::to_block),
            )
            .opt_block(
                "or_statement",
                self.or_statement.as_ref().map(StatementList::to_block),
            )
            .opt_block(
                "not_statement",
                self.not_statement
                    .as_ref()
                    .map(|s| Block::new().block("statement", s.statement.to_block())),
            )
            .opt_block(
                "size_constraint_statement",
                self.size_constraint_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("comparison_operator", s.comparison_operator.as_str())
                        .attr("size", s.size)
                        .block("field_to_match", s.field_to_match.to_block())
                        .blocks("text_transformation", transform(&s.text_transformation))
                }),
            )
            .opt_block(
                "sqli_match_statement",
                self.sqli_match_statement.as_ref().map(MatchStatement::to_block),
            )
            .opt_block(
                "xss_match_statement",
                self.xss_match_statement.as_ref().map(MatchStatement::to_block),
            )
            .opt_block(
                "regex_pattern_set_reference_statement",
                self.regex_pattern_set_reference_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("arn", s.arn.as_str())
                        .block("field_to_match", s.field_to_match.to_block())
                        .blocks("text_transformation", transform(&s.text_transformation))
                }),
            )
            .opt_block(
                "label_match_statement",
                self.label_match_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("scope", s.scope.as_str())
                        .attr("key", s.key.as_str())
                }),
            )
            .opt_block(
                "rule_group_reference_statement",
                self.rule_group_reference_statement.as_ref().map(|s| {
                    Block::new()
                        .attr("arn", s.arn.as_str())
                        .blocks("rule_action_override", override_blocks(&s.rule_action_override))
                }),
            )
    }
}

impl StatementList {
    fn to_block(&self) -> Block {
        Block::new().blocks("statement", self.statement.iter().map(Statement::to_block))
    }
}

impl MatchStatement {
    fn to_block(&self) -> Block {
        Block::new()
            .block("field_to_match", self.field_to_match.to_block())
            .blocks("text_transformation", transformation_blocks(&self.text_transformation))
    }
}

fn validate_overrides(v: &mut Validator, path: &str, overrides: &[RuleActionOverride]) {
    let field = field_path(path, "rule_action_override");
    v.count(&field, overrides.len(), 0, 100);
    v.unique(&format!("{}.name", field), overrides.iter().map(|o| o.name.as_str()));
    for (i, o) in overrides.iter().enumerate() {
        let item = index_path(&field, i);
        v.not_blank(&field_path(&item, "name"), &o.name);
        o.action_to_use.validate(v, &field_path(&item, "action_to_use"));
    }
}

fn override_blocks(overrides: &[RuleActionOverride]) -> Vec<Block> {
    overrides
        .iter()
        .map(|o| {
            Block::new()
                .attr("name", o.name.as_str())
                .block("action_to_use", o.action_to_use.to_block())
        })
        .collect()
}

/// Published capacity of common AWS managed rule groups.
fn managed_group_capacity(name: &str) -> u32 {
    match name {
        "AWSManagedRulesCommonRuleSet" => 700,
        "AWSManagedRulesKnownBadInputsRuleSet" => 200,
        "AWSManagedRulesSQLiRuleSet" => 200,
        "AWSManagedRulesLinuxRuleSet" => 200,
        "AWSManagedRulesUnixRuleSet" => 100,
        "AWSManagedRulesWindowsRuleSet" => 200,
        "AWSManagedRulesPHPRuleSet" => 100,
        "AWSManagedRulesWordPressRuleSet" => 100,
        "AWSManagedRulesAdminProtectionRuleSet" => 100,
        "AWSManagedRulesAmazonIpReputationList" => 25,
        "AWSManagedRulesAnonymousIpList" => 50,
        "AWSManagedRulesBotControlRuleSet" => 50,
        "AWSManagedRulesATPRuleSet" => 50,
        _ => 100,
    }
}
