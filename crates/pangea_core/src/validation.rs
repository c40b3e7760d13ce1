//! Attribute validation.
//!
//! A [`Validator`] collects every violated constraint for one resource so a
//! caller sees all problems at once rather than the first one found. Each
//! [`Violation`] names the rule that failed and the field path it applies to,
//! e.g. `rule[2].statement.and_statement`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, OnceLock, PoisonError};

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::error::{PangeaError, PangeaResult};
use crate::interpolation::is_interpolation;

/// The kind of constraint a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    Format,
    Range,
    Length,
    Enumeration,
    MutuallyExclusive,
    ExactlyOne,
    MutuallyDependent,
    Conditional,
    Unique,
    Count,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Format => "format",
            RuleKind::Range => "range",
            RuleKind::Length => "length",
            RuleKind::Enumeration => "enumeration",
            RuleKind::MutuallyExclusive => "mutually_exclusive",
            RuleKind::ExactlyOne => "exactly_one",
            RuleKind::MutuallyDependent => "mutually_dependent",
            RuleKind::Conditional => "conditional",
            RuleKind::Unique => "unique",
            RuleKind::Count => "count",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: RuleKind,
    pub field: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.field, self.message)
    }
}

/// All violations found for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub resource_type: String,
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    /// Check whether any violation broke the given rule.
    pub fn has_rule(&self, rule: RuleKind) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// Check whether any violation was recorded against a field path.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed for {}", self.resource_type)?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// Collects constraint violations for one resource declaration.
#[derive(Debug)]
pub struct Validator {
    resource_type: String,
    violations: Vec<Violation>,
    warnings: Vec<String>,
}

impl Validator {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Record a violation directly.
    pub fn violation(&mut self, rule: RuleKind, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            rule,
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record an advisory that does not fail validation.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a violation when `condition` does not hold.
    pub fn check(&mut self, condition: bool, rule: RuleKind, field: &str, message: impl Into<String>) {
        if !condition {
            self.violation(rule, field, message);
        }
    }

    /// Field must be present.
    pub fn required(&mut self, field: &str, present: bool) {
        self.check(present, RuleKind::Required, field, "is required");
    }

    /// String must be present and non-blank.
    pub fn not_blank(&mut self, field: &str, value: &str) {
        self.check(!value.trim().is_empty(), RuleKind::Required, field, "must not be blank");
    }

    /// String must match a regular expression.
    pub fn format(&mut self, field: &str, value: &str, pattern: &str, expected: &str) {
        match cached_regex(pattern) {
            Ok(re) => {
                if !re.is_match(value) {
                    self.violation(
                        RuleKind::Format,
                        field,
                        format!("'{}' is not {}", value, expected),
                    );
                }
            }
            Err(e) => self.violation(RuleKind::Format, field, format!("invalid pattern: {}", e)),
        }
    }

    /// Like [`Validator::format`], but Terraform interpolations are accepted as-is.
    pub fn format_or_ref(&mut self, field: &str, value: &str, pattern: &str, expected: &str) {
        if !is_interpolation(value) {
            self.format(field, value, pattern, expected);
        }
    }

    /// Numeric value must lie within `min..=max`.
    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T)
    where
        T: PartialOrd + fmt::Display + Copy,
    {
        if value < min || value > max {
            self.violation(
                RuleKind::Range,
                field,
                format!("{} is outside the allowed range {}..={}", value, min, max),
            );
        }
    }

    /// String length (in characters) must lie within `min..=max`.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.violation(
                RuleKind::Length,
                field,
                format!("length {} is outside the allowed range {}..={}", len, min, max),
            );
        }
    }

    /// Value must be one of the allowed strings.
    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.violation(
                RuleKind::Enumeration,
                field,
                format!("'{}' must be one of: {}", value, allowed.join(", ")),
            );
        }
    }

    /// At most one field of the group may be present.
    pub fn at_most_one_of(&mut self, group: &[(&str, bool)]) {
        let present = present_names(group);
        if present.len() > 1 {
            self.violation(
                RuleKind::MutuallyExclusive,
                group_label(group),
                format!("only one of these may be set, got: {}", present.join(", ")),
            );
        }
    }

    /// Exactly one field of the group must be present.
    pub fn exactly_one_of(&mut self, group: &[(&str, bool)]) {
        let present = present_names(group);
        if present.len() != 1 {
            let got = if present.is_empty() {
                "none".to_string()
            } else {
                present.join(", ")
            };
            self.violation(
                RuleKind::ExactlyOne,
                group_label(group),
                format!("exactly one of these must be set, got: {}", got),
            );
        }
    }

    /// Either every field of the group is present, or none is.
    pub fn all_or_none(&mut self, group: &[(&str, bool)]) {
        let present = present_names(group);
        if !present.is_empty() && present.len() != group.len() {
            let missing: Vec<&str> = group
                .iter()
                .filter(|(_, set)| !set)
                .map(|(name, _)| *name)
                .collect();
            self.violation(
                RuleKind::MutuallyDependent,
                group_label(group),
                format!("must be set together, missing: {}", missing.join(", ")),
            );
        }
    }

    /// When `field` is present, `dependency` must be present too.
    pub fn requires(&mut self, field: &str, present: bool, dependency: &str, dependency_present: bool) {
        if present && !dependency_present {
            self.violation(
                RuleKind::Conditional,
                field,
                format!("requires {} to be set", dependency),
            );
        }
    }

    /// When `condition` holds, `field` must be absent.
    pub fn forbids(&mut self, field: &str, present: bool, condition: bool, reason: &str) {
        if present && condition {
            self.violation(
                RuleKind::Conditional,
                field,
                format!("is not allowed {}", reason),
            );
        }
    }

    /// Values of a collection must not repeat.
    pub fn unique<T, I>(&mut self, field: &str, values: I)
    where
        T: Eq + Hash + fmt::Display,
        I: IntoIterator<Item = T>,
    {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for value in values {
            let label = value.to_string();
            if !seen.insert(value) && !duplicates.contains(&label) {
                duplicates.push(label);
            }
        }
        if !duplicates.is_empty() {
            self.violation(
                RuleKind::Unique,
                field,
                format!("duplicate values: {}", duplicates.join(", ")),
            );
        }
    }

    /// Collection size must lie within `min..=max`.
    pub fn count(&mut self, field: &str, len: usize, min: usize, max: usize) {
        if len < min || len > max {
            let message = if max == usize::MAX {
                format!("needs at least {} entries, got {}", min, len)
            } else {
                format!("needs {}..={} entries, got {}", min, max, len)
            };
            self.violation(RuleKind::Count, field, message);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consume the validator, failing if any violation was recorded.
    pub fn finish(self) -> PangeaResult<()> {
        for message in &self.warnings {
            warn!("{}: {}", self.resource_type, message);
        }

        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(PangeaError::Validation(ValidationErrors {
                resource_type: self.resource_type,
                violations: self.violations,
            }))
        }
    }
}

/// Compile `pattern`, reusing the compiled form on later calls.
pub fn cached_regex(pattern: &str) -> Result<Regex, regex::Error> {
    static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

    let mut patterns = PATTERNS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }

    let re = Regex::new(pattern)?;
    patterns.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Join a parent path and a child field name.
pub fn field_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

/// Path to an element of a list field.
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn present_names<'a>(group: &[(&'a str, bool)]) -> Vec<&'a str> {
    group
        .iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| *name)
        .collect()
}

fn group_label(group: &[(&str, bool)]) -> String {
    group
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_passes() {
        let v = Validator::new("aws_vpc");
        assert!(v.is_valid());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_exactly_one_of_reports_none() {
        let mut v = Validator::new("aws_iam_role");
        v.exactly_one_of(&[("name", false), ("name_prefix", false)]);
        let err = v.finish().unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_rule(RuleKind::ExactlyOne));
        assert!(err.to_string().contains("exactly_one"));
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_at_most_one_of_allows_none() {
        let mut v = Validator::new("aws_s3_bucket");
        v.at_most_one_of(&[("bucket", false), ("bucket_prefix", false)]);
        assert!(v.is_valid());

        v.at_most_one_of(&[("bucket", true), ("bucket_prefix", true)]);
        assert_eq!(v.violations()[0].rule, RuleKind::MutuallyExclusive);
        assert_eq!(v.violations()[0].field, "bucket, bucket_prefix");
    }

    #[test]
    fn test_all_or_none() {
        let mut v = Validator::new("aws_cloudwatch_metric_alarm");
        v.all_or_none(&[("metric_name", true), ("namespace", false), ("period", true)]);
        assert_eq!(v.violations().len(), 1);
        assert!(v.violations()[0].message.contains("namespace"));

        let mut v = Validator::new("aws_cloudwatch_metric_alarm");
        v.all_or_none(&[("metric_name", false), ("namespace", false)]);
        assert!(v.is_valid());
    }

    #[test]
    fn test_range_and_length() {
        let mut v = Validator::new("aws_lb_target_group");
        v.range("port", 70000u32, 1, 65535);
        v.range("port", 443u32, 1, 65535);
        v.length("name", "this-name-is-definitely-longer-than-32", 1, 32);
        assert_eq!(v.violations().len(), 2);
        assert_eq!(v.violations()[0].rule, RuleKind::Range);
        assert_eq!(v.violations()[1].rule, RuleKind::Length);
    }

    #[test]
    fn test_format_or_ref_accepts_interpolation() {
        let mut v = Validator::new("aws_subnet");
        v.format_or_ref("vpc_id", "${aws_vpc.main.id}", r"^vpc-[0-9a-f]+$", "a VPC id");
        v.format_or_ref("vpc_id", "vpc-0abc", r"^vpc-[0-9a-f]+$", "a VPC id");
        assert!(v.is_valid());

        v.format_or_ref("vpc_id", "subnet-123", r"^vpc-[0-9a-f]+$", "a VPC id");
        assert_eq!(v.violations()[0].rule, RuleKind::Format);
    }

    #[test]
    fn test_unique_reports_each_duplicate_once() {
        let mut v = Validator::new("aws_wafv2_web_acl");
        v.unique("rule.priority", vec![1, 2, 1, 1, 3, 2]);
        assert_eq!(v.violations().len(), 1);
        assert!(v.violations()[0].message.ends_with("1, 2"));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut v = Validator::new("aws_wafv2_web_acl");
        v.warning("capacity is high");
        assert_eq!(v.warnings().len(), 1);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_cached_regex() {
        let first = cached_regex(r"^sg-[0-9a-f]+$").unwrap();
        let second = cached_regex(r"^sg-[0-9a-f]+$").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(second.is_match("sg-0abc"));
        assert!(cached_regex("(unclosed").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut v = Validator::new("aws_s3_bucket");
        v.format("bucket", "logs", "(unclosed", "a bucket name");
        assert!(v.violations()[0].message.starts_with("invalid pattern"));
    }

    #[test]
    fn test_paths() {
        assert_eq!(field_path("", "statement"), "statement");
        assert_eq!(field_path(&index_path("rule", 2), "statement"), "rule[2].statement");
    }
}
