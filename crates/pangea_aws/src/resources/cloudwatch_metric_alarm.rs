//! `aws_cloudwatch_metric_alarm`
//!
//! An alarm watches either a single metric (`metric_name`, `namespace`,
//! `period` and a statistic) or a metric math query list. The two modes are
//! mutually exclusive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pangea_core::validation::{field_path, index_path};
use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::types::{validate_arn, validate_tags, Tags};

const QUERY_ID_PATTERN: &str = r"^[a-z][a-zA-Z0-9_]*$";
const EXTENDED_STATISTIC_PATTERN: &str = r"^(p|tm|wm|tc|ts)(\d{1,2}(\.\d+)?|100)$";

const MAX_ACTIONS: usize = 5;
const MAX_QUERIES: usize = 20;

const STANDARD_METRIC_PRICE: f64 = 0.10;
const HIGH_RESOLUTION_METRIC_PRICE: f64 = 0.30;
const ANOMALY_DETECTION_MULTIPLIER: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
    LessThanLowerOrGreaterThanUpperThreshold,
    LessThanLowerThreshold,
    GreaterThanUpperThreshold,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
            ComparisonOperator::GreaterThanThreshold => "GreaterThanThreshold",
            ComparisonOperator::LessThanThreshold => "LessThanThreshold",
            ComparisonOperator::LessThanOrEqualToThreshold => "LessThanOrEqualToThreshold",
            ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold => {
                "LessThanLowerOrGreaterThanUpperThreshold"
            }
            ComparisonOperator::LessThanLowerThreshold => "LessThanLowerThreshold",
            ComparisonOperator::GreaterThanUpperThreshold => "GreaterThanUpperThreshold",
        }
    }

    /// Compares against an anomaly detection band rather than a static threshold.
    pub fn is_anomaly_band(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold
                | ComparisonOperator::LessThanLowerThreshold
                | ComparisonOperator::GreaterThanUpperThreshold
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    SampleCount,
    Average,
    Sum,
    Minimum,
    Maximum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::SampleCount => "SampleCount",
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    #[default]
    Missing,
    Ignore,
    Breaching,
    NotBreaching,
}

impl TreatMissingData {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatMissingData::Missing => "missing",
            TreatMissingData::Ignore => "ignore",
            TreatMissingData::Breaching => "breaching",
            TreatMissingData::NotBreaching => "notBreaching",
        }
    }
}

/// A metric referenced from a metric math query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryMetric {
    pub metric_name: String,
    pub namespace: String,
    pub period: u32,
    pub stat: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricQuery {
    pub id: String,
    pub expression: Option<String>,
    pub label: Option<String>,
    #[serde(default)]
    pub return_data: bool,
    pub period: Option<u32>,
    pub account_id: Option<String>,
    pub metric: Option<QueryMetric>,
}

impl MetricQuery {
    fn validate(&self, v: &mut Validator, path: &str) {
        v.format(&field_path(path, "id"), &self.id, QUERY_ID_PATTERN, "a lowercase query id");

        let expression = field_path(path, "expression");
        let metric = field_path(path, "metric");
        v.exactly_one_of(&[
            (expression.as_str(), self.expression.is_some()),
            (metric.as_str(), self.metric.is_some()),
        ]);

        if let Some(e) = &self.expression {
            v.length(&expression, e, 1, 2048);
        }
        if let Some(period) = self.period {
            validate_period(v, &field_path(path, "period"), period);
        }
        if let Some(m) = &self.metric {
            v.not_blank(&field_path(&metric, "metric_name"), &m.metric_name);
            v.not_blank(&field_path(&metric, "namespace"), &m.namespace);
            v.not_blank(&field_path(&metric, "stat"), &m.stat);
            validate_period(v, &field_path(&metric, "period"), m.period);
        }
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("id", self.id.as_str())
            .opt_str("expression", self.expression.as_ref())
            .opt_str("label", self.label.as_ref())
            .attr("return_data", self.return_data)
            .opt("period", self.period)
            .opt_str("account_id", self.account_id.as_ref())
            .opt_block(
                "metric",
                self.metric.as_ref().map(|m| {
                    Block::new()
                        .attr("metric_name", m.metric_name.as_str())
                        .attr("namespace", m.namespace.as_str())
                        .attr("period", m.period)
                        .attr("stat", m.stat.as_str())
                        .opt_str("unit", m.unit.as_ref())
                        .map("dimensions", &m.dimensions)
                }),
            )
    }
}

/// Periods must be 10, 30, or a multiple of 60 seconds.
fn validate_period(v: &mut Validator, field: &str, period: u32) {
    v.check(
        period == 10 || period == 30 || (period >= 60 && period % 60 == 0),
        RuleKind::Range,
        field,
        format!("{} must be 10, 30 or a multiple of 60", period),
    );
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloudwatchMetricAlarmAttributes {
    pub alarm_name: String,
    pub alarm_description: Option<String>,
    pub comparison_operator: ComparisonOperator,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: Option<u32>,
    pub threshold: Option<f64>,
    pub threshold_metric_id: Option<String>,
    pub metric_name: Option<String>,
    pub namespace: Option<String>,
    pub period: Option<u32>,
    pub statistic: Option<Statistic>,
    pub extended_statistic: Option<String>,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    pub unit: Option<String>,
    #[serde(default)]
    pub metric_query: Vec<MetricQuery>,
    #[serde(default)]
    pub treat_missing_data: TreatMissingData,
    pub evaluate_low_sample_count_percentiles: Option<String>,
    #[serde(default = "default_actions_enabled")]
    pub actions_enabled: bool,
    #[serde(default)]
    pub alarm_actions: Vec<String>,
    #[serde(default)]
    pub ok_actions: Vec<String>,
    #[serde(default)]
    pub insufficient_data_actions: Vec<String>,
    #[serde(default)]
    pub tags: Tags,
}

fn default_actions_enabled() -> bool {
    true
}

impl CloudwatchMetricAlarmAttributes {
    /// Watches a single metric rather than a query list.
    pub fn is_single_metric(&self) -> bool {
        self.metric_name.is_some()
            || self.namespace.is_some()
            || self.period.is_some()
            || self.statistic.is_some()
            || self.extended_statistic.is_some()
    }

    fn periods(&self) -> Vec<u32> {
        if self.metric_query.is_empty() {
            self.period.into_iter().collect()
        } else {
            self.metric_query
                .iter()
                .filter_map(|q| q.metric.as_ref().map(|m| m.period).or(q.period))
                .collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudwatchMetricAlarmComputed {
    pub uses_metric_math: bool,
    pub is_anomaly_detection: bool,
    pub is_high_resolution: bool,
    pub metric_count: usize,
    pub has_actions: bool,
    pub monthly_cost: f64,
}

impl ComputedProperties for CloudwatchMetricAlarmComputed {
    fn estimated_monthly_cost(&self) -> Option<f64> {
        Some(self.monthly_cost)
    }
}

impl ResourceAttributes for CloudwatchMetricAlarmAttributes {
    const RESOURCE_TYPE: &'static str = "aws_cloudwatch_metric_alarm";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "alarm_name"];

    type Computed = CloudwatchMetricAlarmComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        v.length("alarm_name", &self.alarm_name, 1, 255);
        if let Some(description) = &self.alarm_description {
            v.length("alarm_description", description, 0, 1024);
        }

        v.check(
            self.evaluation_periods >= 1,
            RuleKind::Range,
            "evaluation_periods",
            "must be at least 1",
        );
        if let Some(datapoints) = self.datapoints_to_alarm {
            v.range("datapoints_to_alarm", datapoints, 1, self.evaluation_periods.max(1));
        }

        v.exactly_one_of(&[
            ("threshold", self.threshold.is_some()),
            ("threshold_metric_id", self.threshold_metric_id.is_some()),
        ]);
        let anomaly = self.comparison_operator.is_anomaly_band();
        v.requires(
            "comparison_operator",
            anomaly,
            "threshold_metric_id",
            self.threshold_metric_id.is_some(),
        );
        v.forbids(
            "threshold_metric_id",
            self.threshold_metric_id.is_some(),
            !anomaly,
            "with a static threshold comparison",
        );

        let single = self.is_single_metric();
        let math = !self.metric_query.is_empty();
        v.exactly_one_of(&[("metric_name", single), ("metric_query", math)]);

        if single && !math {
            v.required("metric_name", self.metric_name.is_some());
            v.required("namespace", self.namespace.is_some());
            v.required("period", self.period.is_some());
            v.exactly_one_of(&[
                ("statistic", self.statistic.is_some()),
                ("extended_statistic", self.extended_statistic.is_some()),
            ]);
        }
        if math {
            v.forbids("dimensions", !self.dimensions.is_empty(), true, "with metric_query");
            v.forbids("unit", self.unit.is_some(), true, "with metric_query");
        }

        if let Some(period) = self.period {
            validate_period(&mut v, "period", period);
        }
        if let Some(extended) = &self.extended_statistic {
            v.format("extended_statistic", extended, EXTENDED_STATISTIC_PATTERN, "a percentile statistic");
        }
        if let Some(evaluate) = &self.evaluate_low_sample_count_percentiles {
            v.one_of("evaluate_low_sample_count_percentiles", evaluate, &["evaluate", "ignore"]);
            let percentile = self
                .extended_statistic
                .as_deref()
                .map(|s| s.starts_with('p'))
                .unwrap_or(false);
            v.forbids(
                "evaluate_low_sample_count_percentiles",
                true,
                !percentile,
                "without a percentile extended_statistic",
            );
        }

        if math {
            v.count("metric_query", self.metric_query.len(), 1, MAX_QUERIES);
            v.unique("metric_query.id", self.metric_query.iter().map(|q| q.id.as_str()));
            for (i, query) in self.metric_query.iter().enumerate() {
                query.validate(&mut v, &index_path("metric_query", i));
            }

            let returning = self.metric_query.iter().filter(|q| q.return_data).count();
            v.check(
                returning == 1,
                RuleKind::ExactlyOne,
                "metric_query.return_data",
                format!("exactly one query must set return_data, got {}", returning),
            );

            if let Some(id) = &self.threshold_metric_id {
                v.check(
                    self.metric_query.iter().any(|q| &q.id == id),
                    RuleKind::Conditional,
                    "threshold_metric_id",
                    format!("'{}' does not name a metric_query id", id),
                );
            }
        }

        for (field, actions) in [
            ("alarm_actions", &self.alarm_actions),
            ("ok_actions", &self.ok_actions),
            ("insufficient_data_actions", &self.insufficient_data_actions),
        ] {
            v.count(field, actions.len(), 0, MAX_ACTIONS);
            for (i, arn) in actions.iter().enumerate() {
                validate_arn(&mut v, &index_path(field, i), arn);
            }
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("alarm_name", self.alarm_name.as_str())
            .opt_str("alarm_description", self.alarm_description.as_ref())
            .attr("comparison_operator", self.comparison_operator.as_str())
            .attr("evaluation_periods", self.evaluation_periods)
            .opt("datapoints_to_alarm", self.datapoints_to_alarm)
            .opt("threshold", self.threshold)
            .opt_str("threshold_metric_id", self.threshold_metric_id.as_ref())
            .opt_str("metric_name", self.metric_name.as_ref())
            .opt_str("namespace", self.namespace.as_ref())
            .opt("period", self.period)
            .opt("statistic", self.statistic.map(|s| s.as_str()))
            .opt_str("extended_statistic", self.extended_statistic.as_ref())
            .map("dimensions", &self.dimensions)
            .opt_str("unit", self.unit.as_ref())
            .blocks("metric_query", self.metric_query.iter().map(MetricQuery::to_block))
            .attr("treat_missing_data", self.treat_missing_data.as_str())
            .opt_str(
                "evaluate_low_sample_count_percentiles",
                self.evaluate_low_sample_count_percentiles.as_ref(),
            )
            .attr("actions_enabled", self.actions_enabled)
            .list("alarm_actions", self.alarm_actions.iter().map(String::as_str))
            .list("ok_actions", self.ok_actions.iter().map(String::as_str))
            .list(
                "insufficient_data_actions",
                self.insufficient_data_actions.iter().map(String::as_str),
            )
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let uses_metric_math = !self.metric_query.is_empty();
        let is_anomaly_detection = self.comparison_operator.is_anomaly_band();
        let is_high_resolution = self.periods().iter().any(|p| *p < 60);

        let metric_count = if uses_metric_math {
            self.metric_query.iter().filter(|q| q.metric.is_some()).count().max(1)
        } else {
            1
        };

        let rate = if is_high_resolution {
            HIGH_RESOLUTION_METRIC_PRICE
        } else {
            STANDARD_METRIC_PRICE
        };
        let multiplier = if is_anomaly_detection {
            ANOMALY_DETECTION_MULTIPLIER
        } else {
            1.0
        };

        CloudwatchMetricAlarmComputed {
            uses_metric_math,
            is_anomaly_detection,
            is_high_resolution,
            metric_count,
            has_actions: !self.alarm_actions.is_empty()
                || !self.ok_actions.is_empty()
                || !self.insufficient_data_actions.is_empty(),
            monthly_cost: rate * metric_count as f64 * multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn cpu_alarm() -> Value {
        json!({
            "alarm_name": "high-cpu",
            "comparison_operator": "GreaterThanThreshold",
            "evaluation_periods": 3,
            "datapoints_to_alarm": 2,
            "threshold": 80.0,
            "metric_name": "CPUUtilization",
            "namespace": "AWS/EC2",
            "period": 300,
            "statistic": "Average",
            "dimensions": { "InstanceId": "i-0123456789abcdef0" },
            "alarm_actions": ["arn:aws:sns:us-east-1:123456789012:alerts"]
        })
    }

    fn anomaly_alarm() -> Value {
        json!({
            "alarm_name": "latency-anomaly",
            "comparison_operator": "GreaterThanUpperThreshold",
            "evaluation_periods": 2,
            "threshold_metric_id": "band",
            "metric_query": [
                {
                    "id": "m1",
                    "return_data": true,
                    "metric": {
                        "metric_name": "Latency",
                        "namespace": "AWS/ApplicationELB",
                        "period": 60,
                        "stat": "p99"
                    }
                },
                { "id": "band", "expression": "ANOMALY_DETECTION_BAND(m1, 2)", "label": "expected" }
            ]
        })
    }

    #[test]
    fn test_single_metric_alarm() {
        let alarm = CloudwatchMetricAlarmAttributes::from_value(cpu_alarm()).unwrap();
        assert_eq!(alarm.treat_missing_data, TreatMissingData::Missing);
        assert!(alarm.actions_enabled);

        let computed = alarm.computed();
        assert!(!computed.uses_metric_math);
        assert!(!computed.is_high_resolution);
        assert!(computed.has_actions);
        assert_eq!(computed.metric_count, 1);
        assert_eq!(computed.estimated_monthly_cost(), Some(0.10));
    }

    #[test]
    fn test_anomaly_alarm_costs_triple() {
        let alarm = CloudwatchMetricAlarmAttributes::from_value(anomaly_alarm()).unwrap();
        let computed = alarm.computed();
        assert!(computed.uses_metric_math);
        assert!(computed.is_anomaly_detection);
        assert_eq!(computed.metric_count, 1);
        let cost = computed.estimated_monthly_cost().unwrap();
        assert!((cost - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut value = anomaly_alarm();
        value["metric_name"] = json!("Latency");
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("metric_name, metric_query"));
        assert!(errors.has_rule(RuleKind::ExactlyOne));
    }

    #[test]
    fn test_single_metric_needs_statistic() {
        let mut value = cpu_alarm();
        value.as_object_mut().unwrap().remove("statistic");
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        assert!(err
            .validation_errors()
            .unwrap()
            .has_field("statistic, extended_statistic"));
    }

    #[test]
    fn test_anomaly_requires_threshold_metric_id() {
        let mut value = anomaly_alarm();
        let map = value.as_object_mut().unwrap();
        map.remove("threshold_metric_id");
        map.insert("threshold".to_string(), json!(1.0));
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("comparison_operator"));
        assert!(errors.has_rule(RuleKind::Conditional));
    }

    #[test]
    fn test_threshold_metric_id_must_name_query() {
        let mut value = anomaly_alarm();
        value["threshold_metric_id"] = json!("missing");
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("threshold_metric_id"));
    }

    #[test]
    fn test_exactly_one_query_returns_data() {
        let mut value = anomaly_alarm();
        value["metric_query"][1]["return_data"] = json!(true);
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("metric_query.return_data"));
    }

    #[test]
    fn test_period_and_datapoints() {
        let mut value = cpu_alarm();
        value["period"] = json!(45);
        value["datapoints_to_alarm"] = json!(5);
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("period"));
        assert!(errors.has_field("datapoints_to_alarm"));
    }

    #[test]
    fn test_low_sample_evaluation_needs_percentile() {
        let mut value = cpu_alarm();
        value["evaluate_low_sample_count_percentiles"] = json!("ignore");
        let err = CloudwatchMetricAlarmAttributes::from_value(value.clone()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("evaluate_low_sample_count_percentiles"));
        assert!(errors.has_rule(RuleKind::Conditional));

        let object = value.as_object_mut().unwrap();
        object.remove("statistic");
        object.insert("extended_statistic".to_string(), json!("p95"));
        assert!(CloudwatchMetricAlarmAttributes::from_value(value).is_ok());
    }

    #[test]
    fn test_action_lists_capped() {
        let topic = "arn:aws:sns:us-east-1:123456789012:alerts";
        let mut value = cpu_alarm();
        value["ok_actions"] = json!(vec![topic; 6]);
        let err = CloudwatchMetricAlarmAttributes::from_value(value).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("ok_actions"));
        assert!(errors.has_rule(RuleKind::Count));
    }

    #[test]
    fn test_high_resolution_cost() {
        let mut value = cpu_alarm();
        value["period"] = json!(10);
        let alarm = CloudwatchMetricAlarmAttributes::from_value(value).unwrap();
        assert!(alarm.computed().is_high_resolution);
        assert_eq!(alarm.computed().estimated_monthly_cost(), Some(0.30));
    }

    #[test]
    fn test_block_round_trip() {
        for value in [cpu_alarm(), anomaly_alarm()] {
            let alarm = CloudwatchMetricAlarmAttributes::from_value(value).unwrap();
            let block = alarm.to_block().into_value();
            assert_eq!(block["treat_missing_data"], json!("missing"));
            assert_eq!(CloudwatchMetricAlarmAttributes::from_value(block).unwrap(), alarm);
        }
    }
}
