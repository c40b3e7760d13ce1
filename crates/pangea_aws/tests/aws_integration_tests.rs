//! Integration tests for AWS resources, the registry and synthesis.

use std::fs;
use tempfile::tempdir;

use serde_json::{json, Value};

use pangea_aws::{
    aws_provider, IamRoleAttributes, PolicyDocument, ResourceRegistry, SecurityGroupAttributes,
    SecurityGroupRule, SubnetAttributes, Tags, VpcAttributes,
};
use pangea_core::{PangeaConfig, PangeaError, ResourceAttributes, RuleKind, Synthesizer, Template};

const WEB_STACK: &str = r#"
name: web-stack
provider:
  region: us-west-2
  default_tags:
    Project: storefront
variables:
  environment:
    type: string
    default: staging
resources:
  - type: aws_vpc
    name: main
    attributes:
      cidr_block: 10.20.0.0/16
  - type: aws_subnet
    name: public_a
    attributes:
      vpc_id: ${aws_vpc.main.id}
      cidr_block: 10.20.1.0/24
      availability_zone: us-west-2a
      map_public_ip_on_launch: true
  - type: aws_security_group
    name: web
    attributes:
      name: web
      vpc_id: ${aws_vpc.main.id}
      ingress:
        - from_port: 443
          to_port: 443
          protocol: tcp
          cidr_blocks: ["0.0.0.0/0"]
  - type: aws_s3_bucket
    name: assets
    attributes:
      bucket: storefront-assets
  - type: aws_cloudwatch_metric_alarm
    name: errors
    attributes:
      alarm_name: storefront-5xx
      comparison_operator: GreaterThanThreshold
      evaluation_periods: 1
      threshold: 10
      metric_name: HTTPCode_Target_5XX_Count
      namespace: AWS/ApplicationELB
      period: 60
      statistic: Sum
outputs:
  vpc_id: ${aws_vpc.main.id}
  subnet_id:
    value: ${aws_subnet.public_a.id}
    description: Public subnet
"#;

/// Test a declaration file from disk through to a written Terraform document.
#[test]
fn test_template_file_to_terraform_json() {
    let temp = tempdir().unwrap();
    let template_path = temp.path().join("web-stack.yaml");
    fs::write(&template_path, WEB_STACK).unwrap();

    let template = Template::from_file(&template_path).unwrap();
    let config = PangeaConfig::default()
        .with_output_dir(temp.path().join("out"))
        .with_default_tag("ManagedBy", "pangea");

    let registry = ResourceRegistry::aws();
    let synth = registry.synthesize_template(&template, &config).unwrap();
    assert_eq!(synth.resource_count(), 5);

    let path = synth
        .write(&config.output_dir.join(template.output_file_name()))
        .unwrap();
    assert!(path.ends_with("out/web-stack.tf.json"));

    let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let sections: Vec<&String> = document.as_object().unwrap().keys().collect();
    assert_eq!(sections, vec!["terraform", "provider", "variable", "resource", "output"]);

    assert_eq!(document["provider"]["aws"]["region"], json!("us-west-2"));
    assert_eq!(
        document["provider"]["aws"]["default_tags"]["tags"],
        json!({ "ManagedBy": "pangea", "Project": "storefront" })
    );
    assert_eq!(document["variable"]["environment"]["default"], json!("staging"));
    assert_eq!(
        document["resource"]["aws_subnet"]["public_a"]["vpc_id"],
        json!("${aws_vpc.main.id}")
    );
    assert_eq!(
        document["resource"]["aws_security_group"]["web"]["description"],
        json!("Managed by Pangea")
    );
    assert_eq!(document["output"]["subnet_id"]["description"], json!("Public subnet"));
}

/// Test that emitted blocks parse back to the attributes that produced them.
#[test]
fn test_emitted_resources_round_trip() {
    let registry = ResourceRegistry::aws();
    let template = Template::from_yaml(WEB_STACK).unwrap();
    let synth = registry
        .synthesize_template(&template, &PangeaConfig::default())
        .unwrap();

    let subnet_block = synth.resource("aws_subnet", "public_a").unwrap().clone();
    let subnet = SubnetAttributes::from_value(subnet_block).unwrap();
    assert!(subnet.map_public_ip_on_launch);
    assert_eq!(subnet.availability_zone.as_deref(), Some("us-west-2a"));

    let group_block = synth.resource("aws_security_group", "web").unwrap().clone();
    let group = SecurityGroupAttributes::from_value(group_block).unwrap();
    assert_eq!(group.ingress[0].from_port, 443);
}

/// Test that the same input produces byte-identical output.
#[test]
fn test_synthesis_is_deterministic() {
    let registry = ResourceRegistry::aws();
    let config = PangeaConfig::default();
    let render = || {
        let template = Template::from_yaml(WEB_STACK).unwrap();
        registry
            .synthesize_template(&template, &config)
            .unwrap()
            .to_json_pretty()
            .unwrap()
    };
    assert_eq!(render(), render());
}

/// Test wiring typed resources together through references.
#[test]
fn test_typed_declarations_with_references() {
    let mut synth = Synthesizer::new();
    synth.provider(aws_provider("us-east-1", Some("sandbox"), &Tags::new()));

    let vpc = synth.declare("main", VpcAttributes::new("10.0.0.0/16")).unwrap();
    assert_eq!(vpc.computed().address_count, Some(65536));

    let subnet = synth
        .declare(
            "private_a",
            SubnetAttributes::new(vpc.id(), "10.0.10.0/24").with_availability_zone("us-east-1a"),
        )
        .unwrap();
    assert_eq!(subnet.computed().usable_address_count, Some(251));

    let group = synth
        .declare(
            "app",
            SecurityGroupAttributes {
                name_prefix: Some("app-".to_string()),
                vpc_id: Some(vpc.id()),
                ingress: vec![SecurityGroupRule::tcp(8080).with_cidr("10.0.0.0/16")],
                ..SecurityGroupAttributes::default()
            },
        )
        .unwrap();
    assert!(!group.computed().allows_ssh_from_internet);

    let role = synth
        .declare(
            "app",
            IamRoleAttributes::new(PolicyDocument::new(json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                    "Action": "sts:AssumeRole"
                }]
            }))),
        )
        .unwrap();
    assert_eq!(role.arn(), "${aws_iam_role.app.arn}");

    let document = synth.synthesize();
    assert_eq!(
        document["resource"]["aws_subnet"]["private_a"]["vpc_id"],
        json!("${aws_vpc.main.id}")
    );
    assert_eq!(document["provider"]["aws"]["profile"], json!("sandbox"));
    assert_eq!(synth.resource_count(), 4);
}

/// Test that a template with an invalid resource reports every violation.
#[test]
fn test_template_validation_failure() {
    let template = Template::new("broken").with_resource(
        "aws_lb_target_group",
        "api",
        json!({
            "name": "-api-",
            "name_prefix": "api",
            "port": 70000,
            "protocol": "HTTP",
            "vpc_id": "vpc-0a1b2c3d"
        }),
    );

    let err = ResourceRegistry::aws()
        .synthesize_template(&template, &PangeaConfig::default())
        .unwrap_err();
    let errors = err.validation_errors().expect("validation error");
    assert_eq!(errors.resource_type, "aws_lb_target_group");
    assert!(errors.has_rule(RuleKind::MutuallyExclusive));
    assert!(errors.has_rule(RuleKind::Range));
    assert!(errors.has_rule(RuleKind::Format));
}

/// Test duplicate and unknown declarations in a template.
#[test]
fn test_template_declaration_errors() {
    let registry = ResourceRegistry::aws();
    let config = PangeaConfig::default();

    let duplicate = Template::new("dup")
        .with_resource("aws_s3_bucket", "logs", json!({}))
        .with_resource("aws_s3_bucket", "logs", json!({}));
    let err = registry.synthesize_template(&duplicate, &config).unwrap_err();
    assert!(matches!(err, PangeaError::DuplicateResource(ref a) if a == "aws_s3_bucket.logs"));

    let unknown = Template::new("unknown").with_resource("aws_lambda_function", "fn", json!({}));
    let err = registry.synthesize_template(&unknown, &config).unwrap_err();
    assert!(matches!(err, PangeaError::UnknownResourceType(_)));

    let bad_name = Template::new("bad").with_resource("aws_s3_bucket", "1logs", json!({}));
    let err = registry.synthesize_template(&bad_name, &config).unwrap_err();
    assert!(matches!(err, PangeaError::InvalidResourceName { .. }));
}

/// Test cost estimates aggregated across a web ACL and alarms.
#[test]
fn test_estimated_monthly_cost() {
    let template = Template::from_json(
        &json!({
            "name": "edge",
            "resources": [
                {
                    "type": "aws_wafv2_web_acl",
                    "name": "edge",
                    "attributes": {
                        "name": "edge",
                        "scope": "CLOUDFRONT",
                        "default_action": { "allow": {} },
                        "rule": [{
                            "name": "common",
                            "priority": 0,
                            "override_action": { "none": {} },
                            "statement": {
                                "managed_rule_group_statement": {
                                    "name": "AWSManagedRulesCommonRuleSet",
                                    "vendor_name": "AWS"
                                }
                            },
                            "visibility_config": {
                                "cloudwatch_metrics_enabled": true,
                                "metric_name": "common",
                                "sampled_requests_enabled": true
                            }
                        }],
                        "visibility_config": {
                            "cloudwatch_metrics_enabled": true,
                            "metric_name": "edge",
                            "sampled_requests_enabled": true
                        }
                    }
                },
                {
                    "type": "aws_cloudwatch_metric_alarm",
                    "name": "blocked",
                    "attributes": {
                        "alarm_name": "edge-blocked",
                        "comparison_operator": "GreaterThanThreshold",
                        "evaluation_periods": 1,
                        "threshold": 100,
                        "metric_name": "BlockedRequests",
                        "namespace": "AWS/WAFV2",
                        "period": 300,
                        "statistic": "Sum"
                    }
                },
                { "type": "aws_s3_bucket", "name": "logs" }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let synth = ResourceRegistry::aws()
        .synthesize_template(&template, &PangeaConfig::default())
        .unwrap();

    let costs: Vec<Option<f64>> = synth
        .declared()
        .iter()
        .map(|r| r.estimated_monthly_cost)
        .collect();
    assert_eq!(costs, vec![Some(7.0), Some(0.10), None]);
    assert!((synth.estimated_monthly_cost() - 7.10).abs() < 1e-9);
}
