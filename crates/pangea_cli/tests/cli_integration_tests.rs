//! Integration tests driving the `pangea` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const NETWORK: &str = r#"
name: network
provider:
  region: eu-west-1
resources:
  - type: aws_vpc
    name: main
    attributes:
      cidr_block: 10.0.0.0/16
  - type: aws_subnet
    name: private_a
    attributes:
      vpc_id: ${aws_vpc.main.id}
      cidr_block: 10.0.1.0/24
outputs:
  vpc_id: ${aws_vpc.main.id}
"#;

const BROKEN: &str = r#"
name: broken
resources:
  - type: aws_vpc
    name: main
    attributes:
      cidr_block: 10.0.0.0/8
"#;

fn pangea(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pangea"))
        .current_dir(dir)
        .env_remove("PANGEA_CONFIG")
        .env_remove("PANGEA_REGION")
        .env_remove("PANGEA_PROFILE")
        .env_remove("PANGEA_OUTPUT_DIR")
        .args(args)
        .output()
        .expect("failed to run pangea")
}

#[test]
fn test_synth_writes_terraform_json() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("stacks")).unwrap();
    fs::write(temp.path().join("stacks/network.yaml"), NETWORK).unwrap();
    fs::write(
        temp.path().join("pangea.toml"),
        "output_dir = \"build\"\n\n[default_tags]\nManagedBy = \"pangea\"\n",
    )
    .unwrap();

    let output = pangea(temp.path(), &["synth", "stacks"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let written = temp.path().join("build/network.tf.json");
    let document: Value = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
    assert_eq!(document["provider"]["aws"]["region"], "eu-west-1");
    assert_eq!(
        document["provider"]["aws"]["default_tags"]["tags"]["ManagedBy"],
        "pangea"
    );
    assert_eq!(
        document["resource"]["aws_subnet"]["private_a"]["vpc_id"],
        "${aws_vpc.main.id}"
    );
}

#[test]
fn test_synth_to_stdout() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("network.yaml"), NETWORK).unwrap();

    let output = pangea(temp.path(), &["synth", "network.yaml", "--stdout"]);
    assert!(output.status.success());

    let document: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["output"]["vpc_id"]["value"], "${aws_vpc.main.id}");
    assert!(!temp.path().join("terraform").exists());
}

#[test]
fn test_synth_directory_to_stdout() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("network.yaml"), NETWORK).unwrap();
    fs::write(
        temp.path().join("storage.yaml"),
        "name: storage\nresources:\n  - type: aws_s3_bucket\n    name: logs\n",
    )
    .unwrap();

    let output = pangea(temp.path(), &["synth", ".", "--stdout"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let documents: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&String> = documents.as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["network", "storage"]);
    assert!(documents["storage"]["resource"]["aws_s3_bucket"]["logs"].is_object());
}

#[test]
fn test_synth_rejects_templates_sharing_a_name() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("stacks/eu")).unwrap();
    fs::write(temp.path().join("stacks/network.yaml"), NETWORK).unwrap();
    fs::write(temp.path().join("stacks/eu/network.yaml"), NETWORK).unwrap();

    let output = pangea(temp.path(), &["synth", "stacks"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("are both named 'network'"));
    assert!(!temp.path().join("terraform").exists());
}

#[test]
fn test_synth_rejects_path_like_template_name() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("stacks")).unwrap();
    fs::write(
        temp.path().join("stacks/escape.yaml"),
        NETWORK.replace("name: network", "name: ../escaped"),
    )
    .unwrap();

    let output = pangea(temp.path(), &["synth", "stacks", "-o", "out"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(!temp.path().join("escaped.tf.json").exists());
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_validate_failure_exit_code() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("network.yaml"), NETWORK).unwrap();
    fs::write(temp.path().join("broken.yaml"), BROKEN).unwrap();

    let output = pangea(temp.path(), &["validate", "."]);
    assert_eq!(output.status.code(), Some(3));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("broken.yaml"));
    assert!(stdout.contains("cidr_block"));
    assert!(!temp.path().join("terraform").exists());
}

#[test]
fn test_unsupported_template_exit_code() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("network.txt"), NETWORK).unwrap();

    let output = pangea(temp.path(), &["synth", "network.txt"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_bad_config_exit_code() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("network.yaml"), NETWORK).unwrap();
    fs::write(temp.path().join("pangea.toml"), "region = \"\"\n").unwrap();

    let output = pangea(temp.path(), &["validate", "network.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_resources_json_listing() {
    let temp = tempdir().unwrap();
    let output = pangea(temp.path(), &["resources", "--json"]);
    assert!(output.status.success());

    let listing: Value = serde_json::from_slice(&output.stdout).unwrap();
    let types: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["resource_type"].as_str().unwrap())
        .collect();
    assert_eq!(types.len(), 9);
    assert!(types.contains(&"aws_wafv2_web_acl"));
}

#[test]
fn test_cost_report() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("alarms.json"),
        r#"{
            "name": "alarms",
            "resources": [{
                "type": "aws_cloudwatch_metric_alarm",
                "name": "cpu",
                "attributes": {
                    "alarm_name": "cpu-high",
                    "comparison_operator": "GreaterThanThreshold",
                    "evaluation_periods": 2,
                    "threshold": 80,
                    "metric_name": "CPUUtilization",
                    "namespace": "AWS/EC2",
                    "period": 300,
                    "statistic": "Average"
                }
            }]
        }"#,
    )
    .unwrap();

    let output = pangea(temp.path(), &["cost", "alarms.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aws_cloudwatch_metric_alarm.cpu"));
    assert!(stdout.contains("Estimated monthly total: $0.10"));
}
