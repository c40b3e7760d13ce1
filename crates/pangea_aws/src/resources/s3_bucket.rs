//! `aws_s3_bucket`

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use pangea_core::interpolation::is_interpolation;
use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::types::{validate_name_or_prefix, validate_tags, Tags};

const BUCKET_PATTERN: &str = r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$";
const PREFIX_PATTERN: &str = r"^[a-z0-9][a-z0-9.-]*$";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct S3BucketAttributes {
    pub bucket: Option<String>,
    pub bucket_prefix: Option<String>,
    #[serde(default)]
    pub force_destroy: bool,
    #[serde(default)]
    pub object_lock_enabled: bool,
    #[serde(default)]
    pub tags: Tags,
}

impl S3BucketAttributes {
    pub fn named(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct S3BucketComputed {
    pub is_dns_compatible: bool,
    pub has_object_lock: bool,
    pub has_generated_name: bool,
}

impl ComputedProperties for S3BucketComputed {}

fn validate_bucket_name(v: &mut Validator, field: &str, name: &str, max: usize, pattern: &str) {
    if is_interpolation(name) {
        return;
    }

    let min = if field == "bucket" { 3 } else { 1 };
    v.length(field, name, min, max);
    v.format(field, name, pattern, "lowercase letters, digits, dots and hyphens");
    v.check(!name.contains(".."), RuleKind::Format, field, "must not contain '..'");
    v.check(
        !name.starts_with("xn--"),
        RuleKind::Format,
        field,
        "must not start with the reserved prefix 'xn--'",
    );
    v.check(
        name.parse::<Ipv4Addr>().is_err(),
        RuleKind::Format,
        field,
        "must not be formatted as an IP address",
    );
    v.check(
        !name.ends_with("-s3alias") && !name.ends_with("--ol-s3"),
        RuleKind::Format,
        field,
        "must not use a reserved suffix",
    );
}

impl ResourceAttributes for S3BucketAttributes {
    const RESOURCE_TYPE: &'static str = "aws_s3_bucket";
    const OUTPUTS: &'static [&'static str] = &[
        "id",
        "arn",
        "bucket",
        "bucket_domain_name",
        "bucket_regional_domain_name",
        "hosted_zone_id",
        "region",
    ];

    type Computed = S3BucketComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_name_or_prefix(
            &mut v,
            ("bucket", self.bucket.as_ref()),
            ("bucket_prefix", self.bucket_prefix.as_ref()),
        );
        if let Some(bucket) = &self.bucket {
            validate_bucket_name(&mut v, "bucket", bucket, 63, BUCKET_PATTERN);
        }
        if let Some(prefix) = &self.bucket_prefix {
            validate_bucket_name(&mut v, "bucket_prefix", prefix, 37, PREFIX_PATTERN);
        }

        if self.force_destroy {
            v.warning("force_destroy deletes every object when the bucket is destroyed");
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("bucket", self.bucket.as_ref())
            .opt_str("bucket_prefix", self.bucket_prefix.as_ref())
            .attr("force_destroy", self.force_destroy)
            .attr("object_lock_enabled", self.object_lock_enabled)
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let name = self.bucket.as_ref().or(self.bucket_prefix.as_ref());
        S3BucketComputed {
            is_dns_compatible: name.map(|n| !n.contains('.')).unwrap_or(true),
            has_object_lock: self.object_lock_enabled,
            has_generated_name: self.bucket.is_none(),
        }
    }
}
