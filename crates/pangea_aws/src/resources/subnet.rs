//! `aws_subnet`

use serde::{Deserialize, Serialize};

use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, Validator};

use crate::resources::vpc::{MAX_NETMASK, MIN_NETMASK};
use crate::types::{validate_cidr, validate_resource_id, validate_tags, Ipv4Cidr, Tags};

const AZ_PATTERN: &str = r"^[a-z]{2}(-gov)?-[a-z]+-\d[a-z]$";
const AZ_ID_PATTERN: &str = r"^[a-z]{3,4}\d-az\d+$";

/// Addresses AWS holds back in every subnet: network, router, DNS, future use, broadcast.
pub const RESERVED_ADDRESSES: u64 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubnetAttributes {
    pub vpc_id: String,
    pub cidr_block: String,
    pub ipv6_cidr_block: Option<String>,
    pub availability_zone: Option<String>,
    pub availability_zone_id: Option<String>,
    #[serde(default)]
    pub map_public_ip_on_launch: bool,
    #[serde(default)]
    pub assign_ipv6_address_on_creation: bool,
    #[serde(default)]
    pub tags: Tags,
}

impl SubnetAttributes {
    pub fn new(vpc_id: impl Into<String>, cidr_block: impl Into<String>) -> Self {
        Self {
            vpc_id: vpc_id.into(),
            cidr_block: cidr_block.into(),
            ipv6_cidr_block: None,
            availability_zone: None,
            availability_zone_id: None,
            map_public_ip_on_launch: false,
            assign_ipv6_address_on_creation: false,
            tags: Tags::new(),
        }
    }

    pub fn with_availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = Some(zone.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.map_public_ip_on_launch = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubnetComputed {
    pub is_public: bool,
    pub address_count: Option<u64>,
    pub usable_address_count: Option<u64>,
    pub has_ipv6: bool,
}

impl ComputedProperties for SubnetComputed {}

impl ResourceAttributes for SubnetAttributes {
    const RESOURCE_TYPE: &'static str = "aws_subnet";
    const OUTPUTS: &'static [&'static str] =
        &["id", "arn", "availability_zone", "cidr_block", "vpc_id"];

    type Computed = SubnetComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_resource_id(&mut v, "vpc_id", &self.vpc_id, "vpc");
        validate_cidr(&mut v, "cidr_block", &self.cidr_block, MIN_NETMASK, MAX_NETMASK);

        v.at_most_one_of(&[
            ("availability_zone", self.availability_zone.is_some()),
            ("availability_zone_id", self.availability_zone_id.is_some()),
        ]);
        if let Some(zone) = &self.availability_zone {
            v.format_or_ref("availability_zone", zone, AZ_PATTERN, "an availability zone name");
        }
        if let Some(zone_id) = &self.availability_zone_id {
            v.format_or_ref("availability_zone_id", zone_id, AZ_ID_PATTERN, "an availability zone id");
        }

        v.requires(
            "assign_ipv6_address_on_creation",
            self.assign_ipv6_address_on_creation,
            "ipv6_cidr_block",
            self.ipv6_cidr_block.is_some(),
        );

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .attr("vpc_id", self.vpc_id.as_str())
            .attr("cidr_block", self.cidr_block.as_str())
            .opt_str("ipv6_cidr_block", self.ipv6_cidr_block.as_ref())
            .opt_str("availability_zone", self.availability_zone.as_ref())
            .opt_str("availability_zone_id", self.availability_zone_id.as_ref())
            .attr("map_public_ip_on_launch", self.map_public_ip_on_launch)
            .attr(
                "assign_ipv6_address_on_creation",
                self.assign_ipv6_address_on_creation,
            )
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let size = Ipv4Cidr::parse(&self.cidr_block).map(|c| c.size());
        SubnetComputed {
            is_public: self.map_public_ip_on_launch,
            address_count: size,
            usable_address_count: size.map(|s| s.saturating_sub(RESERVED_ADDRESSES)),
            has_ipv6: self.ipv6_cidr_block.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pangea_core::RuleKind;
    use serde_json::json;

    #[test]
    fn test_subnet_in_referenced_vpc() {
        let subnet = SubnetAttributes::from_value(json!({
            "vpc_id": "${aws_vpc.main.id}",
            "cidr_block": "10.0.1.0/24",
            "availability_zone": "us-east-1a"
        }))
        .unwrap();

        let computed = subnet.computed();
        assert!(!computed.is_public);
        assert_eq!(computed.address_count, Some(256));
        assert_eq!(computed.usable_address_count, Some(251));
    }

    #[test]
    fn test_vpc_id_format() {
        let err = SubnetAttributes::new("subnet-123", "10.0.1.0/24").validate().unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("vpc_id"));
        assert!(SubnetAttributes::new("vpc-0a1b2c3d", "10.0.1.0/24").validate().is_ok());
    }

    #[test]
    fn test_zone_and_zone_id_exclusive() {
        let mut subnet = SubnetAttributes::new("vpc-0a1b2c3d", "10.0.1.0/24").with_availability_zone("eu-west-1b");
        subnet.availability_zone_id = Some("euw1-az2".to_string());
        let err = subnet.validate().unwrap_err();
        assert!(err.validation_errors().unwrap().has_rule(RuleKind::MutuallyExclusive));
    }

    #[test]
    fn test_ipv6_assignment_needs_block() {
        let mut subnet = SubnetAttributes::new("vpc-0a1b2c3d", "10.0.1.0/24");
        subnet.assign_ipv6_address_on_creation = true;
        let err = subnet.validate().unwrap_err();
        assert!(err
            .validation_errors()
            .unwrap()
            .has_field("assign_ipv6_address_on_creation"));
    }

    #[test]
    fn test_netmask_too_small() {
        let err = SubnetAttributes::new("vpc-0a1b2c3d", "10.0.1.0/29").validate().unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("cidr_block.netmask"));
    }

    #[test]
    fn test_round_trip() {
        let subnet = SubnetAttributes::new("vpc-0a1b2c3d", "10.0.2.0/24")
            .with_availability_zone("us-west-2c")
            .public();
        subnet.validate().unwrap();

        let block = subnet.to_block().into_value();
        assert_eq!(block["map_public_ip_on_launch"], json!(true));
        let parsed = SubnetAttributes::from_value(block).unwrap();
        assert_eq!(parsed, subnet);
        assert!(parsed.computed().is_public);
    }
}
