//! `aws_vpc`

use serde::{Deserialize, Serialize};

use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, Validator};

use crate::types::{validate_cidr, validate_tags, Ipv4Cidr, Tags};

pub const MIN_NETMASK: u8 = 16;
pub const MAX_NETMASK: u8 = 28;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceTenancy {
    #[default]
    Default,
    Dedicated,
}

impl InstanceTenancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceTenancy::Default => "default",
            InstanceTenancy::Dedicated => "dedicated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpcAttributes {
    pub cidr_block: Option<String>,
    pub ipv4_ipam_pool_id: Option<String>,
    pub ipv4_netmask_length: Option<u8>,
    #[serde(default)]
    pub instance_tenancy: InstanceTenancy,
    #[serde(default = "enabled")]
    pub enable_dns_support: bool,
    #[serde(default = "enabled")]
    pub enable_dns_hostnames: bool,
    #[serde(default)]
    pub assign_generated_ipv6_cidr_block: bool,
    #[serde(default)]
    pub tags: Tags,
}

fn enabled() -> bool {
    true
}

impl VpcAttributes {
    pub fn new(cidr_block: impl Into<String>) -> Self {
        Self {
            cidr_block: Some(cidr_block.into()),
            ipv4_ipam_pool_id: None,
            ipv4_netmask_length: None,
            instance_tenancy: InstanceTenancy::default(),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            assign_generated_ipv6_cidr_block: false,
            tags: Tags::new(),
        }
    }

    /// The literal CIDR block, when one was given.
    pub fn cidr(&self) -> Option<Ipv4Cidr> {
        self.cidr_block.as_deref().and_then(Ipv4Cidr::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VpcComputed {
    pub is_rfc1918: bool,
    pub address_count: Option<u64>,
    pub uses_dedicated_tenancy: bool,
    pub has_ipv6: bool,
}

impl ComputedProperties for VpcComputed {}

impl ResourceAttributes for VpcAttributes {
    const RESOURCE_TYPE: &'static str = "aws_vpc";
    const OUTPUTS: &'static [&'static str] = &[
        "id",
        "arn",
        "cidr_block",
        "default_security_group_id",
        "default_route_table_id",
        "main_route_table_id",
        "owner_id",
    ];

    type Computed = VpcComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        v.exactly_one_of(&[
            ("cidr_block", self.cidr_block.is_some()),
            ("ipv4_ipam_pool_id", self.ipv4_ipam_pool_id.is_some()),
        ]);
        v.requires(
            "ipv4_ipam_pool_id",
            self.ipv4_ipam_pool_id.is_some(),
            "ipv4_netmask_length",
            self.ipv4_netmask_length.is_some(),
        );
        v.forbids(
            "ipv4_netmask_length",
            self.ipv4_netmask_length.is_some(),
            self.ipv4_ipam_pool_id.is_none(),
            "without ipv4_ipam_pool_id",
        );
        if let Some(length) = self.ipv4_netmask_length {
            v.range("ipv4_netmask_length", length, MIN_NETMASK, MAX_NETMASK);
        }

        if let Some(block) = &self.cidr_block {
            if let Some(cidr) = validate_cidr(&mut v, "cidr_block", block, MIN_NETMASK, MAX_NETMASK) {
                if !cidr.is_private() {
                    v.warning(format!("cidr_block {} is not an RFC 1918 private range", block));
                }
            }
        }

        v.requires(
            "enable_dns_hostnames",
            self.enable_dns_hostnames,
            "enable_dns_support",
            self.enable_dns_support,
        );

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("cidr_block", self.cidr_block.as_ref())
            .opt_str("ipv4_ipam_pool_id", self.ipv4_ipam_pool_id.as_ref())
            .opt("ipv4_netmask_length", self.ipv4_netmask_length)
            .attr("instance_tenancy", self.instance_tenancy.as_str())
            .attr("enable_dns_support", self.enable_dns_support)
            .attr("enable_dns_hostnames", self.enable_dns_hostnames)
            .attr(
                "assign_generated_ipv6_cidr_block",
                self.assign_generated_ipv6_cidr_block,
            )
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let cidr = self.cidr();
        VpcComputed {
            is_rfc1918: cidr.map(|c| c.is_private()).unwrap_or(false),
            address_count: cidr
                .map(|c| c.size())
                .or_else(|| self.ipv4_netmask_length.map(|len| 1u64 << (32 - u32::from(len.min(32))))),
            uses_dedicated_tenancy: self.instance_tenancy == InstanceTenancy::Dedicated,
            has_ipv6: self.assign_generated_ipv6_cidr_block,
        }
    }
}
