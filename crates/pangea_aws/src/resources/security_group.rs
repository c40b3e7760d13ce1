//! `aws_security_group`
//!
//! Inline `ingress` and `egress` rules are emitted with every argument
//! present, including empty lists, since Terraform's JSON syntax requires
//! them for these attribute-as-block fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pangea_core::validation::{field_path, index_path};
use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::types::{validate_cidr_list, validate_name_or_prefix, validate_resource_id, validate_tags, Tags};

pub const DEFAULT_DESCRIPTION: &str = "Managed by Pangea";

const PROTOCOLS: &[&str] = &["-1", "tcp", "udp", "icmp", "icmpv6", "all"];
const PORT_RANGE_PROTOCOLS: &[&str] = &["tcp", "udp", "6", "17"];
const ICMP_PROTOCOLS: &[&str] = &["icmp", "icmpv6", "1", "58"];
const INTERNET_V4: &str = "0.0.0.0/0";
const INTERNET_V6: &str = "::/0";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityGroupRule {
    pub from_port: i32,
    pub to_port: i32,
    pub protocol: String,
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
    #[serde(default)]
    pub ipv6_cidr_blocks: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub prefix_list_ids: Vec<String>,
    #[serde(default, rename = "self")]
    pub self_referencing: bool,
    #[serde(default)]
    pub description: String,
}

impl SecurityGroupRule {
    /// A TCP rule for a single port.
    pub fn tcp(port: i32) -> Self {
        Self {
            from_port: port,
            to_port: port,
            protocol: "tcp".to_string(),
            ..Self::default()
        }
    }

    /// A rule matching all traffic.
    pub fn all_traffic() -> Self {
        Self {
            protocol: "-1".to_string(),
            ..Self::default()
        }
    }

    pub fn with_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.cidr_blocks.push(cidr.into());
        self
    }

    pub fn is_all_traffic(&self) -> bool {
        self.protocol == "-1" || self.protocol == "all"
    }

    pub fn is_icmp(&self) -> bool {
        ICMP_PROTOCOLS.contains(&self.protocol.as_str())
    }

    /// TCP and UDP rules treat `from_port..=to_port` as a port range.
    pub fn has_port_range(&self) -> bool {
        PORT_RANGE_PROTOCOLS.contains(&self.protocol.as_str())
    }

    /// Open to any IPv4 or IPv6 address.
    pub fn is_open_to_internet(&self) -> bool {
        self.cidr_blocks.iter().any(|c| c == INTERNET_V4)
            || self.ipv6_cidr_blocks.iter().any(|c| c == INTERNET_V6)
    }

    /// Whether this rule admits TCP traffic on `port`.
    pub fn covers_tcp_port(&self, port: i32) -> bool {
        self.is_all_traffic()
            || ((self.protocol == "tcp" || self.protocol == "6")
                && self.from_port <= port
                && port <= self.to_port)
    }

    fn validate(&self, v: &mut Validator, path: &str) {
        let protocol = field_path(path, "protocol");
        if self.protocol.parse::<u8>().is_err() {
            v.one_of(&protocol, &self.protocol, PROTOCOLS);
        }

        if self.is_icmp() {
            // ICMP rules carry the message type and code in the port fields.
            v.range(&field_path(path, "from_port"), self.from_port, -1, 255);
            v.range(&field_path(path, "to_port"), self.to_port, -1, 255);
        } else {
            v.range(&field_path(path, "from_port"), self.from_port, -1, 65535);
            v.range(&field_path(path, "to_port"), self.to_port, -1, 65535);
        }
        if self.has_port_range() {
            v.check(
                self.from_port <= self.to_port,
                RuleKind::Range,
                &field_path(path, "from_port"),
                format!("from_port {} is greater than to_port {}", self.from_port, self.to_port),
            );
        }
        if self.is_all_traffic() {
            v.check(
                self.from_port == 0 && self.to_port == 0,
                RuleKind::Range,
                &field_path(path, "from_port"),
                "all-traffic rules must use from_port = 0 and to_port = 0",
            );
        }

        let has_source = !self.cidr_blocks.is_empty()
            || !self.ipv6_cidr_blocks.is_empty()
            || !self.security_groups.is_empty()
            || !self.prefix_list_ids.is_empty()
            || self.self_referencing;
        v.check(
            has_source,
            RuleKind::Required,
            path,
            "needs at least one of cidr_blocks, ipv6_cidr_blocks, security_groups, prefix_list_ids or self",
        );

        validate_cidr_list(v, &field_path(path, "cidr_blocks"), &self.cidr_blocks);
        for (i, group) in self.security_groups.iter().enumerate() {
            validate_resource_id(v, &index_path(&field_path(path, "security_groups"), i), group, "sg");
        }
        v.length(&field_path(path, "description"), &self.description, 0, 255);
    }

    fn to_block(&self) -> Block {
        let strings = |values: &[String]| Value::from(values.to_vec());
        Block::new()
            .attr("from_port", self.from_port)
            .attr("to_port", self.to_port)
            .attr("protocol", self.protocol.as_str())
            .attr("cidr_blocks", strings(&self.cidr_blocks))
            .attr("ipv6_cidr_blocks", strings(&self.ipv6_cidr_blocks))
            .attr("security_groups", strings(&self.security_groups))
            .attr("prefix_list_ids", strings(&self.prefix_list_ids))
            .attr("self", self.self_referencing)
            .attr("description", self.description.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityGroupAttributes {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    #[serde(default = "default_description")]
    pub description: String,
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub ingress: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub egress: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub revoke_rules_on_delete: bool,
    #[serde(default)]
    pub tags: Tags,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl Default for SecurityGroupAttributes {
    fn default() -> Self {
        Self {
            name: None,
            name_prefix: None,
            description: default_description(),
            vpc_id: None,
            ingress: Vec::new(),
            egress: Vec::new(),
            revoke_rules_on_delete: false,
            tags: Tags::new(),
        }
    }
}

/// An ingress port range reachable from the internet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPortRange {
    pub protocol: String,
    pub from_port: i32,
    pub to_port: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityGroupComputed {
    pub ingress_rule_count: usize,
    pub egress_rule_count: usize,
    pub open_ingress_ports: Vec<OpenPortRange>,
    pub allows_ssh_from_internet: bool,
    pub allows_all_ingress_from_internet: bool,
}

impl ComputedProperties for SecurityGroupComputed {}

impl ResourceAttributes for SecurityGroupAttributes {
    const RESOURCE_TYPE: &'static str = "aws_security_group";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "name", "owner_id"];

    type Computed = SecurityGroupComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_name_or_prefix(
            &mut v,
            ("name", self.name.as_ref()),
            ("name_prefix", self.name_prefix.as_ref()),
        );
        for (field, value) in [("name", &self.name), ("name_prefix", &self.name_prefix)] {
            if let Some(value) = value {
                v.length(field, value, 1, 255);
                v.check(
                    !value.starts_with("sg-"),
                    RuleKind::Format,
                    field,
                    "must not start with 'sg-'",
                );
            }
        }
        v.length("description", &self.description, 1, 255);

        if let Some(vpc_id) = &self.vpc_id {
            validate_resource_id(&mut v, "vpc_id", vpc_id, "vpc");
        }

        for (i, rule) in self.ingress.iter().enumerate() {
            rule.validate(&mut v, &index_path("ingress", i));
        }
        for (i, rule) in self.egress.iter().enumerate() {
            rule.validate(&mut v, &index_path("egress", i));
        }

        if self.ingress.iter().any(|r| r.is_open_to_internet() && r.covers_tcp_port(22)) {
            v.warning("ingress allows SSH from the internet");
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("name", self.name.as_ref())
            .opt_str("name_prefix", self.name_prefix.as_ref())
            .attr("description", self.description.as_str())
            .opt_str("vpc_id", self.vpc_id.as_ref())
            .blocks("ingress", self.ingress.iter().map(SecurityGroupRule::to_block))
            .blocks("egress", self.egress.iter().map(SecurityGroupRule::to_block))
            .attr("revoke_rules_on_delete", self.revoke_rules_on_delete)
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let open: Vec<&SecurityGroupRule> = self
            .ingress
            .iter()
            .filter(|r| r.is_open_to_internet())
            .collect();

        SecurityGroupComputed {
            ingress_rule_count: self.ingress.len(),
            egress_rule_count: self.egress.len(),
            open_ingress_ports: open
                .iter()
                .map(|r| OpenPortRange {
                    protocol: r.protocol.clone(),
                    from_port: r.from_port,
                    to_port: r.to_port,
                })
                .collect(),
            allows_ssh_from_internet: open.iter().any(|r| r.covers_tcp_port(22)),
            allows_all_ingress_from_internet: open.iter().any(|r| r.is_all_traffic()),
        }
    }
}
