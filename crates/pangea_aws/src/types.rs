//! Types and checks shared by AWS resources.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use pangea_core::interpolation::is_interpolation;
use pangea_core::{RuleKind, Validator};

/// Resource tags.
pub type Tags = BTreeMap<String, String>;

pub const MAX_TAGS: usize = 50;

pub const ARN_PATTERN: &str = r"^arn:aws[a-zA-Z-]*:[a-zA-Z0-9-]+:[a-z0-9-]*:(\d{12}|aws)?:.+$";

/// Validate tag count, key and value lengths, and reserved prefixes.
pub fn validate_tags(v: &mut Validator, field: &str, tags: &Tags) {
    v.count(field, tags.len(), 0, MAX_TAGS);
    for (key, value) in tags {
        let path = format!("{}.{}", field, key);
        v.length(&path, key, 1, 128);
        v.length(&path, value, 0, 256);
        v.check(
            !key.to_lowercase().starts_with("aws:"),
            RuleKind::Format,
            &path,
            "tag keys may not use the reserved 'aws:' prefix",
        );
    }
}

/// Validate an ARN, accepting interpolations.
pub fn validate_arn(v: &mut Validator, field: &str, value: &str) {
    v.format_or_ref(field, value, ARN_PATTERN, "a valid ARN");
}

/// Validate an AWS resource id such as `vpc-0abc`, accepting interpolations.
pub fn validate_resource_id(v: &mut Validator, field: &str, value: &str, prefix: &str) {
    let pattern = format!(r"^{}-[0-9a-f]{{8,17}}$", prefix);
    v.format_or_ref(field, value, &pattern, &format!("a {}- id", prefix));
}

/// Validate that `name` and `name_prefix` are not both set.
pub fn validate_name_or_prefix(
    v: &mut Validator,
    (name_field, name): (&str, Option<&String>),
    (prefix_field, prefix): (&str, Option<&String>),
) {
    v.at_most_one_of(&[(name_field, name.is_some()), (prefix_field, prefix.is_some())]);
}

/// An IPv4 network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    pub address: Ipv4Addr,
    pub prefix: u8,
}

impl Ipv4Cidr {
    pub fn parse(value: &str) -> Option<Self> {
        let (address, prefix) = value.split_once('/')?;
        let address: Ipv4Addr = address.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;
        if prefix > 32 {
            return None;
        }
        Some(Self { address, prefix })
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    /// The host bits are all zero.
    pub fn is_network_address(&self) -> bool {
        u32::from(self.address) & !self.mask() == 0
    }

    /// Inside 10/8, 172.16/12 or 192.168/16.
    pub fn is_private(&self) -> bool {
        self.address.is_private() && self.prefix >= private_prefix(self.address)
    }

    /// Whether this block lies entirely inside `other`.
    pub fn is_within(&self, other: &Ipv4Cidr) -> bool {
        self.prefix >= other.prefix
            && (u32::from(self.address) & other.mask()) == (u32::from(other.address) & other.mask())
    }
}

fn private_prefix(address: Ipv4Addr) -> u8 {
    match address.octets() {
        [10, ..] => 8,
        [172, ..] => 12,
        _ => 16,
    }
}

/// Validate an IPv4 CIDR block with a netmask in `min_prefix..=max_prefix`.
///
/// Returns the parsed block when it is a literal, valid CIDR.
pub fn validate_cidr(
    v: &mut Validator,
    field: &str,
    value: &str,
    min_prefix: u8,
    max_prefix: u8,
) -> Option<Ipv4Cidr> {
    if is_interpolation(value) {
        return None;
    }

    let Some(cidr) = Ipv4Cidr::parse(value) else {
        v.violation(
            RuleKind::Format,
            field,
            format!("'{}' is not a valid IPv4 CIDR block", value),
        );
        return None;
    };

    v.range(&format!("{}.netmask", field), cidr.prefix, min_prefix, max_prefix);
    v.check(
        cidr.is_network_address(),
        RuleKind::Format,
        field,
        format!("'{}' has host bits set", value),
    );
    Some(cidr)
}

/// Validate a list of CIDR blocks without netmask limits.
pub fn validate_cidr_list(v: &mut Validator, field: &str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        validate_cidr(v, &format!("{}[{}]", field, i), value, 0, 32);
    }
}
