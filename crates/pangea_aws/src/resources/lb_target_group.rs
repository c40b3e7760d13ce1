//! `aws_lb_target_group`

use serde::{Deserialize, Serialize};

use pangea_core::{Block, ComputedProperties, PangeaResult, ResourceAttributes, RuleKind, Validator};

use crate::types::{validate_name_or_prefix, validate_resource_id, validate_tags, Tags};

const NAME_PATTERN: &str = r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?$";
const HTTP_MATCHER_PATTERN: &str = r"^\d{3}(-\d{3})?(,\d{3}(-\d{3})?)*$";
const GRPC_MATCHER_PATTERN: &str = r"^\d{1,2}(-\d{1,2})?(,\d{1,2}(-\d{1,2})?)*$";

/// Gateway Load Balancers exchange GENEVE traffic on this port only.
pub const GENEVE_PORT: u32 = 6081;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Instance,
    Ip,
    Lambda,
    Alb,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Instance => "instance",
            TargetType::Ip => "ip",
            TargetType::Lambda => "lambda",
            TargetType::Alb => "alb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    Http,
    Https,
    Tcp,
    Tls,
    Udp,
    TcpUdp,
    Geneve,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Https => "HTTPS",
            Protocol::Tcp => "TCP",
            Protocol::Tls => "TLS",
            Protocol::Udp => "UDP",
            Protocol::TcpUdp => "TCP_UDP",
            Protocol::Geneve => "GENEVE",
        }
    }

    /// Application (layer 7) protocol.
    pub fn is_http(&self) -> bool {
        matches!(self, Protocol::Http | Protocol::Https)
    }

    /// Network (layer 4) protocol served by a Network Load Balancer.
    pub fn is_network(&self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Tls | Protocol::Udp | Protocol::TcpUdp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolVersion {
    Http1,
    Http2,
    Grpc,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::Http1 => "HTTP1",
            ProtocolVersion::Http2 => "HTTP2",
            ProtocolVersion::Grpc => "GRPC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickinessType {
    LbCookie,
    AppCookie,
    SourceIp,
}

impl StickinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StickinessType::LbCookie => "lb_cookie",
            StickinessType::AppCookie => "app_cookie",
            StickinessType::SourceIp => "source_ip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthCheck {
    pub enabled: bool,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub interval: u32,
    pub timeout: Option<u32>,
    pub path: Option<String>,
    pub port: String,
    pub protocol: Option<Protocol>,
    pub matcher: Option<String>,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            enabled: true,
            healthy_threshold: 3,
            unhealthy_threshold: 3,
            interval: 30,
            timeout: None,
            path: None,
            port: "traffic-port".to_string(),
            protocol: None,
            matcher: None,
        }
    }
}

impl HealthCheck {
    fn to_block(&self) -> Block {
        Block::new()
            .attr("enabled", self.enabled)
            .attr("healthy_threshold", self.healthy_threshold)
            .attr("unhealthy_threshold", self.unhealthy_threshold)
            .attr("interval", self.interval)
            .opt("timeout", self.timeout)
            .opt_str("path", self.path.as_ref())
            .attr("port", self.port.as_str())
            .opt("protocol", self.protocol.map(|p| p.as_str()))
            .opt_str("matcher", self.matcher.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stickiness {
    #[serde(rename = "type")]
    pub stickiness_type: StickinessType,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cookie_duration")]
    pub cookie_duration: u32,
    pub cookie_name: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_cookie_duration() -> u32 {
    86400
}

fn default_deregistration_delay() -> u32 {
    300
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LbTargetGroupAttributes {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub port: Option<u32>,
    pub protocol: Option<Protocol>,
    pub protocol_version: Option<ProtocolVersion>,
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default = "default_deregistration_delay")]
    pub deregistration_delay: u32,
    #[serde(default)]
    pub slow_start: u32,
    pub load_balancing_algorithm_type: Option<String>,
    pub health_check: Option<HealthCheck>,
    pub stickiness: Option<Stickiness>,
    #[serde(default)]
    pub tags: Tags,
}

impl LbTargetGroupAttributes {
    /// An instance target group for `protocol` on `port` inside `vpc_id`.
    pub fn new(port: u32, protocol: Protocol, vpc_id: impl Into<String>) -> Self {
        Self {
            name: None,
            name_prefix: None,
            port: Some(port),
            protocol: Some(protocol),
            protocol_version: None,
            vpc_id: Some(vpc_id.into()),
            target_type: TargetType::Instance,
            deregistration_delay: default_deregistration_delay(),
            slow_start: 0,
            load_balancing_algorithm_type: None,
            health_check: None,
            stickiness: None,
            tags: Tags::new(),
        }
    }

    fn is_http(&self) -> bool {
        self.protocol.is_some_and(|p| p.is_http())
    }

    fn validate_health_check(&self, v: &mut Validator, hc: &HealthCheck) {
        v.range("health_check.interval", hc.interval, 5, 300);
        v.range("health_check.healthy_threshold", hc.healthy_threshold, 2, 10);
        v.range("health_check.unhealthy_threshold", hc.unhealthy_threshold, 2, 10);

        if let Some(timeout) = hc.timeout {
            v.range("health_check.timeout", timeout, 2, 120);
            v.check(
                timeout < hc.interval,
                RuleKind::Conditional,
                "health_check.timeout",
                format!("must be less than interval ({}s)", hc.interval),
            );
        }

        if hc.port != "traffic-port" {
            match hc.port.parse::<u32>() {
                Ok(port) => v.range("health_check.port", port, 1, 65535),
                Err(_) => v.violation(
                    RuleKind::Format,
                    "health_check.port",
                    "must be 'traffic-port' or a port number",
                ),
            }
        }

        if let Some(protocol) = hc.protocol {
            v.one_of("health_check.protocol", protocol.as_str(), &["HTTP", "HTTPS", "TCP"]);
        }

        let check_protocol = hc.protocol.or(self.protocol);
        let http_check = check_protocol.is_some_and(|p| p.is_http())
            || self.target_type == TargetType::Lambda;

        if let Some(path) = &hc.path {
            v.forbids("health_check.path", true, !http_check, "for non-HTTP health checks");
            v.check(
                path.starts_with('/'),
                RuleKind::Format,
                "health_check.path",
                "must start with '/'",
            );
            v.length("health_check.path", path, 1, 1024);
        }

        if let Some(matcher) = &hc.matcher {
            let grpc = self.protocol_version == Some(ProtocolVersion::Grpc);
            v.forbids(
                "health_check.matcher",
                true,
                !http_check && !grpc,
                "for non-HTTP health checks",
            );
            let pattern = if grpc { GRPC_MATCHER_PATTERN } else { HTTP_MATCHER_PATTERN };
            v.format("health_check.matcher", matcher, pattern, "a status code list such as 200,202 or 200-299");
        }
    }

    fn validate_stickiness(&self, v: &mut Validator, stickiness: &Stickiness) {
        v.range("stickiness.cookie_duration", stickiness.cookie_duration, 1, 604_800);

        let app_cookie = stickiness.stickiness_type == StickinessType::AppCookie;
        v.requires(
            "stickiness.type",
            app_cookie,
            "stickiness.cookie_name",
            stickiness.cookie_name.is_some(),
        );
        v.forbids(
            "stickiness.cookie_name",
            stickiness.cookie_name.is_some(),
            !app_cookie,
            "unless type is app_cookie",
        );

        let network = self.protocol.is_some_and(|p| p.is_network());
        match stickiness.stickiness_type {
            StickinessType::SourceIp => v.forbids(
                "stickiness.type",
                true,
                !network,
                "as source_ip without a TCP, TLS, UDP or TCP_UDP protocol",
            ),
            StickinessType::LbCookie | StickinessType::AppCookie => v.forbids(
                "stickiness.type",
                true,
                !self.is_http() && self.target_type != TargetType::Lambda,
                "as a cookie type without HTTP or HTTPS",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LbTargetGroupComputed {
    pub is_network_target_group: bool,
    pub supports_health_check_path: bool,
    pub requires_vpc: bool,
    pub uses_stickiness: bool,
    /// Seconds an unhealthy target keeps receiving traffic before removal.
    pub failure_detection_seconds: u32,
}

impl ComputedProperties for LbTargetGroupComputed {}

impl ResourceAttributes for LbTargetGroupAttributes {
    const RESOURCE_TYPE: &'static str = "aws_lb_target_group";
    const OUTPUTS: &'static [&'static str] = &["id", "arn", "arn_suffix", "name"];

    type Computed = LbTargetGroupComputed;

    fn validate(&self) -> PangeaResult<()> {
        let mut v = Validator::new(Self::RESOURCE_TYPE);

        validate_name_or_prefix(
            &mut v,
            ("name", self.name.as_ref()),
            ("name_prefix", self.name_prefix.as_ref()),
        );
        if let Some(name) = &self.name {
            v.length("name", name, 1, 32);
            v.format("name", name, NAME_PATTERN, "alphanumeric with inner hyphens");
        }
        if let Some(prefix) = &self.name_prefix {
            v.length("name_prefix", prefix, 1, 6);
        }

        let lambda = self.target_type == TargetType::Lambda;
        for (field, present) in [
            ("port", self.port.is_some()),
            ("protocol", self.protocol.is_some()),
            ("vpc_id", self.vpc_id.is_some()),
        ] {
            if lambda {
                v.forbids(field, present, true, "for lambda targets");
            } else {
                v.check(present, RuleKind::Required, field, "is required unless target_type is lambda");
            }
        }

        if let Some(port) = self.port {
            v.range("port", port, 1, 65535);
        }
        if let Some(vpc_id) = &self.vpc_id {
            validate_resource_id(&mut v, "vpc_id", vpc_id, "vpc");
        }
        if self.target_type == TargetType::Alb {
            v.check(
                self.protocol == Some(Protocol::Tcp),
                RuleKind::Conditional,
                "protocol",
                "must be TCP for alb targets",
            );
        }

        if self.protocol == Some(Protocol::Geneve) {
            if let Some(port) = self.port {
                v.check(
                    port == GENEVE_PORT,
                    RuleKind::Conditional,
                    "port",
                    format!("must be {} for GENEVE", GENEVE_PORT),
                );
            }
            v.check(
                matches!(self.target_type, TargetType::Instance | TargetType::Ip),
                RuleKind::Conditional,
                "target_type",
                "must be instance or ip for GENEVE",
            );
        }

        if let Some(version) = self.protocol_version {
            v.forbids(
                "protocol_version",
                true,
                !self.is_http(),
                &format!("({}) without HTTP or HTTPS", version.as_str()),
            );
        }

        v.range("deregistration_delay", self.deregistration_delay, 0, 3600);
        if self.slow_start != 0 {
            v.range("slow_start", self.slow_start, 30, 900);
            v.forbids("slow_start", true, !self.is_http(), "without HTTP or HTTPS");
        }

        if let Some(algorithm) = &self.load_balancing_algorithm_type {
            v.one_of(
                "load_balancing_algorithm_type",
                algorithm,
                &["round_robin", "least_outstanding_requests", "weighted_random"],
            );
            v.forbids(
                "load_balancing_algorithm_type",
                true,
                !self.is_http(),
                "without HTTP or HTTPS",
            );
        }

        if let Some(hc) = &self.health_check {
            self.validate_health_check(&mut v, hc);
        }
        if let Some(stickiness) = &self.stickiness {
            self.validate_stickiness(&mut v, stickiness);
        }

        validate_tags(&mut v, "tags", &self.tags);
        v.finish()
    }

    fn to_block(&self) -> Block {
        Block::new()
            .opt_str("name", self.name.as_ref())
            .opt_str("name_prefix", self.name_prefix.as_ref())
            .opt("port", self.port)
            .opt("protocol", self.protocol.map(|p| p.as_str()))
            .opt("protocol_version", self.protocol_version.map(|p| p.as_str()))
            .opt_str("vpc_id", self.vpc_id.as_ref())
            .attr("target_type", self.target_type.as_str())
            .attr("deregistration_delay", self.deregistration_delay)
            .attr("slow_start", self.slow_start)
            .opt_str("load_balancing_algorithm_type", self.load_balancing_algorithm_type.as_ref())
            .opt_block("health_check", self.health_check.as_ref().map(HealthCheck::to_block))
            .opt_block(
                "stickiness",
                self.stickiness.as_ref().map(|s| {
                    Block::new()
                        .attr("type", s.stickiness_type.as_str())
                        .attr("enabled", s.enabled)
                        .attr("cookie_duration", s.cookie_duration)
                        .opt_str("cookie_name", s.cookie_name.as_ref())
                }),
            )
            .map("tags", &self.tags)
    }

    fn computed(&self) -> Self::Computed {
        let hc = self.health_check.clone().unwrap_or_default();
        LbTargetGroupComputed {
            is_network_target_group: self.protocol.is_some_and(|p| p.is_network()),
            supports_health_check_path: self.is_http() || self.target_type == TargetType::Lambda,
            requires_vpc: self.target_type != TargetType::Lambda,
            uses_stickiness: self.stickiness.as_ref().is_some_and(|s| s.enabled),
            failure_detection_seconds: hc.interval * hc.unhealthy_threshold,
        }
    }
}
