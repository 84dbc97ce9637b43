//! Normalized network descriptors for diagnosed resources

use ipnet::Ipv4Net;

/// Network attributes of one endpoint of the diagnosed connection.
///
/// Every resolver adapter (`aws::lambda`, `aws::ecs`, `aws::rds`) collapses
/// its service-specific API response into this shape, so the engine never
/// sees service-specific data. Adding support for a new resource type means
/// adding an adapter, not touching the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Resource kind label used in trace output ("lambda", "ecs", "rds")
    pub kind: String,
    /// Resource identifier as the user named it (function name, service name, ...)
    pub id: String,
    /// VPC the resource is attached to; `None` means not network-attached
    pub vpc_id: Option<String>,
    /// Subnets the resource spans, as listed by the service API
    pub subnet_ids: Vec<String>,
    /// Exact interface CIDR when the service exposes one; takes precedence
    /// over any subnet-derived CIDR
    pub exact_cidr: Option<Ipv4Net>,
    /// Security groups attached to the resource
    pub security_group_ids: Vec<String>,
}

impl ResourceDescriptor {
    /// Create a descriptor with no network attachment
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            vpc_id: None,
            subnet_ids: Vec::new(),
            exact_cidr: None,
            security_group_ids: Vec::new(),
        }
    }

    /// Set the VPC ID
    pub fn with_vpc(mut self, vpc_id: impl Into<String>) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self
    }

    /// Set the subnet IDs
    pub fn with_subnets(mut self, subnet_ids: Vec<String>) -> Self {
        self.subnet_ids = subnet_ids;
        self
    }

    /// Set the exact interface CIDR
    pub fn with_exact_cidr(mut self, cidr: Ipv4Net) -> Self {
        self.exact_cidr = Some(cidr);
        self
    }

    /// Set the security group IDs
    pub fn with_security_groups(mut self, group_ids: Vec<String>) -> Self {
        self.security_group_ids = group_ids;
        self
    }

    /// "kind 'id'" form used in trace details and error messages
    pub fn display_name(&self) -> String {
        format!("{} '{}'", self.kind, self.id)
    }
}

/// Subnet attributes looked up on demand through [`crate::engine::lookup::SubnetLookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    pub id: String,
    pub vpc_id: String,
    pub cidr_block: Ipv4Net,
}

/// Inclusive port range of a security-group rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    /// Range covering a single port
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// The "who is allowed" half of a security-group rule.
///
/// A rule permits either a block of addresses or the members of another
/// security group, never both. Entries AWS expresses some other way (IPv6
/// ranges, prefix lists) are dropped during rule conversion and never reach
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePeer {
    /// Permits any source address range fully contained in this one
    Cidr(Ipv4Net),
    /// Permits any source carrying the referenced security group
    Group(String),
}

impl RulePeer {
    /// Short label used in trace details ("cidr-based" / "group-based")
    pub fn kind_label(&self) -> &'static str {
        match self {
            RulePeer::Cidr(_) => "cidr-based",
            RulePeer::Group(_) => "group-based",
        }
    }
}

impl std::fmt::Display for RulePeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulePeer::Cidr(net) => write!(f, "{net}"),
            RulePeer::Group(id) => write!(f, "{id}"),
        }
    }
}

/// One inbound permission entry of a destination security group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRule {
    /// Security group owning this rule
    pub group_id: String,
    /// Unique rule identifier (e.g. "sgr-0123abcd")
    pub rule_id: String,
    /// IP protocol as reported by AWS ("tcp", "udp", "-1" for all)
    pub protocol: String,
    /// Permitted port range; `None` means all ports
    pub port_range: Option<PortRange>,
    pub peer: RulePeer,
}

impl SecurityGroupRule {
    /// Whether this rule's port range admits the given port
    pub fn permits_port(&self, port: u16) -> bool {
        match &self.port_range {
            Some(range) => range.contains(port),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_range_single_display() {
        assert_eq!(PortRange::single(5432).to_string(), "5432");
    }

    #[test]
    fn port_range_span_display() {
        let range = PortRange {
            start: 1024,
            end: 2048,
        };
        assert_eq!(range.to_string(), "1024-2048");
    }

    #[test]
    fn port_range_containment() {
        let range = PortRange {
            start: 1024,
            end: 2048,
        };
        assert!(range.contains(1024));
        assert!(range.contains(2048));
        assert!(!range.contains(1023));
        assert!(!range.contains(2049));
    }

    #[test]
    fn all_ports_rule_permits_everything() {
        let rule = SecurityGroupRule {
            group_id: "sg-1".to_string(),
            rule_id: "sgr-1".to_string(),
            protocol: "-1".to_string(),
            port_range: None,
            peer: RulePeer::Group("sg-2".to_string()),
        };
        assert!(rule.permits_port(1));
        assert!(rule.permits_port(65535));
    }

    #[test]
    fn descriptor_builder() {
        let desc = ResourceDescriptor::new("lambda", "my-fn")
            .with_vpc("vpc-1")
            .with_subnets(vec!["subnet-a".to_string()])
            .with_security_groups(vec!["sg-1".to_string()]);
        assert_eq!(desc.vpc_id.as_deref(), Some("vpc-1"));
        assert_eq!(desc.display_name(), "lambda 'my-fn'");
    }
}
