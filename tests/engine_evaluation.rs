//! End-to-end engine scenarios against in-memory lookup fixtures
//!
//! Exercises the full evaluation path - VPC check, source CIDR derivation,
//! rule matching, near-miss hints - without touching AWS.

use async_trait::async_trait;
use conncheck::engine::{
    CheckKind, ConnectivityEngine, EvalError, Evaluation, LookupError, PortRange,
    ResourceDescriptor, RuleLookup, RulePeer, SecurityGroupRule, SubnetInfo, SubnetLookup, Verdict,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory stand-in for the EC2-backed lookups
#[derive(Default)]
struct FixtureNetwork {
    subnets: HashMap<String, SubnetInfo>,
    rules: HashMap<String, Vec<SecurityGroupRule>>,
    lookups: AtomicUsize,
}

impl FixtureNetwork {
    fn with_subnet(mut self, id: &str, vpc_id: &str, cidr: &str) -> Self {
        self.subnets.insert(
            id.to_string(),
            SubnetInfo {
                id: id.to_string(),
                vpc_id: vpc_id.to_string(),
                cidr_block: cidr.parse().unwrap(),
            },
        );
        self
    }

    fn with_rules(mut self, group_id: &str, rules: Vec<SecurityGroupRule>) -> Self {
        self.rules.insert(group_id.to_string(), rules);
        self
    }

    fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubnetLookup for FixtureNetwork {
    async fn subnet(&self, subnet_id: &str) -> Result<SubnetInfo, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                resource_type: "subnet",
                resource_id: subnet_id.to_string(),
            })
    }
}

#[async_trait]
impl RuleLookup for FixtureNetwork {
    async fn ingress_rules(&self, group_id: &str) -> Result<Vec<SecurityGroupRule>, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.rules
            .get(group_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                resource_type: "security group",
                resource_id: group_id.to_string(),
            })
    }
}

fn cidr_rule(group: &str, rule: &str, range: &str, port: u16) -> SecurityGroupRule {
    SecurityGroupRule {
        group_id: group.to_string(),
        rule_id: rule.to_string(),
        protocol: "tcp".to_string(),
        port_range: Some(PortRange::single(port)),
        peer: RulePeer::Cidr(range.parse().unwrap()),
    }
}

fn group_rule(group: &str, rule: &str, peer_group: &str, port: u16) -> SecurityGroupRule {
    SecurityGroupRule {
        group_id: group.to_string(),
        rule_id: rule.to_string(),
        protocol: "tcp".to_string(),
        port_range: Some(PortRange::single(port)),
        peer: RulePeer::Group(peer_group.to_string()),
    }
}

fn lambda_source() -> ResourceDescriptor {
    ResourceDescriptor::new("lambda", "order-worker")
        .with_vpc("vpc-1")
        .with_subnets(vec!["subnet-a".to_string()])
        .with_security_groups(vec!["sg-src".to_string()])
}

fn rds_destination() -> ResourceDescriptor {
    ResourceDescriptor::new("rds", "orders-db")
        .with_vpc("vpc-1")
        .with_subnets(vec!["subnet-b".to_string()])
        .with_security_groups(vec!["sg-db".to_string()])
}

async fn evaluate(
    network: &FixtureNetwork,
    source: &ResourceDescriptor,
    destination: &ResourceDescriptor,
    port: u32,
) -> Result<Evaluation, EvalError> {
    ConnectivityEngine::new(network, network)
        .evaluate(source, destination, port)
        .await
}

#[tokio::test]
async fn different_vpcs_are_indeterminate_with_single_outcome() {
    let network = FixtureNetwork::default();
    let source = lambda_source();
    let destination = rds_destination().with_vpc("vpc-2");

    let evaluation = evaluate(&network, &source, &destination, 3306).await.unwrap();

    assert_eq!(evaluation.verdict, Verdict::Indeterminate);
    assert_eq!(evaluation.outcomes.len(), 1);
    assert_eq!(evaluation.outcomes[0].kind, CheckKind::VpcMembership);
    assert!(!evaluation.outcomes[0].passed);
    // Short-circuit: no subnet or rule lookups happened
    assert_eq!(network.lookup_count(), 0);
}

#[tokio::test]
async fn unattached_source_is_indeterminate() {
    let network = FixtureNetwork::default();
    let source = ResourceDescriptor::new("lambda", "order-worker");

    let evaluation = evaluate(&network, &source, &rds_destination(), 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Indeterminate);
    assert_eq!(evaluation.outcomes.len(), 1);
}

#[tokio::test]
async fn matching_cidr_rule_allows_and_names_the_rule() {
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules(
            "sg-db",
            vec![cidr_rule("sg-db", "sgr-allow", "10.0.0.0/16", 3306)],
        );

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
    assert_eq!(evaluation.outcomes.len(), 2);
    let sg_outcome = &evaluation.outcomes[1];
    assert_eq!(sg_outcome.kind, CheckKind::SecurityGroupMatch);
    assert!(sg_outcome.passed);
    assert!(sg_outcome.detail.contains("sg-db"));
    assert!(sg_outcome.detail.contains("sgr-allow"));
}

#[tokio::test]
async fn exact_cidr_short_circuits_subnet_lookup() {
    let network = FixtureNetwork::default().with_rules(
        "sg-db",
        vec![cidr_rule("sg-db", "sgr-allow", "10.0.0.0/16", 3306)],
    );
    let source = lambda_source().with_exact_cidr("10.0.1.5/32".parse().unwrap());

    let evaluation = evaluate(&network, &source, &rds_destination(), 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
    // Only the rule lookup; the subnet table is empty and untouched
    assert_eq!(network.lookup_count(), 1);
}

#[tokio::test]
async fn wrong_port_blocks_with_near_miss_naming_rule_and_range() {
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules(
            "sg-db",
            vec![cidr_rule("sg-db", "sgr-pg", "10.0.0.0/16", 5432)],
        );

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Blocked);
    let detail = &evaluation.outcomes[1].detail;
    assert!(detail.contains("sg-db"), "detail: {detail}");
    assert!(detail.contains("sgr-pg"), "detail: {detail}");
    assert!(detail.contains("5432"), "detail: {detail}");
    assert!(detail.contains("3306"), "detail: {detail}");
}

#[tokio::test]
async fn group_referenced_rule_matches_on_membership() {
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules(
            "sg-db",
            vec![group_rule("sg-db", "sgr-peer", "sg-src", 443)],
        );

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 443)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
    assert!(evaluation.outcomes[1].detail.contains("sgr-peer"));
}

#[tokio::test]
async fn group_referenced_rule_ignores_cidr_data() {
    // The source CIDR is far outside any range; membership alone decides
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "192.168.50.0/24")
        .with_rules(
            "sg-db",
            vec![group_rule("sg-db", "sgr-peer", "sg-src", 443)],
        );

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 443)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
}

#[tokio::test]
async fn partial_cidr_overlap_does_not_match() {
    // Source subnet 10.0.0.0/8 strictly contains the rule's 10.0.0.0/16:
    // they overlap, but the source range is not inside the rule's range.
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.0.0/8")
        .with_rules(
            "sg-db",
            vec![cidr_rule("sg-db", "sgr-allow", "10.0.0.0/16", 3306)],
        );

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Blocked);
    // Not even a near miss: the peer itself does not match
    assert!(evaluation.outcomes[1]
        .detail
        .contains("no ingress rule"));
}

#[tokio::test]
async fn all_ports_rule_matches_any_port() {
    let mut rule = cidr_rule("sg-db", "sgr-any", "10.0.0.0/16", 0);
    rule.port_range = None;
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules("sg-db", vec![rule]);

    let evaluation = evaluate(&network, &lambda_source(), &rds_destination(), 9999)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
}

#[tokio::test]
async fn destination_without_security_groups_blocks() {
    let network = FixtureNetwork::default().with_subnet("subnet-a", "vpc-1", "10.0.1.0/24");
    let destination = rds_destination().with_security_groups(Vec::new());

    let evaluation = evaluate(&network, &lambda_source(), &destination, 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Blocked);
    assert!(evaluation.outcomes[1]
        .detail
        .contains("no security groups attached"));
}

#[tokio::test]
async fn rules_from_second_group_are_considered() {
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules("sg-db", vec![])
        .with_rules(
            "sg-extra",
            vec![cidr_rule("sg-extra", "sgr-allow", "10.0.0.0/16", 3306)],
        );
    let destination = rds_destination()
        .with_security_groups(vec!["sg-db".to_string(), "sg-extra".to_string()]);

    let evaluation = evaluate(&network, &lambda_source(), &destination, 3306)
        .await
        .unwrap();

    assert_eq!(evaluation.verdict, Verdict::Allowed);
    assert!(evaluation.outcomes[1].detail.contains("sg-extra"));
}

#[tokio::test]
async fn source_without_network_identity_is_an_error() {
    let network = FixtureNetwork::default();
    let source = ResourceDescriptor::new("lambda", "order-worker")
        .with_vpc("vpc-1")
        .with_security_groups(vec!["sg-src".to_string()]);

    let err = evaluate(&network, &source, &rds_destination(), 3306)
        .await
        .unwrap_err();

    assert!(matches!(err, EvalError::NoNetworkIdentity { .. }));
}

#[tokio::test]
async fn invalid_port_fails_before_any_lookup() {
    let network = FixtureNetwork::default();

    let err = evaluate(&network, &lambda_source(), &rds_destination(), 70000)
        .await
        .unwrap_err();

    assert!(matches!(err, EvalError::InvalidPort(70000)));
    assert_eq!(network.lookup_count(), 0);
}

#[tokio::test]
async fn missing_rule_data_aborts_the_evaluation() {
    // Destination references a group the lookup has no data for
    let network = FixtureNetwork::default().with_subnet("subnet-a", "vpc-1", "10.0.1.0/24");

    let err = evaluate(&network, &lambda_source(), &rds_destination(), 3306)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EvalError::Lookup(LookupError::NotFound { .. })
    ));
}

#[tokio::test]
async fn evaluation_is_idempotent() {
    let network = FixtureNetwork::default()
        .with_subnet("subnet-a", "vpc-1", "10.0.1.0/24")
        .with_rules(
            "sg-db",
            vec![cidr_rule("sg-db", "sgr-pg", "10.0.0.0/16", 5432)],
        );
    let source = lambda_source();
    let destination = rds_destination();

    let first = evaluate(&network, &source, &destination, 3306).await.unwrap();
    let second = evaluate(&network, &source, &destination, 3306).await.unwrap();

    assert_eq!(first, second);
}
