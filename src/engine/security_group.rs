//! Security-group rule matching
//!
//! Decides whether any inbound rule on any of the destination's security
//! groups permits traffic from the source on the requested port. When
//! nothing matches, a second pass collects "near misses" - rules whose peer
//! matches the source but whose port range excludes the requested port -
//! since those are almost always the misconfiguration the user is hunting.

use crate::engine::descriptor::{ResourceDescriptor, RulePeer, SecurityGroupRule};
use crate::engine::error::EvalError;
use crate::engine::ip;
use crate::engine::lookup::{RuleLookup, SubnetLookup};
use crate::engine::outcome::{CheckKind, CheckOutcome};
use ipnet::Ipv4Net;
use tracing::debug;

/// Evaluate the destination's inbound rules against the source and port.
///
/// Rules are fetched per group in the order the groups appear on the
/// descriptor; the first matching rule wins. Lookup failures abort the whole
/// evaluation.
pub async fn evaluate_security_groups(
    source: &ResourceDescriptor,
    destination: &ResourceDescriptor,
    port: u16,
    subnets: &dyn SubnetLookup,
    rules: &dyn RuleLookup,
) -> Result<CheckOutcome, EvalError> {
    let source_cidr = ip::resolve_source_cidr(source, subnets).await?;

    if destination.security_group_ids.is_empty() {
        return Ok(CheckOutcome::fail(
            CheckKind::SecurityGroupMatch,
            format!(
                "{} has no security groups attached",
                destination.display_name()
            ),
        ));
    }

    let mut all_rules = Vec::new();
    for group_id in &destination.security_group_ids {
        let group_rules = rules.ingress_rules(group_id).await?;
        debug!(group_id = %group_id, rules = group_rules.len(), "Fetched ingress rules");
        all_rules.extend(group_rules);
    }

    // TODO: take the rule protocol into account instead of assuming tcp
    for rule in &all_rules {
        if peer_matches(&rule.peer, &source_cidr, source) && rule.permits_port(port) {
            return Ok(CheckOutcome::pass(
                CheckKind::SecurityGroupMatch,
                format!(
                    "{} has {} rule {} that allows {} on port {}",
                    rule.group_id,
                    rule.peer.kind_label(),
                    rule.rule_id,
                    matched_peer_display(&rule.peer, &source_cidr),
                    port
                ),
            ));
        }
    }

    let near_misses: Vec<String> = all_rules
        .iter()
        .filter(|rule| peer_matches(&rule.peer, &source_cidr, source) && !rule.permits_port(port))
        .map(|rule| near_miss_line(rule, &source_cidr, port))
        .collect();

    let detail = if near_misses.is_empty() {
        format!(
            "no ingress rule on {} permits {} on port {}",
            destination.security_group_ids.join(", "),
            source_cidr,
            port
        )
    } else {
        near_misses.join("; ")
    };

    Ok(CheckOutcome::fail(CheckKind::SecurityGroupMatch, detail))
}

/// Whether a rule's peer admits the source, ignoring ports.
///
/// CIDR rules require full containment: a source range that only partially
/// overlaps the rule's range is not permitted by it. Group rules match on
/// membership of the referenced group, regardless of any CIDR data.
fn peer_matches(peer: &RulePeer, source_cidr: &Ipv4Net, source: &ResourceDescriptor) -> bool {
    match peer {
        RulePeer::Cidr(range) => range.contains(source_cidr),
        RulePeer::Group(group_id) => source.security_group_ids.iter().any(|id| id == group_id),
    }
}

/// What the source matched as: its CIDR for cidr-based rules, the referenced
/// group for group-based rules
fn matched_peer_display(peer: &RulePeer, source_cidr: &Ipv4Net) -> String {
    match peer {
        RulePeer::Cidr(_) => source_cidr.to_string(),
        RulePeer::Group(group_id) => group_id.clone(),
    }
}

fn near_miss_line(rule: &SecurityGroupRule, source_cidr: &Ipv4Net, port: u16) -> String {
    // Near misses always carry a concrete range; an all-ports rule whose
    // peer matched would have been a match.
    let range = rule
        .port_range
        .map(|r| r.to_string())
        .unwrap_or_else(|| "all".to_string());
    format!(
        "{} has {} rule {} that allows {}, but only on port(s) {}, not {}",
        rule.group_id,
        rule.peer.kind_label(),
        rule.rule_id,
        matched_peer_display(&rule.peer, source_cidr),
        range,
        port
    )
}
