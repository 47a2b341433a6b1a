use serde::{Deserialize, Serialize};

use super::error::{GraphError, GraphResult};
use super::link::LinkArena;

/// Reroutes the direct `from`-`to` link through the `via` node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaRule {
    pub id: String,
    pub from: String,
    pub via: String,
    pub to: String,
}

impl ViaRule {
    pub fn new(id: impl Into<String>, from: &str, via: &str, to: &str) -> GraphResult<Self> {
        if from == via || via == to || from == to {
            return Err(GraphError::InvalidVia(format!(
                "endpoints must be distinct: {from} -> {via} -> {to}"
            )));
        }

        Ok(Self {
            id: id.into(),
            from: from.to_owned(),
            via: via.to_owned(),
            to: to.to_owned(),
        })
    }

    pub fn same_route(&self, other: &ViaRule) -> bool {
        self.from == other.from && self.via == other.via && self.to == other.to
    }
}

/// Applies rules in order to a copy of `links`. A rule changes nothing while
/// one of its three nodes is not live or there is no direct link between its
/// endpoints; hop links that already exist absorb the rerouted record ids
/// instead of being duplicated.
pub fn apply_via(
    links: &LinkArena,
    rules: &[ViaRule],
    is_live: impl Fn(&str) -> bool,
) -> LinkArena {
    let mut routed = links.clone();

    for rule in rules {
        if ![&rule.from, &rule.via, &rule.to].into_iter().all(|id| is_live(id)) {
            continue;
        }
        let Some(direct) = routed.get(&rule.from, &rule.to).cloned() else {
            continue;
        };
        routed.retain(|link| link.key() != direct.key());

        for (a, b) in [(&rule.from, &rule.via), (&rule.via, &rule.to)] {
            let is_new = !routed.contains(a, b);
            let hop = routed.upsert(a, b);
            if is_new {
                hop.via_id = Some(rule.id.clone());
            }
            for item in &direct.item_ids {
                hop.add_item(item);
            }
        }
    }

    routed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(pairs: &[(&str, &str, &str)]) -> LinkArena {
        let mut arena = LinkArena::new();
        for (a, b, item) in pairs {
            arena.upsert(a, b).add_item(item);
        }
        arena
    }

    #[test]
    fn direct_link_becomes_two_hops() {
        let original = links(&[("a", "b", "r1")]);
        let rule = ViaRule::new("v1", "a", "v", "b").unwrap();
        let routed = apply_via(&original, std::slice::from_ref(&rule), |_| true);

        assert!(!routed.contains("a", "b"));
        let first = routed.get("a", "v").unwrap();
        assert_eq!(first.via_id.as_deref(), Some("v1"));
        assert_eq!(first.item_ids, vec!["r1"]);
        assert!(routed.contains("v", "b"));

        assert_eq!(apply_via(&original, &[], |_| true), original);
    }

    #[test]
    fn existing_hop_absorbs_records() {
        let original = links(&[("a", "b", "r1"), ("a", "v", "r2")]);
        let rule = ViaRule::new("v1", "a", "v", "b").unwrap();
        let routed = apply_via(&original, &[rule], |_| true);

        let hop = routed.get("v", "a").unwrap();
        assert_eq!(hop.via_id, None);
        assert_eq!(hop.item_ids, vec!["r2", "r1"]);
        assert_eq!(routed.len(), 2);
    }

    #[test]
    fn rule_without_direct_link_is_inert() {
        let original = links(&[("a", "c", "r1")]);
        let rule = ViaRule::new("v1", "a", "v", "b").unwrap();
        assert_eq!(apply_via(&original, &[rule], |_| true), original);
    }

    #[test]
    fn rule_through_a_missing_node_keeps_the_direct_link() {
        let original = links(&[("a", "b", "r1")]);
        let rule = ViaRule::new("v1", "a", "v", "b").unwrap();
        let routed = apply_via(&original, &[rule], |id| id != "v");

        assert_eq!(routed, original);
    }

    #[test]
    fn degenerate_rules_are_rejected() {
        assert!(matches!(
            ViaRule::new("v1", "a", "a", "b"),
            Err(GraphError::InvalidVia(_))
        ));
    }
}
