use regex::{Regex, RegexBuilder};

use super::error::{GraphError, GraphResult};
use super::node::Node;
use crate::util::value_hash;

/// Merges every node whose id matches `regex` under a synthetic parent node
/// with id `replace_with`. Matching is case-insensitive and runs against the
/// original node id.
#[derive(Clone, Debug)]
pub struct Normalization {
    pub id: String,
    pub regex: String,
    pub replace_with: String,
    matcher: Regex,
}

impl PartialEq for Normalization {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.regex == other.regex && self.replace_with == other.replace_with
    }
}

impl Eq for Normalization {}

impl Normalization {
    pub fn new(id: impl Into<String>, regex: &str, replace_with: &str) -> GraphResult<Self> {
        let matcher = RegexBuilder::new(regex)
            .case_insensitive(true)
            .build()
            .map_err(|error| GraphError::InvalidRegex {
                pattern: regex.to_owned(),
                reason: error.to_string(),
            })?;

        Ok(Self {
            id: id.into(),
            regex: regex.to_owned(),
            replace_with: replace_with.to_owned(),
            matcher,
        })
    }

    /// A node named like the replacement always folds into the parent so the
    /// parent id stays unique among visible nodes.
    pub fn matches(&self, node_id: &str) -> bool {
        node_id == self.replace_with || self.matcher.is_match(node_id)
    }

    fn parent_from(&self, first_child: &Node) -> Node {
        let mut parent = first_child.clone();
        parent.id = self.replace_with.clone();
        parent.name = self.replace_with.clone();
        parent.abbreviated = self.replace_with.clone();
        parent.hash = value_hash(&self.replace_with);
        parent.normalization_id = Some(self.id.clone());
        parent.is_normalization_parent = true;
        parent.selected = false;
        parent.highlighted = false;
        parent.display_tooltip = false;
        parent
    }
}

/// Tags every matching node with the id of the first normalization it matches
/// and appends one parent per normalization that claimed at least one node.
/// Parents present in the input are dropped and derived again.
pub fn normalize_nodes(nodes: &[Node], normalizations: &[Normalization]) -> Vec<Node> {
    if normalizations.is_empty() {
        return nodes.to_vec();
    }

    let mut children = Vec::with_capacity(nodes.len());
    let mut parents: Vec<Node> = Vec::new();

    for node in nodes.iter().filter(|node| !node.is_normalization_parent) {
        let mut child = node.clone();
        child.normalization_id = None;

        if let Some(normalization) = normalizations
            .iter()
            .find(|normalization| normalization.matches(&node.id))
        {
            child.normalization_id = Some(normalization.id.clone());
            let existing = parents
                .iter_mut()
                .find(|parent| parent.normalization_id.as_deref() == Some(normalization.id.as_str()));
            match existing {
                Some(parent) => parent.absorb(node),
                None => parents.push(normalization.parent_from(node)),
            }
        }

        children.push(child);
    }

    children.extend(parents);
    children
}

/// Undoes one normalization: removes its parent and releases its children.
pub fn denormalize_nodes(nodes: &[Node], normalization: &Normalization) -> Vec<Node> {
    let id = normalization.id.as_str();
    nodes
        .iter()
        .filter(|node| !(node.is_normalization_parent && node.normalization_id.as_deref() == Some(id)))
        .map(|node| {
            let mut node = node.clone();
            if node.normalization_id.as_deref() == Some(id) {
                node.normalization_id = None;
            }
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeKind;

    fn node(id: &str, item: &str) -> Node {
        let mut node = Node::new(id, "T".to_owned(), NodeKind::Item, 40);
        node.attribute(item, "host", "s1");
        node
    }

    #[test]
    fn restores_original_nodes() {
        let nodes = vec![node("hello", "1"), node("bello", "2"), node("other", "3")];
        let normalization = Normalization::new("n1", "^[bh]ello$", "hello").unwrap();

        let normalized = normalize_nodes(&nodes, std::slice::from_ref(&normalization));
        assert_eq!(normalized.len(), 4);

        let restored = denormalize_nodes(&normalized, &normalization);
        assert_eq!(restored, nodes);
    }

    #[test]
    fn parent_aggregates_children() {
        let nodes = vec![node("WWW.A.COM", "1"), node("www.b.com", "2"), node("c.org", "3")];
        let normalization = Normalization::new("n1", r"^www\.", "web").unwrap();
        let normalized = normalize_nodes(&nodes, &[normalization]);

        let parent = normalized.iter().find(|node| node.is_normalization_parent).unwrap();
        assert_eq!(parent.id, "web");
        assert_eq!(parent.items, vec!["1", "2"]);
        assert_eq!(parent.hash, value_hash("web"));

        let hidden = normalized.iter().filter(|node| !node.is_visible()).count();
        assert_eq!(hidden, 2);
    }

    #[test]
    fn node_named_like_the_parent_is_folded() {
        let nodes = vec![node("web", "1"), node("www.b.com", "2")];
        let normalization = Normalization::new("n1", r"^www\.", "web").unwrap();
        let normalized = normalize_nodes(&nodes, &[normalization]);

        let visible = normalized
            .iter()
            .filter(|node| node.is_visible())
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(visible, vec!["web"]);
    }

    #[test]
    fn first_matching_normalization_claims_the_node() {
        let nodes = vec![node("abc", "1")];
        let first = Normalization::new("n1", "^a", "A").unwrap();
        let second = Normalization::new("n2", "c$", "C").unwrap();
        let normalized = normalize_nodes(&nodes, &[first, second]);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].normalization_id.as_deref(), Some("n1"));
        assert_eq!(normalized[1].id, "A");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(
            Normalization::new("n1", "[", "x"),
            Err(GraphError::InvalidRegex { .. })
        ));
    }
}
