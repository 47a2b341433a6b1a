use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::util::{abbreviate, push_unique, value_hash};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain field value. The only kind a user may delete.
    #[default]
    Item,
    /// Composite node of a parent field that groups child fields under it.
    Connector,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Connector => "connector",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub abbreviated: String,
    pub description: String,
    pub icon: String,
    pub kind: NodeKind,
    pub items: Vec<String>,
    pub fields: Vec<String>,
    pub search_ids: Vec<String>,
    pub child_data: BTreeMap<String, Vec<String>>,
    pub hash: i32,
    pub normalization_id: Option<String>,
    pub is_normalization_parent: bool,
    pub selected: bool,
    pub highlighted: bool,
    pub display_tooltip: bool,
    pub display: bool,
    pub important: bool,
}

impl Node {
    pub fn new(id: &str, icon: String, kind: NodeKind, abbreviate_length: usize) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            abbreviated: abbreviate(id, abbreviate_length),
            description: String::new(),
            icon,
            kind,
            items: Vec::new(),
            fields: Vec::new(),
            search_ids: Vec::new(),
            child_data: BTreeMap::new(),
            hash: value_hash(id),
            normalization_id: None,
            is_normalization_parent: false,
            selected: false,
            highlighted: false,
            display_tooltip: false,
            display: true,
            important: false,
        }
    }

    /// Number of records that contributed to this node; doubles as the
    /// layout mass proxy.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_deletable(&self) -> bool {
        self.kind == NodeKind::Item && !self.is_normalization_parent
    }

    /// Visible in the graph: not folded into a normalization parent.
    pub fn is_visible(&self) -> bool {
        self.normalization_id.is_none() || self.is_normalization_parent
    }

    pub fn attribute(&mut self, item_id: &str, field_path: &str, search_id: &str) {
        push_unique(&mut self.items, item_id.to_owned());
        push_unique(&mut self.fields, field_path.to_owned());
        push_unique(&mut self.search_ids, search_id.to_owned());
    }

    pub fn add_child_value(&mut self, child_path: &str, value: &str) -> bool {
        let values = self.child_data.entry(child_path.to_owned()).or_default();
        push_unique(values, value.to_owned())
    }

    pub fn absorb(&mut self, other: &Node) {
        for item in &other.items {
            push_unique(&mut self.items, item.clone());
        }
        for field in &other.fields {
            push_unique(&mut self.fields, field.clone());
        }
        for search in &other.search_ids {
            push_unique(&mut self.search_ids, search.clone());
        }
        for (path, values) in &other.child_data {
            let merged = self.child_data.entry(path.clone()).or_default();
            for value in values {
                push_unique(merged, value.clone());
            }
        }
    }
}

/// Nodes in upsert order with an id index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeArena {
    nodes: Vec<Node>,
    index_by_id: HashMap<String, usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.index_by_id
            .get(id)
            .copied()
            .map(move |index| &mut self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Returns the node for `id`, creating it with `create` on first sight.
    pub fn upsert_with(&mut self, id: &str, create: impl FnOnce() -> Node) -> &mut Node {
        let index = match self.index_by_id.get(id) {
            Some(&index) => index,
            None => {
                let index = self.nodes.len();
                self.nodes.push(create());
                self.index_by_id.insert(id.to_owned(), index);
                index
            }
        };
        &mut self.nodes[index]
    }

    pub fn insert(&mut self, node: Node) {
        match self.index_by_id.get(&node.id) {
            Some(&index) => self.nodes[index] = node,
            None => {
                self.index_by_id.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn retain(&mut self, keep: impl FnMut(&Node) -> bool) {
        self.nodes.retain(keep);
        self.reindex();
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    fn reindex(&mut self) {
        self.index_by_id.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.index_by_id.insert(node.id.clone(), index);
        }
    }
}

impl FromIterator<Node> for NodeArena {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        let mut arena = Self::new();
        for node in iter {
            arena.insert(node);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, "T".to_owned(), NodeKind::Item, 40)
    }

    #[test]
    fn attribute_is_idempotent() {
        let mut node = node("a");
        node.attribute("r1", "client", "s1");
        node.attribute("r1", "client", "s1");
        node.attribute("r2", "server", "s1");

        assert_eq!(node.items, vec!["r1", "r2"]);
        assert_eq!(node.fields, vec!["client", "server"]);
        assert_eq!(node.search_ids, vec!["s1"]);
        assert_eq!(node.count(), 2);
    }

    #[test]
    fn arena_keeps_upsert_order_after_retain() {
        let mut arena = ["a", "b", "c"].into_iter().map(node).collect::<NodeArena>();
        arena.retain(|node| node.id != "b");

        let ids = arena.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(arena.index_of("c"), Some(1));
        assert!(!arena.contains("b"));
    }

    #[test]
    fn upsert_creates_once() {
        let mut arena = NodeArena::new();
        arena.upsert_with("x", || node("x")).items.push("r1".to_owned());
        arena.upsert_with("x", || panic!("node already exists"));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get("x").map(Node::count), Some(1));
    }

    #[test]
    fn only_plain_items_are_deletable() {
        let mut parent = node("p");
        parent.is_normalization_parent = true;
        let connector = Node::new("c", "C".to_owned(), NodeKind::Connector, 40);

        assert!(node("a").is_deletable());
        assert!(!parent.is_deletable());
        assert!(!connector.is_deletable());
    }
}
