use std::collections::{HashMap, HashSet};

use super::GraphState;
use crate::graph::link::{Link, LinkArena};
use crate::graph::node::{Node, NodeArena};
use crate::graph::normalization::normalize_nodes;
use crate::graph::via::apply_via;
use crate::util::pair_hash;

/// The graph as collaborators see it: soft-deleted nodes removed,
/// normalizations and via rules applied, flags and display limits filled in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphView {
    pub nodes: NodeArena,
    pub links: LinkArena,
}

impl GraphView {
    pub fn displayed_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.display)
    }

    pub fn displayed_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|link| link.display)
    }
}

pub(super) fn derive_view(state: &GraphState) -> GraphView {
    let live = state
        .graph
        .nodes
        .iter()
        .filter(|node| !state.deleted.contains(&node.id))
        .cloned()
        .collect::<Vec<_>>();
    let normalized = normalize_nodes(&live, &state.normalizations);

    let replacement_by_rule = state
        .normalizations
        .iter()
        .map(|normalization| (normalization.id.as_str(), normalization.replace_with.as_str()))
        .collect::<HashMap<_, _>>();
    let parent_of = normalized
        .iter()
        .filter(|node| !node.is_normalization_parent)
        .filter_map(|node| {
            let rule = node.normalization_id.as_deref()?;
            Some((node.id.as_str(), *replacement_by_rule.get(rule)?))
        })
        .collect::<HashMap<_, _>>();

    let mut nodes = normalized
        .iter()
        .filter(|node| node.is_visible())
        .cloned()
        .collect::<NodeArena>();

    let links = merge_links(state, &parent_of);
    let mut links = apply_via(&links, &state.vias, |id| nodes.contains(id));

    assign_wire_hashes(&mut nodes, &mut links);
    mark_nodes(state, &mut nodes);
    mark_links(&nodes, &mut links);

    GraphView { nodes, links }
}

/// Copy of `view` with only the per-node and per-link flags recomputed, for
/// transitions that leave nodes, links and rules untouched.
pub(super) fn refresh_flags(state: &GraphState, view: &GraphView) -> GraphView {
    let mut view = view.clone();
    mark_nodes(state, &mut view.nodes);
    mark_links(&view.nodes, &mut view.links);
    view
}

/// Re-targets canonical links onto normalization parents. Links that collapse
/// onto one endpoint pair merge, and `total` counts how many merged.
fn merge_links(state: &GraphState, parent_of: &HashMap<&str, &str>) -> LinkArena {
    let resolve = |id: &str| parent_of.get(id).copied().unwrap_or(id).to_owned();
    let mut merged = LinkArena::new();

    for link in state.graph.links.iter() {
        if state.deleted.contains(&link.source) || state.deleted.contains(&link.target) {
            continue;
        }

        let source = resolve(&link.source);
        let target = resolve(&link.target);
        if source == target {
            continue;
        }

        if let Some(existing) = merged.get_mut(&source, &target) {
            existing.total += 1;
            for item in &link.item_ids {
                existing.add_item(item);
            }
            continue;
        }

        let mut view_link = link.clone();
        view_link.hash = pair_hash(&source, &target);
        view_link.source = source;
        view_link.target = target;
        merged.insert(view_link);
    }

    merged
}

/// Makes node hashes unique within the view, and link hashes among links,
/// so the layout wire can address every entry. A colliding hash moves to the
/// next free value, in arena order.
fn assign_wire_hashes(nodes: &mut NodeArena, links: &mut LinkArena) {
    let mut taken = HashSet::new();
    for node in nodes.iter_mut() {
        while !taken.insert(node.hash) {
            node.hash = node.hash.wrapping_add(1);
        }
    }

    taken.clear();
    for link in links.iter_mut() {
        while !taken.insert(link.hash) {
            link.hash = link.hash.wrapping_add(1);
        }
    }
}

fn mark_nodes(state: &GraphState, nodes: &mut NodeArena) {
    let selected = state.selected.iter().collect::<HashSet<_>>();
    let highlighted = state.highlighted.iter().collect::<HashSet<_>>();
    let tooltip = state.tooltip.iter().collect::<HashSet<_>>();
    let limits = state
        .searches
        .iter()
        .map(|search| (search.search_id.as_str(), search.display_nodes))
        .collect::<HashMap<_, _>>();
    let mut shown_per_search = HashMap::<String, usize>::new();

    for node in nodes.iter_mut() {
        node.selected = selected.contains(&node.id);
        node.highlighted = highlighted.contains(&node.id);
        node.display_tooltip = tooltip.contains(&node.id);
        node.important = state.important.contains(&node.id);
        node.description = state.notes.get(&node.id).cloned().unwrap_or_default();

        let mut display = true;
        for search_id in &node.search_ids {
            let shown = shown_per_search.entry(search_id.clone()).or_default();
            *shown += 1;
            if limits.get(search_id.as_str()).is_some_and(|limit| *shown > *limit) {
                display = false;
            }
        }
        node.display = display;
    }
}

fn mark_links(nodes: &NodeArena, links: &mut LinkArena) {
    for link in links.iter_mut() {
        let source = nodes.get(&link.source);
        let target = nodes.get(&link.target);
        link.display = source.is_some_and(|node| node.display) && target.is_some_and(|node| node.display);
        link.highlighted =
            source.is_some_and(|node| node.highlighted) && target.is_some_and(|node| node.highlighted);
    }
}
