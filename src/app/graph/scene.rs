use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;

use crate::graph::GraphView;
use crate::layout::TickSink;
use crate::render::node_radius;

const FALLBACK_RADIUS: f32 = 6.0;

/// World-space placement of the displayed graph, keyed by wire hash. Only
/// hashes of the current topology are accepted from ticks.
#[derive(Default)]
pub(in crate::app) struct Scene {
    radii: HashMap<i32, f32>,
    positions: HashMap<i32, Vec2>,
    links: HashSet<i32>,
    link_positions: HashMap<i32, (Vec2, Vec2)>,
}

impl Scene {
    /// Adopts the displayed nodes and links of `view`. Survivors keep their
    /// last known position.
    pub(in crate::app) fn sync(&mut self, view: &GraphView) {
        let (min, max) = view
            .displayed_nodes()
            .fold((usize::MAX, 1), |(min, max), node| {
                let count = node.count().max(1);
                (min.min(count), max.max(count))
            });
        let min = min.min(max);

        self.radii = view
            .displayed_nodes()
            .map(|node| (node.hash, node_radius(node.count(), min, max)))
            .collect();
        self.positions.retain(|hash, _| self.radii.contains_key(hash));

        self.links = view.displayed_links().map(|link| link.hash).collect();
        self.link_positions.retain(|hash, _| self.links.contains(hash));
    }

    pub(in crate::app) fn position(&self, hash: i32) -> Option<Vec2> {
        self.positions.get(&hash).copied()
    }

    pub(in crate::app) fn radius(&self, hash: i32) -> f32 {
        self.radii.get(&hash).copied().unwrap_or(FALLBACK_RADIUS)
    }

    pub(in crate::app) fn link_endpoints(&self, hash: i32) -> Option<(Vec2, Vec2)> {
        self.link_positions.get(&hash).copied()
    }

    pub(in crate::app) fn len(&self) -> usize {
        self.radii.len()
    }

    pub(in crate::app) fn placed(&self) -> usize {
        self.positions.len()
    }

    /// Moves a node right away, ahead of the worker's next tick.
    pub(in crate::app) fn place(&mut self, hash: i32, position: Vec2) {
        if self.radii.contains_key(&hash) {
            self.positions.insert(hash, position);
        }
    }
}

impl TickSink for Scene {
    fn place_node(&mut self, hash: i32, position: Vec2) -> bool {
        if !self.radii.contains_key(&hash) {
            return false;
        }
        self.positions.insert(hash, position);
        true
    }

    fn place_link(&mut self, hash: i32, source: Vec2, target: Vec2) -> bool {
        if !self.links.contains(&hash) {
            return false;
        }
        self.link_positions.insert(hash, (source, target));
        true
    }
}
