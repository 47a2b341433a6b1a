//! Messages exchanged with the layout worker.
//!
//! Topology goes out as structured [`Outbound`] messages. Positions come back
//! as one flat [`Tick`] buffer:
//!
//! ```text
//! [count, (hash, x, y) * count, (link_hash, source_x, source_y, target_x, target_y) * ..]
//! ```

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

const NODE_STRIDE: usize = 3;
const LINK_STRIDE: usize = 5;

/// Projection of a node the simulation needs. `mass` is the record count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutNode {
    pub hash: i32,
    pub mass: f32,
    pub radius: f32,
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl LayoutNode {
    pub fn anchor(&self) -> Option<Vec2> {
        match (self.fx, self.fy) {
            (Some(x), Some(y)) => Some(vec2(x, y)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutLink {
    pub hash: i32,
    pub source: i32,
    pub target: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pin {
    pub hash: i32,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    Update {
        generation: u64,
        nodes: Vec<LayoutNode>,
        links: Vec<LayoutLink>,
    },
    Restart {
        pins: Vec<Pin>,
    },
    Release {
        hashes: Vec<i32>,
    },
    SetAreaForces {
        active: bool,
        width: f32,
        height: f32,
    },
    Shutdown,
}

impl Outbound {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
            Self::Restart { .. } => "restart",
            Self::Release { .. } => "release",
            Self::SetAreaForces { .. } => "set_area_forces",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub generation: u64,
    pub buffer: Vec<f64>,
}

impl Tick {
    pub fn encode<N, L>(generation: u64, nodes: N, links: L) -> Self
    where
        N: ExactSizeIterator<Item = (i32, Vec2)>,
        L: Iterator<Item = (i32, Vec2, Vec2)>,
    {
        let node_count = nodes.len();
        let (link_hint, _) = links.size_hint();
        let mut buffer =
            Vec::with_capacity(1 + node_count * NODE_STRIDE + link_hint * LINK_STRIDE);
        buffer.push(node_count as f64);
        for (hash, position) in nodes {
            buffer.extend([f64::from(hash), f64::from(position.x), f64::from(position.y)]);
        }
        for (hash, source, target) in links {
            buffer.extend([
                f64::from(hash),
                f64::from(source.x),
                f64::from(source.y),
                f64::from(target.x),
                f64::from(target.y),
            ]);
        }
        Self { generation, buffer }
    }

    pub fn node_count(&self) -> usize {
        self.buffer
            .first()
            .and_then(|&count| whole_number(count))
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0)
    }
}

/// Receiver of decoded tick entries. Returning `false` marks the hash as
/// unknown and stops the decode.
pub trait TickSink {
    fn place_node(&mut self, hash: i32, position: Vec2) -> bool;
    fn place_link(&mut self, hash: i32, source: Vec2, target: Vec2) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub nodes: usize,
    pub links: usize,
    /// False when decoding stopped early on an unknown hash or a short buffer.
    pub complete: bool,
}

/// Feeds a tick into `sink`, stopping at the first entry it does not
/// recognise. Entries applied before that point stay applied.
pub fn apply_tick(tick: &Tick, sink: &mut impl TickSink) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let buffer = tick.buffer.as_slice();
    let Some(node_count) = buffer
        .first()
        .and_then(|&count| whole_number(count))
        .and_then(|count| usize::try_from(count).ok())
    else {
        return outcome;
    };

    let nodes_end = 1 + node_count * NODE_STRIDE;
    if buffer.len() < nodes_end {
        return outcome;
    }
    for entry in buffer[1..nodes_end].chunks_exact(NODE_STRIDE) {
        let Some(hash) = entry_hash(entry[0]) else {
            return outcome;
        };
        if !sink.place_node(hash, point(entry[1], entry[2])) {
            return outcome;
        }
        outcome.nodes += 1;
    }

    let links = buffer[nodes_end..].chunks_exact(LINK_STRIDE);
    // A torn trailing entry still lets the whole ones through.
    let torn = !links.remainder().is_empty();
    for entry in links {
        if !place_link(entry, sink) {
            return outcome;
        }
        outcome.links += 1;
    }

    outcome.complete = !torn;
    outcome
}

fn place_link(entry: &[f64], sink: &mut impl TickSink) -> bool {
    match entry_hash(entry[0]) {
        Some(hash) => sink.place_link(
            hash,
            point(entry[1], entry[2]),
            point(entry[3], entry[4]),
        ),
        None => false,
    }
}

fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

fn entry_hash(value: f64) -> Option<i32> {
    whole_number(value).and_then(|value| i32::try_from(value).ok())
}

fn point(x: f64, y: f64) -> Vec2 {
    vec2(x as f32, y as f32)
}

/// How ticks for a superseded topology are recognised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalenessPolicy {
    /// Only the unknown-hash check in [`apply_tick`].
    Heuristic,
    /// Additionally drop ticks older than the latest `update` sent.
    #[default]
    Generation,
}

impl StalenessPolicy {
    pub fn accepts(self, tick: &Tick, latest_update: u64) -> bool {
        match self {
            Self::Heuristic => true,
            Self::Generation => tick.generation >= latest_update,
        }
    }
}
