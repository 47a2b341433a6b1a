use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use record_graph::layout::{
    LayoutLink, LayoutNode, LayoutWorker, PhysicsConfig, Pin, StalenessPolicy, Tick, TickSink,
    apply_tick,
};

#[derive(Default)]
struct Placement {
    nodes: HashMap<i32, Vec2>,
    links: HashMap<i32, (Vec2, Vec2)>,
}

impl Placement {
    fn expecting(nodes: &[i32], links: &[i32]) -> Self {
        Self {
            nodes: nodes.iter().map(|hash| (*hash, Vec2::ZERO)).collect(),
            links: links.iter().map(|hash| (*hash, (Vec2::ZERO, Vec2::ZERO))).collect(),
        }
    }
}

impl TickSink for Placement {
    fn place_node(&mut self, hash: i32, position: Vec2) -> bool {
        match self.nodes.get_mut(&hash) {
            Some(slot) => {
                *slot = position;
                true
            }
            None => false,
        }
    }

    fn place_link(&mut self, hash: i32, source: Vec2, target: Vec2) -> bool {
        match self.links.get_mut(&hash) {
            Some(slot) => {
                *slot = (source, target);
                true
            }
            None => false,
        }
    }
}

fn node(hash: i32) -> LayoutNode {
    LayoutNode {
        hash,
        mass: 1.0,
        radius: 8.0,
        fx: None,
        fy: None,
    }
}

fn link(hash: i32, source: i32, target: i32) -> LayoutLink {
    LayoutLink {
        hash,
        source,
        target,
    }
}

/// Polls until a tick of at least `generation` arrives.
fn tick_for(worker: &mut LayoutWorker, generation: u64) -> Tick {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(tick) = worker.drain()
            && StalenessPolicy::Generation.accepts(&tick, generation)
        {
            return tick;
        }
        assert!(Instant::now() < deadline, "no tick for generation {generation}");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn worker_places_every_node_of_the_latest_update() {
    let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
    let generation = worker
        .update(vec![node(1), node(2), node(3)], vec![link(10, 1, 2), link(11, 2, 3)])
        .unwrap();

    let tick = tick_for(&mut worker, generation);
    let mut placement = Placement::expecting(&[1, 2, 3], &[10, 11]);
    let outcome = apply_tick(&tick, &mut placement);

    assert!(outcome.complete);
    assert_eq!(outcome.nodes, 3);
    assert_eq!(outcome.links, 2);
    assert!(
        placement
            .nodes
            .values()
            .all(|position| position.x.is_finite() && position.y.is_finite())
    );
}

#[test]
fn newer_topology_supersedes_older_ticks() {
    let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
    let first = worker
        .update(vec![node(1), node(2)], vec![link(10, 1, 2)])
        .unwrap();
    let second = worker.update(vec![node(1), node(3)], Vec::new()).unwrap();
    assert!(second > first);

    let tick = tick_for(&mut worker, second);
    let mut placement = Placement::expecting(&[1, 3], &[]);
    let outcome = apply_tick(&tick, &mut placement);

    assert!(outcome.complete);
    assert_eq!(outcome.nodes, 2);
}

#[test]
fn pinned_nodes_follow_their_pin() {
    let mut worker = LayoutWorker::spawn(PhysicsConfig::default()).unwrap();
    worker
        .update(vec![node(1), node(2)], vec![link(10, 1, 2)])
        .unwrap();
    worker
        .restart(vec![Pin {
            hash: 1,
            x: 250.0,
            y: -40.0,
        }])
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(tick) = worker.drain() {
            let mut placement = Placement::expecting(&[1, 2], &[10]);
            apply_tick(&tick, &mut placement);
            if placement.nodes[&1] == Vec2::new(250.0, -40.0) {
                break;
            }
        }
        assert!(Instant::now() < deadline, "pin never reached the tick stream");
        thread::sleep(Duration::from_millis(5));
    }
}
