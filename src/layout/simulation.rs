use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::physics::{Body, PhysicsConfig, PhysicsScratch, StepParams, step};
use super::protocol::{LayoutLink, LayoutNode, Pin, Tick};
use crate::util::stable_pair;

const FRAME_SECONDS: f32 = 1.0 / 60.0;
const RESTART_ALPHA: f32 = 0.3;

struct SimLink {
    hash: i32,
    source: usize,
    target: usize,
}

/// Everything the layout worker knows, owned by the worker for its lifetime.
pub struct Simulation {
    config: PhysicsConfig,
    bodies: Vec<Body>,
    hashes: Vec<i32>,
    anchors: Vec<Option<Vec2>>,
    drag_pins: Vec<Option<Vec2>>,
    index_by_hash: HashMap<i32, usize>,
    links: Vec<SimLink>,
    springs: Vec<(usize, usize)>,
    alpha: f32,
    generation: u64,
    area_forces: bool,
    viewport: Option<Vec2>,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            hashes: Vec::new(),
            anchors: Vec::new(),
            drag_pins: Vec::new(),
            index_by_hash: HashMap::new(),
            links: Vec::new(),
            springs: Vec::new(),
            alpha: 0.0,
            generation: 0,
            area_forces: true,
            viewport: None,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn position(&self, hash: i32) -> Option<Vec2> {
        self.index_by_hash
            .get(&hash)
            .map(|&index| self.bodies[index].position)
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Replaces the topology. Bodies that survive keep their position,
    /// velocity and drag pin; their topology anchor is whatever this update
    /// says. New ones are placed next to a linked survivor when there is one,
    /// otherwise on a ring around the origin.
    pub fn update(&mut self, generation: u64, nodes: &[LayoutNode], links: &[LayoutLink]) {
        let previous = std::mem::take(&mut self.index_by_hash);
        let old_bodies = std::mem::take(&mut self.bodies);
        let old_drag_pins = std::mem::take(&mut self.drag_pins);

        self.hashes.clear();
        self.anchors.clear();
        let mut fresh = Vec::new();
        for node in nodes {
            if self.index_by_hash.contains_key(&node.hash) {
                continue;
            }
            let index = self.bodies.len();
            self.index_by_hash.insert(node.hash, index);
            self.hashes.push(node.hash);
            self.anchors.push(node.anchor());

            let mass = node.mass.max(1.0).sqrt();
            let body = match previous.get(&node.hash) {
                Some(&old) => {
                    let drag_pin = old_drag_pins[old];
                    self.drag_pins.push(drag_pin);
                    Body {
                        radius: node.radius,
                        mass,
                        pin: drag_pin.or(node.anchor()),
                        ..old_bodies[old]
                    }
                }
                None => {
                    fresh.push(index);
                    self.drag_pins.push(None);
                    Body {
                        pin: node.anchor(),
                        ..Body::new(node.anchor().unwrap_or(Vec2::ZERO), node.radius, mass)
                    }
                }
            };
            self.bodies.push(body);
        }

        self.links.clear();
        self.springs.clear();
        for link in links {
            let (Some(&source), Some(&target)) = (
                self.index_by_hash.get(&link.source),
                self.index_by_hash.get(&link.target),
            ) else {
                continue;
            };
            if source == target {
                continue;
            }
            self.links.push(SimLink {
                hash: link.hash,
                source,
                target,
            });
            self.springs.push((source, target));
        }

        self.seed(&fresh, &previous);
        self.generation = generation;
        self.alpha = 1.0;
        debug!(
            generation,
            bodies = self.bodies.len(),
            links = self.links.len(),
            seeded = fresh.len(),
            "simulation topology updated"
        );
    }

    fn seed(&mut self, fresh: &[usize], previous: &HashMap<i32, usize>) {
        let count = self.bodies.len();
        let mut base_radius = (count as f32).sqrt() * 360.0;
        if let Some(viewport) = self.viewport {
            base_radius = base_radius.min(viewport.max_elem() * 0.5).max(40.0);
        }

        for &index in fresh {
            if self.bodies[index].pin.is_some() {
                continue;
            }
            let hash = self.hashes[index];
            let (jx, jy) = stable_pair(hash);
            let jitter = vec2(jx, jy);

            let neighbour = self.springs.iter().find_map(|&(a, b)| {
                let other = if a == index { b } else if b == index { a } else { return None };
                previous
                    .contains_key(&self.hashes[other])
                    .then_some(self.bodies[other].position)
            });
            self.bodies[index].position = match neighbour {
                Some(anchor) => anchor + jitter * 40.0,
                None => {
                    let angle = (index as f32 / count as f32) * TAU;
                    vec2(angle.cos(), angle.sin()) * base_radius + jitter * 160.0
                }
            };
        }
    }

    /// Pins bodies to new coordinates and wakes the simulation.
    pub fn restart(&mut self, pins: &[Pin]) {
        for pin in pins {
            if let Some(&index) = self.index_by_hash.get(&pin.hash) {
                let anchor = vec2(pin.x, pin.y);
                self.drag_pins[index] = Some(anchor);
                self.bodies[index].pin = Some(anchor);
                self.bodies[index].position = anchor;
                self.bodies[index].velocity = Vec2::ZERO;
            }
        }
        self.alpha = self.alpha.max(RESTART_ALPHA);
    }

    /// Drops drag pins. Anchors that came with the topology stay.
    pub fn release(&mut self, hashes: &[i32]) {
        for hash in hashes {
            if let Some(&index) = self.index_by_hash.get(hash) {
                self.drag_pins[index] = None;
                self.bodies[index].pin = self.anchors[index];
            }
        }
        self.alpha = self.alpha.max(RESTART_ALPHA);
    }

    pub fn set_area_forces(&mut self, active: bool, width: f32, height: f32) {
        self.area_forces = active;
        if width > 0.0 && height > 0.0 {
            self.viewport = Some(vec2(width, height));
        }
        self.alpha = self.alpha.max(RESTART_ALPHA);
    }

    /// Runs one physics step and encodes the result. `None` once the
    /// simulation has cooled down.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.is_settled() {
            return None;
        }

        step(
            &mut self.bodies,
            &self.springs,
            self.config,
            StepParams {
                alpha: self.alpha,
                area_forces: self.area_forces,
                delta_seconds: FRAME_SECONDS,
            },
            &mut self.scratch,
        );
        self.alpha *= 1.0 - self.config.alpha_decay.clamp(0.0, 1.0);

        let bodies = &self.bodies;
        Some(Tick::encode(
            self.generation,
            self.hashes
                .iter()
                .zip(bodies)
                .map(|(&hash, body)| (hash, body.position)),
            self.links.iter().map(|link| {
                (
                    link.hash,
                    bodies[link.source].position,
                    bodies[link.target].position,
                )
            }),
        ))
    }
}
