mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use forces::{Collision, Repulsion, collide, repulsion_on};
use quadtree::Cell;

const BARNES_HUT_THETA: f32 = 0.72;
const SOFTENING: f32 = 620.0;
const COLLISION_PADDING: f32 = 4.2;

/// Knobs for the force model. Scales are clamped to sane ranges on use.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub intensity: f32,
    pub repulsion_scale: f32,
    pub spring_scale: f32,
    pub collision_scale: f32,
    pub velocity_damping: f32,
    pub target_spread: f32,
    pub spread_force: f32,
    /// Fraction of the remaining heat lost per tick.
    pub alpha_decay: f32,
    /// Below this alpha the simulation counts as settled.
    pub alpha_min: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            repulsion_scale: 2.6,
            spring_scale: 0.2,
            collision_scale: 1.0,
            velocity_damping: 0.9,
            target_spread: 2.0,
            spread_force: 0.08,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub pin: Option<Vec2>,
}

impl Body {
    pub fn new(position: Vec2, radius: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            mass,
            pin: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StepParams {
    pub alpha: f32,
    /// Repulsion, centre pull, spread and recentring. Off in map mode.
    pub area_forces: bool,
    pub delta_seconds: f32,
}

#[derive(Default)]
pub struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    masses: Vec<f32>,
}

/// Advances every body by one tick. Returns whether anything moved.
pub fn step(
    bodies: &mut [Body],
    springs: &[(usize, usize)],
    config: PhysicsConfig,
    params: StepParams,
    scratch: &mut PhysicsScratch,
) -> bool {
    let body_count = bodies.len();
    for body in bodies.iter_mut() {
        if let Some(pin) = body.pin {
            body.position = pin;
            body.velocity = Vec2::ZERO;
        }
    }
    if body_count < 2 {
        return false;
    }

    scratch.forces.clear();
    scratch.forces.resize(body_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    scratch.masses.clear();
    let mut max_radius = 0.0_f32;
    for body in bodies.iter() {
        scratch.positions.push(body.position);
        scratch.radii.push(body.radius);
        scratch.masses.push(body.mass.max(0.01));
        max_radius = max_radius.max(body.radius);
    }

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;
    let masses = &scratch.masses;

    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 78_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let spring_strength = 0.016 * intensity * config.spring_scale.clamp(0.2, 2.2);
    let spring_damping = 0.22;
    let collision_strength = 1.9 * intensity * config.collision_scale.clamp(0.2, 2.0);
    let center_pull = 0.0011 * intensity;
    let damping = (config.velocity_damping - (intensity * 0.015)).clamp(0.78, 0.97);
    let time_step_scale = (params.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);
    let alpha = params.alpha.clamp(0.0, 1.0);

    if let Some(root) = Cell::build(positions, masses) {
        if params.area_forces {
            let repulsion = Repulsion {
                strength: repulsion_strength,
                softening: SOFTENING,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                *force += repulsion_on(&root, index, positions, masses, repulsion);
            }
        }

        let max_collision_distance = (max_radius * 2.0) * COLLISION_PADDING;
        if max_collision_distance > 0.0 {
            collide(
                &root,
                &root,
                true,
                positions,
                radii,
                Collision {
                    strength: collision_strength,
                    padding: COLLISION_PADDING,
                    reach_sq: max_collision_distance * max_collision_distance,
                },
                forces,
            );
        }
    }

    for &(from, to) in springs {
        if from >= body_count || to >= body_count || from == to {
            continue;
        }

        let delta = bodies[from].position - bodies[to].position;
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        let preferred = 96.0 + (bodies[from].radius + bodies[to].radius) * 4.0;
        let spring = (distance - preferred) * spring_strength;
        let relative_velocity = bodies[from].velocity - bodies[to].velocity;
        let damping_force = relative_velocity.dot(direction) * spring_damping;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    if params.area_forces {
        for (force, body) in forces.iter_mut().zip(bodies.iter()) {
            *force -= body.position * center_pull;
        }
        apply_spread(bodies, forces, config, intensity);
    }

    let max_force = 165.0 + (intensity * 90.0);
    let max_force_sq = max_force * max_force;
    let max_speed = 11.0 + (intensity * 15.0);
    let max_speed_sq = max_speed * max_speed;
    let min_sleep_speed_sq = 0.02 * 0.02;
    let min_sleep_force_sq = 0.08 * 0.08;
    let mut any_motion = false;
    let mut average_velocity = Vec2::ZERO;
    let mut free_count = 0usize;
    for (body, force_value) in bodies.iter_mut().zip(forces.iter()) {
        if body.pin.is_some() {
            continue;
        }

        let mut force = *force_value * alpha;
        let force_sq = force.length_sq();
        if force_sq > max_force_sq {
            force *= max_force / force_sq.sqrt();
        }

        let mut velocity = (body.velocity + (force * (0.055 * time_step_scale))) * damping_factor;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= max_speed / speed_sq.sqrt();
            speed_sq = max_speed_sq;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        body.velocity = velocity;
        body.position += velocity * time_step_scale;
        average_velocity += velocity;
        free_count += 1;
        if speed_sq > 0.000_001 {
            any_motion = true;
        }
    }

    // Recentring would drag pinned bodies away from their anchors.
    let pinned = free_count < body_count;
    if params.area_forces && !pinned && free_count > 0 {
        average_velocity /= free_count as f32;
        if average_velocity.length_sq() > 0.000_001 {
            for body in bodies.iter_mut() {
                body.velocity -= average_velocity;
            }
        }

        let centroid = bodies
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / body_count as f32;
        if centroid.length_sq() > 0.000_001 {
            for body in bodies.iter_mut() {
                body.position -= centroid;
            }
        }
    }

    any_motion
}

fn apply_spread(bodies: &[Body], forces: &mut [Vec2], config: PhysicsConfig, intensity: f32) {
    let spread_force = config.spread_force.clamp(0.0, 0.08) * intensity;
    if spread_force <= 0.0 || bodies.is_empty() {
        return;
    }

    let target_radius = (bodies.len() as f32).sqrt() * 42.0 * config.target_spread.clamp(0.6, 2.0);
    let average_radius =
        bodies.iter().map(|body| body.position.length()).sum::<f32>() / bodies.len() as f32;
    let radius_error = average_radius - target_radius;
    let hard_limit = target_radius * 1.55;
    for (index, (force, body)) in forces.iter_mut().zip(bodies).enumerate() {
        let radius = body.position.length();
        let direction = if radius > 0.0001 {
            body.position / radius
        } else {
            let angle = ((index as f32) * 0.618_034 + 0.37) * std::f32::consts::TAU;
            vec2(angle.cos(), angle.sin())
        };

        *force -= direction * radius_error * spread_force;
        if radius > hard_limit {
            *force -= direction * (radius - hard_limit) * ((spread_force * 2.6) + 0.02);
        }
    }
}
