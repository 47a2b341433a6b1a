use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

#[derive(Clone, Copy, Debug)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

impl Repulsion {
    fn push(self, from: Vec2, source: Vec2, mass: f32) -> Vec2 {
        let delta = from - source;
        let distance_sq = delta.length_sq();
        let distance = distance_sq.sqrt();
        let direction = if distance > 0.0001 {
            delta / distance
        } else {
            vec2(1.0, 0.0)
        };
        direction * (self.strength * mass / (distance_sq + self.softening))
    }
}

/// Repulsion felt by body `index` from every other body under `cell`. Far
/// cells are approximated by their centre of mass.
pub(super) fn repulsion_on(
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    masses: &[f32],
    repulsion: Repulsion,
) -> Vec2 {
    if cell.mass <= 0.0 {
        return Vec2::ZERO;
    }

    let point = positions[index];
    if cell.is_leaf() {
        return cell
            .members
            .iter()
            .filter(|&&other| other != index)
            .map(|&other| repulsion.push(point, positions[other], masses[other]))
            .fold(Vec2::ZERO, |sum, force| sum + force);
    }

    let distance = (point - cell.center_of_mass).length().max(0.01);
    let far_enough = !cell.square.contains(point)
        && cell.square.side_length() / distance < repulsion.theta
        && cell.mass > 1.0;
    if far_enough {
        return repulsion.push(point, cell.center_of_mass, cell.mass);
    }

    cell.children()
        .map(|child| repulsion_on(child, index, positions, masses, repulsion))
        .fold(Vec2::ZERO, |sum, force| sum + force)
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Collision {
    pub(super) strength: f32,
    /// Bodies closer than `(r_a + r_b) * padding` push each other apart.
    pub(super) padding: f32,
    pub(super) reach_sq: f32,
}

fn push_apart(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    collision: Collision,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = (radii[from] + radii[to]) * collision.padding;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    };
    let push = direction * (min_distance - distance) * collision.strength;
    forces[from] += push;
    forces[to] -= push;
}

/// Dual-tree walk over cell pairs that are close enough to hold overlapping
/// bodies. Pass the same cell twice with `same = true` for the root call.
pub(super) fn collide(
    a: &Cell,
    b: &Cell,
    same: bool,
    positions: &[Vec2],
    radii: &[f32],
    collision: Collision,
    forces: &mut [Vec2],
) {
    if a.square.gap_sq(b.square) > collision.reach_sq {
        return;
    }

    if a.is_leaf() && b.is_leaf() {
        if same {
            for (offset, &from) in a.members.iter().enumerate() {
                for &to in &a.members[offset + 1..] {
                    push_apart(from, to, positions, radii, collision, forces);
                }
            }
        } else {
            for &from in &a.members {
                for &to in &b.members {
                    push_apart(from, to, positions, radii, collision, forces);
                }
            }
        }
        return;
    }

    if same {
        let children = a.children().collect::<Vec<_>>();
        for (offset, first) in children.iter().enumerate() {
            collide(first, first, true, positions, radii, collision, forces);
            for second in &children[offset + 1..] {
                collide(first, second, false, positions, radii, collision, forces);
            }
        }
        return;
    }

    let split_a = !a.is_leaf() && (b.is_leaf() || a.square.half_extent >= b.square.half_extent);
    if split_a {
        for child in a.children() {
            collide(child, b, false, positions, radii, collision, forces);
        }
    } else {
        for child in b.children() {
            collide(a, child, false, positions, radii, collision, forces);
        }
    }
}
