use eframe::egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 3.0;

/// Pan and zoom of the canvas. World coordinates are centred on the canvas
/// rect, so the transform is independent of where the canvas sits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Zooms by `factor`, keeping the world point under `pointer` fixed.
    /// Returns whether the transform changed.
    pub fn zoom_about(&mut self, rect: Rect, pointer: Pos2, factor: f32) -> bool {
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() <= f32::EPSILON {
            return false;
        }

        let world_before = self.screen_to_world(rect, pointer);
        self.zoom = zoom;
        self.pan = pointer - rect.center() - (world_before * self.zoom);
        true
    }

    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }
        self.pan += delta;
        true
    }

    /// On-screen radius of a node. Grows slower than the zoom so dense
    /// graphs stay readable when zoomed out.
    pub fn screen_radius(&self, base_radius: f32) -> f32 {
        (base_radius * self.zoom.powf(0.40)).clamp(2.5, 46.0)
    }

    pub fn world_radius(&self, base_radius: f32) -> f32 {
        self.screen_radius(base_radius) / self.zoom
    }
}

/// First body, in iteration order, whose drawn circle contains `pointer`
/// (world space).
pub fn hit_test<I>(transform: &ViewTransform, pointer: Vec2, bodies: I) -> Option<usize>
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    bodies
        .into_iter()
        .position(|(center, base_radius)| {
            let radius = transform.world_radius(base_radius);
            (center - pointer).length_sq() <= radius * radius
        })
}

/// Indices of the bodies whose centre lies inside the world-space rectangle
/// spanned by `a` and `b`.
pub fn nodes_in_rect<I>(a: Vec2, b: Vec2, positions: I) -> Vec<usize>
where
    I: IntoIterator<Item = Vec2>,
{
    let area = Rect::from_two_pos(a.to_pos2(), b.to_pos2());
    positions
        .into_iter()
        .enumerate()
        .filter(|(_, position)| area.contains(position.to_pos2()))
        .map(|(index, _)| index)
        .collect()
}
