use std::collections::HashMap;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, StrokeKind,
    TextureOptions, Ui, pos2, vec2,
};

use crate::render::geometry::{blend_color, circle_visible, dim_color, edge_visible, link_width};
use crate::render::{Aspect, Layer, NodeAppearance, ViewTransform, rasterize};
use crate::util::abbreviate;

use super::super::ViewModel;
use super::DragState;

const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const SELECTION_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const IMPORTANT_COLOR: Color32 = Color32::from_rgb(247, 194, 111);

/// Shapes of every layer as last built. Layers are rebuilt only while one of
/// the aspects they depend on is dirty.
#[derive(Default)]
pub(in crate::app) struct LayerCache {
    shapes: HashMap<Layer, Vec<Shape>>,
    rebuilds: usize,
}

impl LayerCache {
    pub(in crate::app) fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

fn draw_background(painter: &Painter, rect: Rect, transform: &ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + transform.pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.canvas != Some(rect) {
            self.canvas = Some(rect);
            self.dirty.mark(Aspect::Transform);
            let map_active = self.store.state().map_active();
            self.send_area_forces(!map_active);
        }

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        let hovered = self.handle_graph_pointer(ui, rect, &response);

        draw_background(&painter, rect, &self.transform);

        for layer in self.dirty.dirty_layers() {
            let shapes = match layer {
                Layer::Links => self.link_shapes(rect),
                Layer::Nodes => self.node_shapes(ui.ctx(), &painter, rect),
                Layer::Labels => self.label_shapes(&painter, rect),
                Layer::Selection => self.selection_shapes(rect),
                Layer::Tooltip => self.tooltip_shapes(&painter, rect),
            };
            self.layers.shapes.insert(layer, shapes);
            self.layers.rebuilds += 1;
        }
        self.dirty.finish_frame();

        for layer in Layer::ALL {
            if let Some(shapes) = self.layers.shapes.get(&layer) {
                painter.extend(shapes.iter().cloned());
            }
        }

        if let Some(DragState::Band { origin, current }) = self.drag {
            let band = Rect::from_two_pos(
                self.transform.world_to_screen(rect, origin),
                self.transform.world_to_screen(rect, current),
            );
            painter.rect_filled(band, 0.0, Color32::from_rgba_unmultiplied(103, 196, 255, 28));
            painter.rect_stroke(
                band,
                0.0,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(103, 196, 255, 160)),
                StrokeKind::Inside,
            );
            ui.ctx().request_repaint();
        }

        if let Some(node) = hovered.and_then(|id| self.store.view().nodes.get(&id)) {
            let links = self
                .store
                .view()
                .displayed_links()
                .filter(|link| link.touches(&node.id))
                .count();
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {} records  |  links {}",
                    node.abbreviated,
                    node.count(),
                    links
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.scene.len() == 0 {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes to display.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
        }
    }

    fn link_shapes(&self, rect: Rect) -> Vec<Shape> {
        let view = self.store.view();
        let dimmed = !self.store.state().highlighted().is_empty();
        let zoom_sqrt = self.transform.zoom.sqrt();
        let mut shapes = Vec::new();

        for link in view.displayed_links() {
            let endpoints = self.scene.link_endpoints(link.hash).or_else(|| {
                let source = view.nodes.get(&link.source)?;
                let target = view.nodes.get(&link.target)?;
                Some((
                    self.scene.position(source.hash)?,
                    self.scene.position(target.hash)?,
                ))
            });
            let Some((source, target)) = endpoints else {
                continue;
            };

            let start = self.transform.world_to_screen(rect, source);
            let end = self.transform.world_to_screen(rect, target);
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let stroke = if link.highlighted {
                Stroke::new(
                    (2.5 * zoom_sqrt).clamp(1.2, 4.4),
                    blend_color(Color32::from_rgb(241, 146, 94), HIGHLIGHT_COLOR, 0.35),
                )
            } else if dimmed {
                Stroke::new(
                    (0.82 * zoom_sqrt).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 120),
                )
            } else {
                Stroke::new(
                    (1.18 * zoom_sqrt).clamp(0.6, 3.4),
                    Color32::from_rgba_unmultiplied(120, 128, 140, 190),
                )
            };

            let stroke = Stroke::new(link_width(stroke.width, link.total), stroke.color);
            if link.via_id.is_some() {
                shapes.extend(Shape::dashed_line(&[start, end], stroke, 6.0, 4.0));
            } else {
                shapes.push(Shape::line_segment([start, end], stroke));
            }
        }

        shapes
    }

    fn node_shapes(&mut self, ctx: &egui::Context, painter: &Painter, rect: Rect) -> Vec<Shape> {
        let state = self.store.state();
        let view = state.view();
        let dimmed = !state.highlighted().is_empty();
        let full_uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
        let mut shapes = Vec::new();

        for node in view.displayed_nodes() {
            let Some(world) = self.scene.position(node.hash) else {
                continue;
            };
            let base_radius = self.scene.radius(node.hash);
            let center = self.transform.world_to_screen(rect, world);
            let radius = self.transform.screen_radius(base_radius);
            if !circle_visible(rect, center, radius) {
                continue;
            }

            let appearance =
                NodeAppearance::resolve(node, base_radius, state.searches(), state.connectors());
            let key = appearance.key();
            let name = format!("node:{key}");
            let texture = self.textures.get_or_insert_with(key, || {
                ctx.load_texture(name, rasterize(&appearance), TextureOptions::LINEAR)
            });

            let scale = radius / appearance.radius.max(1) as f32;
            let tint = if dimmed && !node.highlighted {
                dim_color(Color32::WHITE, 0.45)
            } else {
                Color32::WHITE
            };
            shapes.push(Shape::image(
                texture.id(),
                Rect::from_center_size(center, texture.size_vec2() * scale),
                full_uv,
                tint,
            ));

            if radius > 7.0 && !appearance.icon.is_empty() {
                let galley = painter.layout_no_wrap(
                    appearance.icon.clone(),
                    FontId::proportional((radius * 0.9).clamp(8.0, 22.0)),
                    Color32::from_gray(245),
                );
                let corner = center - galley.size() * 0.5;
                shapes.push(Shape::galley(corner, galley, Color32::from_gray(245)));
            }
        }

        shapes
    }

    fn label_shapes(&self, painter: &Painter, rect: Rect) -> Vec<Shape> {
        let view = self.store.view();
        let show_labels = self.store.state().show_labels();
        let max_chars = self.config.max_label_length.max(1);
        let mut shapes = Vec::new();

        for node in view
            .displayed_nodes()
            .filter(|node| show_labels || node.important)
        {
            let Some(world) = self.scene.position(node.hash) else {
                continue;
            };
            let center = self.transform.world_to_screen(rect, world);
            let radius = self.transform.screen_radius(self.scene.radius(node.hash));
            if !circle_visible(rect, center, radius + 120.0) {
                continue;
            }

            let color = if node.important {
                IMPORTANT_COLOR
            } else {
                Color32::from_gray(238)
            };
            let galley =
                painter.layout_no_wrap(abbreviate(&node.name, max_chars), FontId::proportional(12.0), color);
            let corner = center + vec2(radius + 5.0, -galley.size().y * 0.5);
            shapes.push(Shape::galley(corner, galley, color));
        }

        shapes
    }

    fn selection_shapes(&self, rect: Rect) -> Vec<Shape> {
        let state = self.store.state();
        state
            .selected()
            .iter()
            .filter_map(|id| state.view().nodes.get(id))
            .filter_map(|node| {
                let world = self.scene.position(node.hash)?;
                let center = self.transform.world_to_screen(rect, world);
                let radius = self.transform.screen_radius(self.scene.radius(node.hash));
                circle_visible(rect, center, radius + 8.0).then(|| {
                    Shape::circle_stroke(
                        center,
                        radius + 6.0,
                        Stroke::new(1.6, SELECTION_COLOR.gamma_multiply(0.6)),
                    )
                })
            })
            .collect()
    }

    fn tooltip_shapes(&self, painter: &Painter, rect: Rect) -> Vec<Shape> {
        const PADDING: f32 = 6.0;

        let state = self.store.state();
        let mut shapes = Vec::new();

        for node in state.view().displayed_nodes().filter(|node| node.display_tooltip) {
            let Some(world) = self.scene.position(node.hash) else {
                continue;
            };
            let center = self.transform.world_to_screen(rect, world);
            let radius = self.transform.screen_radius(self.scene.radius(node.hash));

            let mut lines = vec![
                node.abbreviated.clone(),
                format!("{} · {} records", node.kind.label(), node.count()),
                format!("fields: {}", node.fields.join(", ")),
            ];
            let searches = node
                .search_ids
                .iter()
                .map(|search_id| {
                    state
                        .search(search_id)
                        .filter(|search| !search.q.is_empty())
                        .map_or_else(|| search_id.clone(), |search| search.q.clone())
                })
                .collect::<Vec<_>>();
            if !searches.is_empty() {
                lines.push(format!("searches: {}", searches.join(", ")));
            }
            if !node.description.is_empty() {
                lines.push(node.description.clone());
            }

            let galley = painter.layout_no_wrap(
                lines.join("\n"),
                FontId::proportional(12.0),
                Color32::from_gray(235),
            );
            let size = galley.size() + vec2(PADDING, PADDING) * 2.0;
            let corner = center + vec2(radius + 10.0, -size.y * 0.5);
            let frame = Rect::from_min_size(corner, size);

            shapes.push(Shape::rect_filled(
                frame,
                4.0,
                Color32::from_rgba_unmultiplied(24, 28, 35, 235),
            ));
            shapes.push(Shape::galley(
                frame.min + vec2(PADDING, PADDING),
                galley,
                Color32::from_gray(235),
            ));
        }

        shapes
    }
}
