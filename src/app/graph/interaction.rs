use eframe::egui::{self, Key, PointerButton, Pos2, Rect, Ui, Vec2};

use crate::graph::Action;
use crate::layout::Pin;
use crate::render::{Aspect, hit_test, nodes_in_rect};

use super::super::ViewModel;

/// What a primary-button drag on the canvas is doing. Positions are in world
/// space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum DragState {
    Node { hash: i32 },
    Band { origin: Vec2, current: Vec2 },
}

struct Placed<'a> {
    id: &'a str,
    hash: i32,
    position: Vec2,
    radius: f32,
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        if self.transform.zoom_about(rect, pointer, zoom_factor) {
            self.dirty.mark(Aspect::Transform);
        }
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if (response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle))
            && self.transform.pan_by(response.drag_delta())
        {
            self.dirty.mark(Aspect::Transform);
        }
    }

    /// Displayed nodes that already have a position, in view order.
    fn placed_nodes(&self) -> Vec<Placed<'_>> {
        self.store
            .view()
            .displayed_nodes()
            .filter_map(|node| {
                Some(Placed {
                    id: node.id.as_str(),
                    hash: node.hash,
                    position: self.scene.position(node.hash)?,
                    radius: self.scene.radius(node.hash),
                })
            })
            .collect()
    }

    pub(in crate::app) fn node_under(&self, rect: Rect, pointer: Pos2) -> Option<(String, i32)> {
        let placed = self.placed_nodes();
        let world = self.transform.screen_to_world(rect, pointer);
        let index = hit_test(
            &self.transform,
            world,
            placed.iter().map(|node| (node.position, node.radius)),
        )?;
        placed
            .get(index)
            .map(|node| (node.id.to_owned(), node.hash))
    }

    /// Click selection, node dragging and rubber-band selection. Returns the
    /// id of the hovered node.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> Option<String> {
        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|_| response.hovered())
            .and_then(|pointer| self.node_under(rect, pointer));

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(PointerButton::Primary) {
            let actions = match &hovered {
                Some((id, _)) => {
                    let ids = vec![id.clone()];
                    let toggle = if self.store.state().selected().contains(id) {
                        Action::Deselect(ids.clone())
                    } else {
                        Action::Select(ids.clone())
                    };
                    vec![toggle, Action::Tooltip(ids)]
                }
                None => vec![Action::ClearSelection, Action::Tooltip(Vec::new())],
            };
            self.dispatch_all(actions);
        }

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .unwrap_or_else(|| rect.center());
            self.drag = Some(match self.node_under(rect, origin) {
                Some((_, hash)) => DragState::Node { hash },
                None => {
                    let world = self.transform.screen_to_world(rect, origin);
                    DragState::Band {
                        origin: world,
                        current: world,
                    }
                }
            });
        }

        if response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = ui.input(|input| input.pointer.interact_pos())
        {
            let world = self.transform.screen_to_world(rect, pointer);
            match self.drag {
                Some(DragState::Node { hash }) => self.pin_node(hash, world),
                Some(DragState::Band { origin, .. }) => {
                    self.drag = Some(DragState::Band {
                        origin,
                        current: world,
                    });
                }
                None => {}
            }
        }

        if response.drag_stopped_by(PointerButton::Primary)
            && let Some(drag) = self.drag.take()
        {
            match drag {
                DragState::Node { hash } => self.release_node(hash),
                DragState::Band { origin, current } => self.select_in_band(origin, current),
            }
        }

        if response.hovered() {
            let (delete, escape) = ui.input(|input| {
                (
                    input.key_pressed(Key::Delete),
                    input.key_pressed(Key::Escape),
                )
            });
            if delete && !self.store.state().selected().is_empty() {
                let selected = self.store.state().selected().to_vec();
                self.dispatch(Action::Delete(selected));
            }
            if escape {
                self.dispatch_all(vec![Action::ClearSelection, Action::Tooltip(Vec::new())]);
            }
        }

        hovered.map(|(id, _)| id)
    }

    fn pin_node(&mut self, hash: i32, world: Vec2) {
        self.scene.place(hash, world);
        self.dirty.mark(Aspect::Positions);

        if let Some(worker) = self.worker.as_mut()
            && let Err(error) = worker.restart(vec![Pin {
                hash,
                x: world.x,
                y: world.y,
            }])
        {
            self.last_error = Some(error.to_string());
        }
    }

    fn release_node(&mut self, hash: i32) {
        if let Some(worker) = self.worker.as_mut()
            && let Err(error) = worker.release(vec![hash])
        {
            self.last_error = Some(error.to_string());
        }
    }

    fn select_in_band(&mut self, origin: Vec2, current: Vec2) {
        let ids = {
            let placed = self.placed_nodes();
            nodes_in_rect(origin, current, placed.iter().map(|node| node.position))
                .into_iter()
                .filter_map(|index| placed.get(index).map(|node| node.id.to_owned()))
                .collect::<Vec<_>>()
        };
        if !ids.is_empty() {
            self.dispatch(Action::Select(ids));
        }
    }

    /// Pans so that the node sits in the middle of the canvas.
    pub(in crate::app) fn focus_node(&mut self, hash: i32) {
        let Some(position) = self.scene.position(hash) else {
            return;
        };
        self.transform.pan = -position * self.transform.zoom;
        self.dirty.mark(Aspect::Transform);
    }
}
