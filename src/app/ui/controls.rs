use eframe::egui::{self, Color32, Key, Response, Sense, Ui, vec2};

use crate::graph::{Action, ConnectorUpdate, MatchStrategy};
use crate::render::geometry::parse_hex_color;
use crate::render::{Aspect, MAX_ZOOM, MIN_ZOOM, ViewTransform};

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const MAX_DISPLAY_LIMIT: usize = 5000;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
    integer_carry: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Signed change a held arrow key asks for this frame, accelerating the
/// longer it is held. `None` while the slider is unfocused or no arrow is
/// down.
fn held_arrow_delta(ui: &Ui, response: &Response, step: f32) -> Option<(f32, SliderKeyHoldState)> {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return None;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        hold_state.integer_carry = 0.0;
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, hold_state));
        return None;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    ui.ctx().request_repaint();
    Some((direction as f32 * step * speed * delta_time, hold_state))
}

fn store_hold_state(ui: &Ui, response: &Response, hold_state: SliderKeyHoldState) {
    let state_id = response.id.with("arrow_key_hold_state");
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
}

fn apply_slider_arrow_acceleration_f32(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let Some((delta, hold_state)) = held_arrow_delta(ui, response, step) else {
        return false;
    };
    store_hold_state(ui, response, hold_state);

    let old_value = *value;
    *value = (*value + delta).clamp(min, max);
    (*value - old_value).abs() > f32::EPSILON
}

fn apply_slider_arrow_acceleration_usize(
    ui: &Ui,
    response: &Response,
    value: &mut usize,
    min: usize,
    max: usize,
    step: usize,
) -> bool {
    let Some((delta, mut hold_state)) = held_arrow_delta(ui, response, step as f32) else {
        return false;
    };
    hold_state.integer_carry += delta;
    let whole_delta = hold_state.integer_carry.trunc() as isize;
    hold_state.integer_carry -= whole_delta as f32;
    store_hold_state(ui, response, hold_state);

    let old_value = *value;
    if whole_delta != 0 {
        *value = (*value as isize + whole_delta).clamp(min as isize, max as isize) as usize;
    }
    *value != old_value
}

fn hex_color(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

fn color_swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.5, color);
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut actions = Vec::new();

        ui.label("Highlight")
            .on_hover_text("Fuzzy-highlight nodes whose name matches.");
        let query = ui.text_edit_singleline(&mut self.drafts.highlight_query);
        if query.changed() {
            actions.push(Action::HighlightMatching(
                self.drafts.highlight_query.clone(),
            ));
        }

        ui.separator();
        self.draw_view_options(ui, &mut actions);
        ui.separator();

        ui.collapsing("Searches", |ui| self.draw_searches(ui, &mut actions));
        ui.collapsing("Fields", |ui| self.draw_fields(ui, &mut actions));
        ui.collapsing("Connectors", |ui| self.draw_connectors(ui, &mut actions));
        ui.collapsing("Normalizations", |ui| {
            self.draw_normalizations(ui, &mut actions);
        });
        ui.collapsing("Via rules", |ui| self.draw_vias(ui, &mut actions));

        self.dispatch_all(actions);
    }

    fn draw_view_options(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let state = self.store.state();

        let mut show_labels = state.show_labels();
        if ui
            .checkbox(&mut show_labels, "Show labels")
            .on_hover_text("Label every node. Important nodes are always labelled.")
            .changed()
        {
            actions.push(Action::ToggleLabels(show_labels));
        }

        let mut map_active = state.map_active();
        if ui
            .checkbox(&mut map_active, "Map mode")
            .on_hover_text("Anchor nodes where they are and switch off centering and repulsion.")
            .changed()
        {
            actions.push(Action::SetMapActive(map_active));
        }

        let mut zoom = self.transform.zoom;
        let zoom_slider = ui.add(
            egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM)
                .text("Zoom")
                .clamping(egui::SliderClamping::Always),
        );
        if zoom_slider.hovered() {
            zoom_slider.request_focus();
        }
        let mut zoom_changed = zoom_slider.changed();
        zoom_changed |= apply_slider_arrow_acceleration_f32(
            ui,
            &zoom_slider,
            &mut zoom,
            MIN_ZOOM,
            MAX_ZOOM,
            ((MAX_ZOOM - MIN_ZOOM) / 200.0).max(0.0005),
        );
        if zoom_changed
            && let Some(rect) = self.canvas
            && self
                .transform
                .zoom_about(rect, rect.center(), zoom / self.transform.zoom)
        {
            self.dirty.mark(Aspect::Transform);
        }

        if ui.button("Reset view").clicked() {
            self.transform = ViewTransform::default();
            self.dirty.mark(Aspect::Transform);
        }
    }

    fn draw_searches(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let state = self.store.state();
        if state.searches().is_empty() {
            ui.label("No searches loaded.");
            return;
        }

        for search in state.searches() {
            let records = state
                .records()
                .iter()
                .filter(|record| record.search_id == search.search_id)
                .count();
            ui.horizontal(|ui| {
                color_swatch(ui, parse_hex_color(&search.color).unwrap_or(Color32::GRAY));
                let title = if search.q.is_empty() {
                    search.search_id.as_str()
                } else {
                    search.q.as_str()
                };
                ui.label(title).on_hover_text(search.search_id.as_str());
                ui.weak(format!("{records} records"));
                if ui.small_button("delete").clicked() {
                    actions.push(Action::DeleteSearch(search.search_id.clone()));
                }
            });

            let mut limit = search.display_nodes;
            let max_limit = MAX_DISPLAY_LIMIT.max(limit);
            let limit_slider = ui
                .add(
                    egui::Slider::new(&mut limit, 1..=max_limit)
                        .step_by(5.0)
                        .text("Display limit"),
                )
                .on_hover_text("Nodes of this search beyond the limit are hidden.");
            if limit_slider.hovered() {
                limit_slider.request_focus();
            }
            let mut changed = limit_slider.changed();
            changed |= apply_slider_arrow_acceleration_usize(
                ui,
                &limit_slider,
                &mut limit,
                1,
                max_limit,
                5,
            );
            if changed {
                actions.push(Action::SetDisplayLimit {
                    search_id: search.search_id.clone(),
                    limit,
                });
            }
            ui.add_space(4.0);
        }
    }

    fn draw_fields(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let state = self.store.state();

        for field in state.fields() {
            ui.horizontal(|ui| {
                let mut include = self.drafts.connector_fields.contains(&field.path);
                if ui
                    .checkbox(&mut include, "")
                    .on_hover_text("Include in a new connector")
                    .changed()
                {
                    if include {
                        self.drafts.connector_fields.push(field.path.clone());
                    } else {
                        self.drafts.connector_fields.retain(|path| *path != field.path);
                    }
                }
                ui.label(format!("{} {}", field.display_icon(), field.path));
                if let Some(parent) = &field.child_of {
                    ui.weak(format!("in {parent}"));
                }
                if ui.small_button("select").clicked() {
                    actions.push(Action::SelectFieldNodes(field.path.clone()));
                }
                if ui.small_button("highlight").clicked() {
                    actions.push(Action::HighlightFieldNodes(field.path.clone()));
                }
            });
        }

        let can_create = !self.drafts.connector_fields.is_empty();
        if ui
            .add_enabled(can_create, egui::Button::new("Create connector"))
            .clicked()
        {
            actions.push(Action::CreateConnector(std::mem::take(
                &mut self.drafts.connector_fields,
            )));
        }
    }

    fn draw_connectors(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let connectors = self.store.state().connectors();
        if connectors.is_empty() {
            ui.label("Tick fields and create a connector to group their nodes.");
            return;
        }

        for connector in connectors.iter() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    let mut color = parse_hex_color(&connector.color).unwrap_or(Color32::GRAY);
                    if ui.color_edit_button_srgba(&mut color).changed() {
                        actions.push(Action::UpdateConnector {
                            connector: connector.name.clone(),
                            update: ConnectorUpdate {
                                color: Some(hex_color(color)),
                                icon: None,
                            },
                        });
                    }
                    ui.strong(connector.name.as_str());

                    let mut strategy = connector.strategy;
                    ui.selectable_value(&mut strategy, MatchStrategy::And, "AND")
                        .on_hover_text("Nodes must carry every field");
                    ui.selectable_value(&mut strategy, MatchStrategy::Or, "OR")
                        .on_hover_text("Nodes may carry any field");
                    if strategy != connector.strategy {
                        actions.push(Action::SetStrategy {
                            connector: connector.name.clone(),
                            strategy,
                        });
                    }

                    if ui.small_button("delete").clicked() {
                        actions.push(Action::DeleteConnector(connector.name.clone()));
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("icon");
                    let mut icon = connector.icon.clone();
                    let edit = ui.add(egui::TextEdit::singleline(&mut icon).desired_width(48.0));
                    if edit.changed() {
                        actions.push(Action::UpdateConnector {
                            connector: connector.name.clone(),
                            update: ConnectorUpdate {
                                color: None,
                                icon: Some(icon),
                            },
                        });
                    }
                });

                for rule in &connector.rules {
                    ui.horizontal(|ui| {
                        ui.label(rule.field_path.as_str());
                        if ui
                            .small_button("split")
                            .on_hover_text("Move this rule into a connector of its own")
                            .clicked()
                        {
                            actions.push(Action::MoveRuleToNew {
                                from: connector.name.clone(),
                                rule_id: rule.id.clone(),
                            });
                        }
                        egui::ComboBox::from_id_salt(("move_rule", rule.id.as_str()))
                            .selected_text("move to")
                            .show_ui(ui, |ui| {
                                for other in connectors.iter().filter(|other| other.name != connector.name) {
                                    if ui.selectable_label(false, other.name.as_str()).clicked() {
                                        actions.push(Action::MoveRule {
                                            from: connector.name.clone(),
                                            to: other.name.clone(),
                                            rule_id: rule.id.clone(),
                                        });
                                    }
                                }
                            });
                        if ui.small_button("remove").clicked() {
                            actions.push(Action::DeleteRule {
                                connector: connector.name.clone(),
                                rule_id: rule.id.clone(),
                            });
                        }
                    });
                }
            });
        }
    }

    fn draw_normalizations(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        for normalization in self.store.state().normalizations() {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "/{}/ -> {}",
                    normalization.regex, normalization.replace_with
                ));
                if ui.small_button("remove").clicked() {
                    actions.push(Action::RemoveNormalization(normalization.id.clone()));
                }
            });
        }

        ui.horizontal(|ui| {
            ui.label("regex");
            ui.text_edit_singleline(&mut self.drafts.normalization_regex);
        });
        ui.horizontal(|ui| {
            ui.label("merge into");
            ui.text_edit_singleline(&mut self.drafts.normalization_replace);
        });
        let ready = !self.drafts.normalization_regex.trim().is_empty()
            && !self.drafts.normalization_replace.trim().is_empty();
        if ui
            .add_enabled(ready, egui::Button::new("Add normalization"))
            .clicked()
        {
            actions.push(Action::AddNormalization {
                regex: std::mem::take(&mut self.drafts.normalization_regex),
                replace_with: std::mem::take(&mut self.drafts.normalization_replace)
                    .trim()
                    .to_owned(),
            });
        }
    }

    fn draw_vias(&mut self, ui: &mut Ui, actions: &mut Vec<Action>) {
        let state = self.store.state();
        for via in state.vias() {
            ui.horizontal(|ui| {
                ui.label(format!("{} -> {} -> {}", via.from, via.via, via.to));
                if ui.small_button("remove").clicked() {
                    actions.push(Action::RemoveVia(via.id.clone()));
                }
            });
        }

        for (label, draft) in [
            ("from", &mut self.drafts.via_from),
            ("via", &mut self.drafts.via_via),
            ("to", &mut self.drafts.via_to),
        ] {
            ui.horizontal(|ui| {
                ui.label(label);
                ui.text_edit_singleline(draft);
            });
        }

        ui.horizontal(|ui| {
            let selected = state.selected();
            if ui
                .add_enabled(selected.len() == 3, egui::Button::new("Use selection"))
                .on_hover_text("Fill from, via and to with the three selected nodes")
                .clicked()
            {
                self.drafts.via_from = selected[0].clone();
                self.drafts.via_via = selected[1].clone();
                self.drafts.via_to = selected[2].clone();
            }

            let ready = [
                &self.drafts.via_from,
                &self.drafts.via_via,
                &self.drafts.via_to,
            ]
            .iter()
            .all(|draft| !draft.is_empty());
            if ui.add_enabled(ready, egui::Button::new("Add via")).clicked() {
                actions.push(Action::AddVia {
                    from: std::mem::take(&mut self.drafts.via_from),
                    via: std::mem::take(&mut self.drafts.via_via),
                    to: std::mem::take(&mut self.drafts.via_to),
                });
            }
        });
    }
}
