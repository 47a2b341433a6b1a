use eframe::egui::{self, Color32, RichText, Ui};

use crate::graph::{Action, Node};
use crate::render::geometry::parse_hex_color;

use super::super::ViewModel;

const ITEM_ROWS: usize = 50;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let state = self.store.state();
        let Some(node) = state
            .selected()
            .first()
            .and_then(|id| state.view().nodes.get(id))
            .cloned()
        else {
            self.drafts.note_node = None;
            ui.label("Select a node on the canvas or through a field.");
            return;
        };
        let others = state.selected().iter().skip(1).cloned().collect::<Vec<_>>();

        if self.drafts.note_node.as_deref() != Some(node.id.as_str()) {
            self.drafts.note_node = Some(node.id.clone());
            self.drafts.note = node.description.clone();
        }

        let mut actions = Vec::new();
        self.draw_node_summary(ui, &node);
        ui.separator();
        self.draw_node_actions(ui, &node, &mut actions);

        if !node.child_data.is_empty() {
            ui.separator();
            ui.label(RichText::new("Child values").strong());
            egui::Grid::new("child_data")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (path, values) in &node.child_data {
                        ui.label(path.as_str());
                        ui.label(values.join(", "));
                        ui.end_row();
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new(format!("Records ({})", node.items.len())).strong());
        egui::ScrollArea::vertical()
            .id_salt("node_items_scroll")
            .max_height(200.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for item in node.items.iter().take(ITEM_ROWS) {
                    ui.small(item.as_str());
                }
                if node.items.len() > ITEM_ROWS {
                    ui.weak(format!("... and {} more", node.items.len() - ITEM_ROWS));
                }
            });

        if !others.is_empty() {
            ui.separator();
            ui.label(RichText::new(format!("Also selected ({})", others.len())).strong());
            for id in others {
                ui.horizontal(|ui| {
                    if ui.link(id.as_str()).on_hover_text("Show this node first").clicked() {
                        let mut order = vec![id.clone()];
                        order.extend(
                            self.store
                                .state()
                                .selected()
                                .iter()
                                .filter(|other| **other != id)
                                .cloned(),
                        );
                        actions.push(Action::ClearSelection);
                        actions.push(Action::Select(order));
                    }
                    if ui.small_button("deselect").clicked() {
                        actions.push(Action::Deselect(vec![id.clone()]));
                    }
                });
            }
        }

        self.dispatch_all(actions);
    }

    fn draw_node_summary(&self, ui: &mut Ui, node: &Node) {
        let state = self.store.state();

        ui.label(RichText::new(format!("{} {}", node.icon, node.abbreviated)).strong());
        if node.abbreviated != node.name {
            ui.small(node.name.as_str());
        }
        ui.add_space(6.0);

        ui.label(format!("Kind: {}", node.kind.label()));
        ui.label(format!("Records: {}", node.count()));
        ui.label(format!("Fields: {}", node.fields.join(", ")));
        ui.label(format!("Hash: {}", node.hash));
        if node.is_normalization_parent {
            ui.label("Merged by a normalization");
        } else if let Some(rule) = node
            .normalization_id
            .as_deref()
            .and_then(|id| state.normalizations().iter().find(|rule| rule.id == id))
        {
            ui.label(format!("Normalized into {}", rule.replace_with));
        }
        if let Some(connector) = state.connectors().matching(node) {
            ui.label(format!("Connector: {}", connector.name));
        }

        let links = state
            .view()
            .displayed_links()
            .filter(|link| link.touches(&node.id))
            .count();
        ui.label(format!("Links: {links}"));

        ui.horizontal_wrapped(|ui| {
            for search_id in &node.search_ids {
                let search = state.search(search_id);
                let color = search
                    .and_then(|search| parse_hex_color(&search.color))
                    .unwrap_or(Color32::GRAY);
                let title = search
                    .filter(|search| !search.q.is_empty())
                    .map_or(search_id.as_str(), |search| search.q.as_str());
                ui.colored_label(color, title);
            }
        });
    }

    fn draw_node_actions(&mut self, ui: &mut Ui, node: &Node, actions: &mut Vec<Action>) {
        ui.horizontal(|ui| {
            let mut important = node.important;
            if ui
                .checkbox(&mut important, "Important")
                .on_hover_text("Always label this node")
                .changed()
            {
                actions.push(Action::SetImportant {
                    node_id: node.id.clone(),
                    important,
                });
            }

            if ui.button("Center").clicked() {
                self.focus_node(node.hash);
            }

            if ui
                .button("Highlight neighbours")
                .on_hover_text("Highlight this node and every node linked to it")
                .clicked()
            {
                let view = self.store.view();
                let mut ids = vec![node.id.clone()];
                for link in view.displayed_links().filter(|link| link.touches(&node.id)) {
                    let other = if link.source == node.id {
                        &link.target
                    } else {
                        &link.source
                    };
                    ids.push(other.clone());
                }
                actions.push(Action::Highlight(ids));
            }

            if ui
                .add_enabled(node.is_deletable(), egui::Button::new("Delete"))
                .on_disabled_hover_text("Only plain field values can be deleted")
                .clicked()
            {
                actions.push(Action::Delete(vec![node.id.clone()]));
            }
        });

        ui.add_space(4.0);
        ui.label("Note");
        ui.add(
            egui::TextEdit::multiline(&mut self.drafts.note)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        let unsaved = self.drafts.note != node.description;
        if ui
            .add_enabled(unsaved, egui::Button::new("Save note"))
            .clicked()
        {
            actions.push(Action::SetNote {
                node_id: node.id.clone(),
                note: self.drafts.note.clone(),
            });
        }
    }
}
