use std::path::Path;

use eframe::egui::{self, Align, Color32, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        dataset_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        self.consume_ticks(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("record-graph");
                    ui.separator();
                    let name = dataset_path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| dataset_path.display().to_string());
                    ui.label(format!("dataset: {name}"))
                        .on_hover_text(dataset_path.display().to_string());
                    ui.label(format!("records: {}", self.store.state().record_count()));
                    ui.label(format!("searches: {}", self.store.state().searches().len()));
                    ui.label(format!("version: {}", self.store.state().version()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload dataset"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.graph_counts_text());
                        ui.label(self.layout_status_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });

                let mut dismiss = false;
                if let Some(error) = &self.last_error {
                    ui.horizontal(|ui| {
                        ui.colored_label(Color32::from_rgb(240, 110, 96), error.as_str());
                        dismiss = ui.small_button("dismiss").clicked();
                    });
                }
                if dismiss {
                    self.last_error = None;
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("details_scroll")
                    .show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Reloading records...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_graph(ui);
                }
            });
    }

    fn layout_status_text(&self) -> String {
        match &self.worker {
            Some(worker) if worker.is_alive() => format!(
                "layout: gen {} ({} restarts)",
                worker.generation(),
                worker.restarts()
            ),
            Some(_) => "layout: restarting".to_owned(),
            None => "layout: unavailable".to_owned(),
        }
    }
}
