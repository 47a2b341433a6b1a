use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context, Rect, TextureHandle};
use tracing::{info, trace, warn};

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::graph::{Action, GraphEvent, GraphStore};
use crate::layout::{LayoutLink, LayoutNode, LayoutWorker, apply_tick};
use crate::render::{Aspect, DirtyFlags, TextureCache, ViewTransform};

mod graph;
mod ui;

use graph::{DragState, LayerCache, Scene};

pub struct RecordGraphApp {
    dataset_path: PathBuf,
    config: EngineConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset>>>,
}

enum AppState {
    Loading { rx: Receiver<Result<Dataset>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    config: EngineConfig,
    store: GraphStore,
    worker: Option<LayoutWorker>,
    latest_generation: u64,
    scene: Scene,
    transform: ViewTransform,
    canvas: Option<Rect>,
    dirty: DirtyFlags,
    layers: LayerCache,
    textures: TextureCache<TextureHandle>,
    drag: Option<DragState>,
    drafts: Drafts,
    last_error: Option<String>,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

/// Text the side panels are editing before it becomes an action.
#[derive(Default)]
struct Drafts {
    highlight_query: String,
    note_node: Option<String>,
    note: String,
    normalization_regex: String,
    normalization_replace: String,
    via_from: String,
    via_via: String,
    via_to: String,
    connector_fields: Vec<String>,
}

impl RecordGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, dataset_path: PathBuf, config: EngineConfig) -> Self {
        let rx = Self::spawn_load(dataset_path.clone(), config.default_display_nodes);
        Self {
            dataset_path,
            config,
            state: AppState::Loading { rx },
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf, default_display_nodes: usize) -> Receiver<Result<Dataset>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = Dataset::load(&path, default_display_nodes);
            let _ = tx.send(result);
        });

        rx
    }

    fn ready_or_error(&self, loaded: Result<Dataset>) -> AppState {
        match loaded.and_then(|dataset| ViewModel::new(dataset, self.config.clone())) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => {
                warn!(path = %self.dataset_path.display(), error = %format!("{error:#}"), "dataset load failed");
                AppState::Error(format!("{error:#}"))
            }
        }
    }
}

impl eframe::App for RecordGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(loaded) => transition = Some(loaded),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err(anyhow::anyhow!("background load worker disconnected")));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading records...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(Duration::from_millis(50));
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the record graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.dataset_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(
                        self.dataset_path.clone(),
                        self.config.default_display_nodes,
                    ));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(loaded) => transition = Some(loaded),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint_after(Duration::from_millis(50));
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err(anyhow::anyhow!("background load worker disconnected")));
                        }
                    }
                }
            }
        }

        if retry {
            let rx = Self::spawn_load(self.dataset_path.clone(), self.config.default_display_nodes);
            self.state = AppState::Loading { rx };
        }

        if let Some(loaded) = transition {
            self.reload_rx = None;
            self.state = self.ready_or_error(loaded);
        }
    }
}

impl ViewModel {
    fn new(dataset: Dataset, config: EngineConfig) -> Result<Self> {
        let store_config = config
            .store_config()
            .context("failed to build the value normalizer")?;
        let mut store = GraphStore::new(store_config);
        store
            .apply(Action::SetFields(dataset.fields.clone()))
            .context("failed to apply field definitions")?;
        for search in &dataset.searches {
            let records = dataset.records_for(&search.search_id);
            store
                .apply(Action::MergeResults {
                    search: search.clone(),
                    records,
                })
                .with_context(|| format!("failed to merge search {}", search.search_id))?;
        }
        info!(
            nodes = store.view().nodes.len(),
            links = store.view().links.len(),
            searches = dataset.searches.len(),
            "record graph ready"
        );

        let (worker, last_error) = match LayoutWorker::spawn(config.physics) {
            Ok(worker) => (Some(worker), None),
            Err(error) => {
                warn!(%error, "running without a layout worker");
                (None, Some(error.to_string()))
            }
        };

        let mut model = Self {
            config,
            store,
            worker,
            latest_generation: 0,
            scene: Scene::default(),
            transform: ViewTransform::default(),
            canvas: None,
            dirty: DirtyFlags::new(),
            layers: LayerCache::default(),
            textures: TextureCache::new(),
            drag: None,
            drafts: Drafts::default(),
            last_error,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        };
        model.sync_topology();
        Ok(model)
    }

    /// Applies one user intent and propagates its events to the canvas and
    /// the layout worker.
    fn dispatch(&mut self, action: Action) {
        let events = match self.store.apply(action) {
            Ok(events) => events,
            Err(error) => {
                self.last_error = Some(error.to_string());
                return;
            }
        };

        let mut topology_changed = false;
        for event in &events {
            self.dirty.mark_event(event);
            match event {
                GraphEvent::TopologyChanged => topology_changed = true,
                GraphEvent::MapModeChanged(active) => {
                    topology_changed = true;
                    self.send_area_forces(!active);
                }
                _ => {}
            }
        }

        if topology_changed {
            self.sync_topology();
        }
    }

    fn dispatch_all(&mut self, actions: Vec<Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    /// Sends the displayed nodes and links to the worker. In map mode every
    /// placed node is anchored where it currently is.
    fn sync_topology(&mut self) {
        let view = self.store.view();
        self.scene.sync(view);

        let map_active = self.store.state().map_active();
        let nodes = view
            .displayed_nodes()
            .map(|node| {
                let anchor = map_active
                    .then(|| self.scene.position(node.hash))
                    .flatten();
                LayoutNode {
                    hash: node.hash,
                    mass: node.count() as f32,
                    radius: self.scene.radius(node.hash),
                    fx: anchor.map(|position| position.x),
                    fy: anchor.map(|position| position.y),
                }
            })
            .collect::<Vec<_>>();
        let links = view
            .displayed_links()
            .filter_map(|link| {
                Some(LayoutLink {
                    hash: link.hash,
                    source: view.nodes.get(&link.source)?.hash,
                    target: view.nodes.get(&link.target)?.hash,
                })
            })
            .collect::<Vec<_>>();

        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        match worker.update(nodes, links) {
            Ok(generation) => self.latest_generation = generation,
            Err(error) => self.last_error = Some(error.to_string()),
        }
    }

    fn send_area_forces(&mut self, active: bool) {
        let size = self.canvas.map(|rect| rect.size()).unwrap_or_default();
        if let Some(worker) = self.worker.as_mut()
            && let Err(error) = worker.set_area_forces(active, size.x, size.y)
        {
            self.last_error = Some(error.to_string());
        }
    }

    /// Takes the newest tick, if any, and moves the scene to it.
    fn consume_ticks(&mut self, ctx: &Context) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };

        if !worker.is_alive() {
            warn!(restarts = worker.restarts(), "layout worker exited, resending topology");
            self.sync_topology();
            return;
        }

        let Some(tick) = worker.drain() else {
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        };

        if !self.config.staleness.accepts(&tick, self.latest_generation) {
            trace!(
                generation = tick.generation,
                latest = self.latest_generation,
                "dropping stale tick"
            );
            ctx.request_repaint();
            return;
        }

        let outcome = apply_tick(&tick, &mut self.scene);
        if !outcome.complete {
            trace!(
                nodes = outcome.nodes,
                links = outcome.links,
                "tick truncated at unknown hash"
            );
        }
        if outcome.nodes > 0 || outcome.links > 0 {
            self.dirty.mark(Aspect::Positions);
        }
        ctx.request_repaint();
    }
}
