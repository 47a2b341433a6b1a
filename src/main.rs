use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use record_graph::app::RecordGraphApp;
use record_graph::config::EngineConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `fields`, `searches` and `records`.
    #[arg(long)]
    dataset: PathBuf,

    /// Optional engine configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Case-fold field values before they become node ids.
    #[arg(long)]
    fold_case: bool,

    #[arg(long)]
    physics_intensity: Option<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("record_graph=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.fold_case {
        config.normalizer.fold_case = true;
    }
    if let Some(intensity) = args.physics_intensity {
        config.physics.intensity = intensity.clamp(0.2, 2.5);
    }
    info!(dataset = %args.dataset.display(), "starting record-graph");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let dataset = args.dataset;
    eframe::run_native(
        "record-graph",
        options,
        Box::new(move |cc| Ok(Box::new(RecordGraphApp::new(cc, dataset, config)))),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
