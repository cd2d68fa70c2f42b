mod app;
mod config;
mod controller;
mod error;
mod images;
mod navigation;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use crate::app::LabelerApp;
use crate::config::Config;
use crate::controller::ReviewController;
use crate::navigation::{LabelSet, Session};
use crate::store::LabelStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Label images with a single tag, saved to a CSV table.", long_about = None)]
struct Cli {
    /// Directory holding the .jpg/.png images to review
    #[arg(default_value = config::DEFAULT_IMAGE_DIR)]
    image_dir: PathBuf,

    /// CSV table the labels are written to
    #[arg(default_value = config::DEFAULT_TABLE_PATH)]
    table: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::new(cli.image_dir, cli.table);

    let images = images::discover_images(&config.image_dir, &mut rand::rng())
        .with_context(|| format!("Failed to read images from {}", config.image_dir.display()))?;
    let store = LabelStore::load(&config.table_path)
        .with_context(|| format!("Failed to load label table {}", config.table_path.display()))?;
    let labels = LabelSet::new(config.labels.iter().cloned())?;
    log::info!("Reviewing {} images from {}", images.len(), config.image_dir.display());
    if store.is_empty() {
        log::info!("Starting a new label table at {}", config.table_path.display());
    } else {
        log::info!("{} rows already in {}", store.len(), config.table_path.display());
    }

    let session = Session::new(images, labels)?;
    let controller = ReviewController::new(
        session,
        store,
        config.image_dir.clone(),
        config.table_path.clone(),
        config.group_id,
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Labeler")
            .with_inner_size(config.window_size()),
        ..Default::default()
    };
    let crop = config.crop;
    eframe::run_native(
        "Labeler",
        native_options,
        Box::new(move |_cc| Box::new(LabelerApp::new(controller, crop))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to open window: {e}"))?;

    Ok(())
}
