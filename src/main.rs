mod app;
mod concept;
mod config;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::info;

use config::Settings;

/// Interactive, playback-synchronised concept graph viewer for lecture videos.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph payload JSON (`{"nodes": ..., "edges": [...]}`).
    graph: PathBuf,

    /// Settings file (JSON); missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds around a mention during which a concept counts as active.
    #[arg(long, value_name = "SECS")]
    activation_window: Option<f64>,

    /// Playback length in seconds; defaults to just past the last mention.
    #[arg(long, value_name = "SECS")]
    duration: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(window) = args.activation_window {
        settings.sync.activation_window_secs = window;
    }
    let settings = settings.normalized();
    let duration = args
        .duration
        .filter(|secs| secs.is_finite() && *secs > 0.0);

    info!(
        "starting concept-lens for {} (activation window {:.1}s)",
        args.graph.display(),
        settings.sync.activation_window_secs
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "concept-lens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ConceptLensApp::new(
                cc,
                args.graph.clone(),
                settings.clone(),
                duration,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
