use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};
use log::{error, info};

use crate::concept::{ConceptGraph, load_graph_file};
use crate::config::Settings;

mod activation;
mod graph;
mod highlight;
mod physics;
mod playback;
mod render_utils;
mod session;
mod ui;
mod viewport;

use playback::PlaybackClock;
use session::GraphSession;

type LoadResult = Result<ConceptGraph, String>;

pub struct ConceptLensApp {
    source: PathBuf,
    settings: Settings,
    duration_override: Option<f64>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: GraphSession,
    playback: PlaybackClock,
    duration_override: Option<f64>,
    search: String,
    live_physics: bool,
    show_quadtree_overlay: bool,
    node_drag_active: bool,
    search_match_cache: Option<SearchMatchCache>,
    view_scratch: ViewScratch,
    reload_error: Option<String>,
}

struct SearchMatchCache {
    query: String,
    view_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    quadtree_cells: Vec<physics::QuadtreeCell>,
}

impl ConceptLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: PathBuf,
        settings: Settings,
        duration_override: Option<f64>,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            settings,
            duration_override,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph_file(&source).map_err(|error| format!("{error:#}"));
            if let Err(message) = &result {
                error!("failed to load concept graph: {message}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, graph: ConceptGraph) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            graph,
            &self.settings,
            self.duration_override,
        )))
    }
}

impl eframe::App for ConceptLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => transition = Some(Ok(graph)),
                    Ok(Err(message)) => transition = Some(Err(message)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading concept graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(message) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load concept graph");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                let source_label = self.source.display().to_string();
                model.show(ctx, &source_label, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!("reloading concept graph from {source_label}");
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => model.finish_reload(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => model.finish_reload(Err(
                            "Background load worker disconnected".to_owned(),
                        )),
                    }
                }
            }
        }

        if let Some(next) = transition {
            self.reload_rx = None;
            self.state = match next {
                Ok(graph) => self.ready(graph),
                Err(message) => AppState::Error(message),
            };
        }
    }
}
