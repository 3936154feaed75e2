use eframe::egui::{self, Align, Color32, Context, Key, Layout};
use log::{debug, error};

use crate::concept::ConceptGraph;
use crate::config::Settings;

use super::super::playback::PlaybackClock;
use super::super::session::{GraphCommand, GraphSession, SessionEvent, ViewMode};
use super::super::{LoadResult, ViewModel, ViewScratch};

const MAX_FRAME_DELTA_SECS: f64 = 0.25;

impl ViewModel {
    pub(in crate::app) fn new(
        graph: ConceptGraph,
        settings: &Settings,
        duration_override: Option<f64>,
    ) -> Self {
        let duration = duration_override
            .unwrap_or_else(|| PlaybackClock::duration_for(graph.latest_timestamp()));

        Self {
            playback: PlaybackClock::new(duration, settings.sync.tick_interval_secs),
            session: GraphSession::new(graph, settings),
            duration_override,
            search: String::new(),
            live_physics: true,
            show_quadtree_overlay: false,
            node_drag_active: false,
            search_match_cache: None,
            view_scratch: ViewScratch::default(),
            reload_error: None,
        }
    }

    /// Applies a finished reload. A failed reload keeps the current snapshot
    /// on screen and only reports the failure.
    pub(in crate::app) fn finish_reload(&mut self, result: LoadResult) {
        match result {
            Ok(graph) => {
                self.reload_error = None;
                self.load_snapshot(graph);
            }
            Err(message) => {
                error!("reload failed, keeping the current graph: {message}");
                self.reload_error = Some(message);
            }
        }
    }

    /// Swaps in a freshly loaded snapshot, keeping the playback position.
    fn load_snapshot(&mut self, graph: ConceptGraph) {
        if self.duration_override.is_none() {
            self.playback
                .set_duration(PlaybackClock::duration_for(graph.latest_timestamp()));
        }
        self.session.load(graph);
        self.search_match_cache = None;
        self.node_drag_active = false;
        self.playback.seek(self.playback.position());
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source_label: &str,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.handle_shortcuts(ctx);
        self.sync_playback(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("concept-lens");
                    ui.separator();
                    ui.label(format!("source: {source_label}"));
                    let graph = self.session.graph();
                    ui.label(format!("concepts: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.edge_count()));
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if let Some(message) = &self.reload_error {
                        ui.colored_label(Color32::from_rgb(235, 110, 100), "reload failed")
                            .on_hover_text(message.as_str());
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let view = self.session.view();
                        ui.label(format!(
                            "{}  |  {} shown, {} links",
                            mode_text(self.session.mode()),
                            view.nodes.len(),
                            view.edges.len()
                        ));
                    });
                });
            });

        egui::TopBottomPanel::bottom("timeline")
            .resizable(false)
            .show(ctx, |ui| self.draw_timeline(ui));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_reloading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading concept graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });

        self.drain_session_events();
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (back, play, zoom_in, zoom_out) = ctx.input(|input| {
            (
                input.key_pressed(Key::Escape),
                input.key_pressed(Key::Space),
                input.key_pressed(Key::Plus) || input.key_pressed(Key::Equals),
                input.key_pressed(Key::Minus),
            )
        });

        if back {
            self.session.enqueue(GraphCommand::BackToOverview);
        }
        if play {
            self.playback.toggle();
        }
        if zoom_in {
            self.session.enqueue(GraphCommand::ZoomIn);
        }
        if zoom_out {
            self.session.enqueue(GraphCommand::ZoomOut);
        }
    }

    /// Advances the host clock and forwards due ticks into activation.
    fn sync_playback(&mut self, ctx: &Context) {
        let delta = ctx
            .input(|input| f64::from(input.stable_dt))
            .clamp(0.0, MAX_FRAME_DELTA_SECS);

        if let Some(position) = self.playback.advance(delta)
            && self.session.set_clock(position)
        {
            ctx.request_repaint();
        }

        if self.playback.is_playing() {
            ctx.request_repaint();
        }
    }

    fn drain_session_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::NodeClicked { node_id, seek_to } => {
                    debug!("concept '{node_id}' clicked, seek target {seek_to:?}");
                    if let Some(seconds) = seek_to {
                        self.playback.seek(seconds);
                    }
                }
                SessionEvent::SeekRequested(seconds) => self.playback.seek(seconds),
            }
        }
    }
}

fn mode_text(mode: &ViewMode) -> String {
    match mode {
        ViewMode::Overview => "overview".to_owned(),
        ViewMode::Detail { focus_id } => format!("detail: {focus_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Category;
    use crate::concept::fixtures::node;

    fn model() -> ViewModel {
        let graph = ConceptGraph::new(vec![node("kept", Category::Definition, 20.0)], Vec::new());
        ViewModel::new(graph, &Settings::default(), Some(600.0))
    }

    #[test]
    fn failed_reload_keeps_current_graph() {
        let mut model = model();
        model.playback.seek(90.0);

        model.finish_reload(Err("failed to parse graph payload".to_owned()));

        assert!(model.session.graph().contains("kept"));
        assert_eq!(model.session.view().nodes.len(), 1);
        assert_eq!(
            model.reload_error.as_deref(),
            Some("failed to parse graph payload")
        );
        assert_eq!(model.playback.position(), 90.0);
    }

    #[test]
    fn successful_reload_swaps_snapshot_and_clears_error() {
        let mut model = model();
        model.finish_reload(Err("missing".to_owned()));

        let fresh = ConceptGraph::new(vec![node("fresh", Category::Example, 20.0)], Vec::new());
        model.finish_reload(Ok(fresh));

        assert!(model.reload_error.is_none());
        assert!(model.session.graph().contains("fresh"));
        assert!(!model.session.graph().contains("kept"));
    }
}
