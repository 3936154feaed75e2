use eframe::egui::{self, RichText, Ui};

use crate::concept::Category;
use crate::config::{MAX_ACTIVATION_WINDOW_SECS, MIN_ACTIVATION_WINDOW_SECS};
use crate::util::format_clock;

use super::super::ViewModel;
use super::super::render_utils::color_for;
use super::super::session::{GraphCommand, ViewMode};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search concepts")
            .on_hover_text("Fuzzy-highlight matching concepts in the current view.");
        ui.text_edit_singleline(&mut self.search);
        if let Some(cache) = &self.search_match_cache
            && !self.search.trim().is_empty()
        {
            ui.small(format!("{} matching in view", cache.matches.len()));
        }

        ui.separator();
        ui.label(RichText::new("View").strong());
        ui.horizontal_wrapped(|ui| {
            let in_detail = matches!(self.session.mode(), ViewMode::Detail { .. });
            if ui
                .add_enabled(in_detail, egui::Button::new("Back to overview"))
                .on_hover_text("Esc")
                .clicked()
            {
                self.session.enqueue(GraphCommand::BackToOverview);
            }
            if ui.button("Zoom in").on_hover_text("+").clicked() {
                self.session.enqueue(GraphCommand::ZoomIn);
            }
            if ui.button("Zoom out").on_hover_text("-").clicked() {
                self.session.enqueue(GraphCommand::ZoomOut);
            }
            if ui
                .button("Reset view")
                .on_hover_text("Reset the camera and let the layout settle again.")
                .clicked()
            {
                self.session.enqueue(GraphCommand::ResetView);
            }
        });
        let viewport = self.session.viewport();
        ui.small(format!(
            "zoom {:.2}x{}",
            viewport.transform().scale,
            if viewport.is_animating() { ", moving to focus" } else { "" }
        ));

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        ui.checkbox(&mut self.live_physics, "Live physics")
            .on_hover_text("Step the force layout every frame.");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut cells used for repulsion.");
        let simulation = &self.session.view().simulation;
        ui.small(if simulation.is_running() {
            format!("settling (alpha {:.3})", simulation.alpha())
        } else {
            "settled".to_owned()
        });

        ui.separator();
        ui.label(RichText::new("Playback sync").strong());
        let mut window = self.session.activation().window_secs();
        let response = ui
            .add(
                egui::Slider::new(
                    &mut window,
                    MIN_ACTIVATION_WINDOW_SECS..=MAX_ACTIVATION_WINDOW_SECS,
                )
                .logarithmic(true)
                .suffix(" s")
                .text("activation window"),
            )
            .on_hover_text("A concept lights up while playback is this close to one of its mentions.");
        if response.changed() {
            self.session.set_activation_window(window);
        }
        let active = self
            .session
            .view()
            .nodes
            .iter()
            .filter(|node| node.is_active)
            .count();
        match self.session.activation().clock() {
            Some(clock) => ui.small(format!(
                "{active} concepts active at {}",
                format_clock(clock)
            )),
            None => ui.small("waiting for the first playback tick"),
        };

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for category in Category::ALL {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().circle_filled(rect.center(), 6.0, color_for(category));
                ui.label(category.label());
            });
        }
    }
}
