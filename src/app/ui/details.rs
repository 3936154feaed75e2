use eframe::egui::{self, RichText, Ui};

use crate::concept::EdgeKind;
use crate::util::format_clock;

use super::super::ViewModel;
use super::super::render_utils::color_for;
use super::super::session::{GraphCommand, ViewMode};

struct LinkedConcept {
    id: String,
    label: String,
    kind: EdgeKind,
    outgoing: bool,
    in_view: bool,
}

impl ViewModel {
    fn linked_concepts(&self, selected_id: &str) -> Vec<LinkedConcept> {
        let graph = self.session.graph();
        let view = self.session.view();
        let entry = |id: &str, kind: EdgeKind, outgoing: bool| LinkedConcept {
            id: id.to_owned(),
            label: graph
                .node(id)
                .map(|node| node.label.clone())
                .unwrap_or_else(|| id.to_owned()),
            kind,
            outgoing,
            in_view: view.index_of(id).is_some(),
        };

        graph
            .incoming_edges(selected_id)
            .map(|edge| entry(&edge.source, edge.kind, false))
            .chain(
                graph
                    .outgoing_edges(selected_id)
                    .map(|edge| entry(&edge.target, edge.kind, true)),
            )
            .collect()
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Concept Details");
        ui.add_space(6.0);

        if matches!(self.session.mode(), ViewMode::Detail { .. })
            && ui.button("Back to overview").clicked()
        {
            self.session.enqueue(GraphCommand::BackToOverview);
        }

        let Some(selected_id) = self.session.selected().map(str::to_owned) else {
            ui.label("Click a concept in the graph to explore it.");
            return;
        };

        let Some(node) = self.session.graph().node(&selected_id) else {
            ui.label("Selected concept is not part of the loaded graph.");
            return;
        };
        let label = node.label.clone();
        let description = node.description.clone();
        let category = node.category;
        let size = node.size;
        let timestamps = node.timestamps.clone();
        let linked = self.linked_concepts(&selected_id);

        ui.label(RichText::new(label).strong().size(17.0));
        ui.horizontal(|ui| {
            ui.label(RichText::new(category.label()).color(color_for(category)));
            ui.separator();
            ui.small(format!("weight {size:.1}"));
        });
        ui.small(selected_id.as_str());
        ui.add_space(6.0);

        if description.trim().is_empty() {
            ui.weak("No description.");
        } else {
            ui.label(description);
        }

        ui.separator();
        ui.label(RichText::new("Mentioned at").strong());
        if timestamps.is_empty() {
            ui.weak("Never mentioned in the video.");
        } else {
            ui.horizontal_wrapped(|ui| {
                for seconds in &timestamps {
                    if ui
                        .small_button(format_clock(*seconds))
                        .on_hover_text("Seek playback here")
                        .clicked()
                    {
                        self.session.request_seek(*seconds);
                    }
                }
            });
        }

        ui.separator();
        ui.label(RichText::new("Linked concepts").strong());
        if linked.is_empty() {
            ui.weak("No links.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("linked_concepts_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for concept in &linked {
                    let arrow = if concept.outgoing { "->" } else { "<-" };
                    let mut text = format!("{arrow} {}  ({})", concept.label, concept.kind.label());
                    if !concept.in_view {
                        text.push_str("  [out of view]");
                    }
                    if ui.link(text).on_hover_text(concept.id.as_str()).clicked() {
                        self.session.enqueue(GraphCommand::Click {
                            node_id: concept.id.clone(),
                        });
                    }
                }
            });
    }
}
