use eframe::egui::{self, PointerButton, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::session::GraphCommand;

const WHEEL_ZOOM_SENSITIVITY: f32 = 0.0018;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let factor = (1.0 + scroll * WHEEL_ZOOM_SENSITIVITY).clamp(0.85, 1.15);
        self.session.enqueue(GraphCommand::ZoomAt {
            anchor: pointer - rect.center(),
            factor,
        });
    }

    /// Turns primary-button gestures into node commands. A press that becomes
    /// a drag never also reports a click, so the two stay exclusive.
    pub(in crate::app) fn handle_graph_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let transform = self.session.viewport().transform();

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            let grabbed = origin
                .and_then(|origin| self.node_at(origin))
                .and_then(|index| self.session.view().nodes.get(index))
                .map(|node| node.id.clone());
            if let (Some(node_id), Some(origin)) = (grabbed, origin) {
                self.session.enqueue(GraphCommand::DragStart {
                    node_id,
                    world: transform.screen_to_world(rect, origin),
                });
                self.node_drag_active = true;
            }
        }

        if response.dragged_by(PointerButton::Primary) {
            if self.node_drag_active {
                if let Some(pointer) = response.interact_pointer_pos() {
                    self.session.enqueue(GraphCommand::DragMove {
                        world: transform.screen_to_world(rect, pointer),
                    });
                }
            } else {
                self.session.enqueue(GraphCommand::Pan(response.drag_delta()));
            }
        }

        if response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle) {
            self.session.enqueue(GraphCommand::Pan(response.drag_delta()));
        }

        if response.drag_stopped() && self.node_drag_active {
            self.node_drag_active = false;
            self.session.enqueue(GraphCommand::DragEnd);
        }

        if response.clicked_by(PointerButton::Primary) {
            let clicked = response
                .interact_pointer_pos()
                .and_then(|pointer| self.node_at(pointer))
                .and_then(|index| self.session.view().nodes.get(index))
                .map(|node| node.id.clone());
            match clicked {
                Some(node_id) => self.session.enqueue(GraphCommand::Click { node_id }),
                None => self.session.enqueue(GraphCommand::Select(None)),
            }
        }
    }

    /// Closest node whose on-screen disc contains `pointer`.
    pub(in crate::app) fn node_at(&self, pointer: Pos2) -> Option<usize> {
        let scratch = &self.view_scratch;
        scratch
            .visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = scratch.screen_positions.get(index)?.distance(pointer);
                let radius = *scratch.screen_radii.get(index)?;
                (distance <= radius.max(6.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn hovered_index(&self, ui: &Ui) -> Option<usize> {
        ui.input(|input| input.pointer.hover_pos())
            .and_then(|pointer| self.node_at(pointer))
    }
}
