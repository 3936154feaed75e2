use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{format_clock, short_label};

use super::super::highlight::build_highlight_state_for_selected_id;
use super::super::render_utils::{
    ACTIVE_COLOR, SELECTED_COLOR, blend_color, circle_visible, color_for, dim_color,
    draw_background, edge_color, edge_visible, node_radius,
};
use super::super::viewport::ZoomTransform;
use super::super::{SearchMatchCache, ViewModel};
use super::ViewGraph;

const LABEL_CHARS: usize = 28;
const ARROW_LENGTH: f32 = 9.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Indices of view nodes whose label fuzzily matches `query`.
pub(in crate::app) fn search_matches(view: &ViewGraph, query: &str) -> HashSet<usize> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    view.nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            fuzzy_match_score(&matcher, &node.label, query).is_some()
                || fuzzy_match_score(&matcher, &node.id, query).is_some()
        })
        .map(|(index, _)| index)
        .collect()
}

fn draw_arrow(painter: &egui::Painter, tip: Pos2, direction: Vec2, stroke: Stroke) {
    let direction = direction.normalized();
    if !direction.is_finite() {
        return;
    }

    let normal = vec2(-direction.y, direction.x);
    let back = tip - direction * ARROW_LENGTH;
    painter.line_segment([tip, back + normal * (ARROW_LENGTH * 0.45)], stroke);
    painter.line_segment([tip, back - normal * (ARROW_LENGTH * 0.45)], stroke);
}

impl ViewModel {
    fn update_screen_space(&mut self, rect: Rect, transform: ZoomTransform) {
        let view = self.session.view();
        let scratch = &mut self.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        scratch.visible_indices.clear();

        for (index, node) in view.nodes.iter().enumerate() {
            let position = transform.world_to_screen(rect, view.position(index));
            let radius = node_radius(node.size, transform.scale);
            let visible = circle_visible(rect, position, radius);
            scratch.screen_positions.push(position);
            scratch.screen_radii.push(radius);
            if visible {
                scratch.visible_indices.push(index);
            }
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.session.view().revision;
        if let Some(cached) = &self.search_match_cache
            && cached.view_revision == revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(search_matches(self.session.view(), query));
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            view_revision: revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.input(|input| input.time);

        self.update_screen_space(rect, self.session.viewport().transform());
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pointer(ui, rect, &response);

        if self.session.tick(now, rect.size(), self.live_physics) {
            ui.ctx().request_repaint();
        }

        let transform = self.session.viewport().transform();
        self.update_screen_space(rect, transform);
        draw_background(&painter, rect, transform);

        if self.session.view().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No concepts to show for this video.",
                FontId::proportional(16.0),
                Color32::from_gray(190),
            );
            return;
        }

        if self.show_quadtree_overlay {
            self.session
                .view()
                .simulation
                .quadtree_cells(&mut self.view_scratch.quadtree_cells);
            for cell in &self.view_scratch.quadtree_cells {
                let half = vec2(cell.half_extent, cell.half_extent);
                let min = transform.world_to_screen(rect, cell.center - half);
                let max = transform.world_to_screen(rect, cell.center + half);
                let alpha = if cell.is_leaf { 100 } else { 45 };
                let width = (1.3 - cell.depth as f32 * 0.08).clamp(0.4, 1.3);
                painter.rect_stroke(
                    Rect::from_min_max(min, max),
                    0.0,
                    Stroke::new(width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                    egui::StrokeKind::Middle,
                );
            }
        }

        let search_matches = self.cached_search_matches();
        let hovered = self.hovered_index(ui);
        if self.session.is_dragging() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        } else if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let view = self.session.view();
        let scratch = &self.view_scratch;
        let highlight = self
            .session
            .selected()
            .and_then(|id| build_highlight_state_for_selected_id(view, id));
        let selection_active = highlight.as_ref().is_some_and(|state| !state.is_empty());
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let zoom_sqrt = transform.scale.sqrt();

        for (edge_index, edge) in view.edges.iter().enumerate() {
            let (Some(&start), Some(&end)) = (
                scratch.screen_positions.get(edge.source),
                scratch.screen_positions.get(edge.target),
            ) else {
                continue;
            };
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let in_chain = highlight
                .as_ref()
                .is_some_and(|state| state.chain_edges.contains(&edge_index));
            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.related_edges.contains(&edge_index));
            let is_active = view.edge_is_active(edge);

            let base_width = (0.8 + edge.strength * 2.2) * zoom_sqrt;
            let base = edge_color(edge.kind);
            let (width, color) = if in_chain {
                (base_width + 1.6, Color32::from_rgb(246, 206, 104))
            } else if is_related {
                (base_width + 1.0, blend_color(base, Color32::from_rgb(241, 146, 94), 0.6))
            } else if is_active {
                (base_width + 1.2, blend_color(base, ACTIVE_COLOR, 0.7))
            } else if selection_active || search_active {
                (base_width, dim_color(base, 0.45))
            } else {
                (base_width, base)
            };
            let stroke = Stroke::new(width.clamp(0.5, 6.0), color);

            let direction = end - start;
            let target_radius = scratch.screen_radii.get(edge.target).copied().unwrap_or(0.0);
            let tip = end - direction.normalized() * target_radius;
            painter.line_segment([start, end], stroke);
            if direction.length() > target_radius + ARROW_LENGTH {
                draw_arrow(&painter, tip, direction, stroke);
            }
        }

        let mut selection_animating = false;
        for &index in &scratch.visible_indices {
            let node = &view.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];

            let is_selected = self.session.selected() == Some(node.id.as_str());
            let is_hovered = hovered == Some(index);
            let in_chain = highlight
                .as_ref()
                .is_some_and(|state| state.chain_nodes.contains(&index));
            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.related_nodes.contains(&index));
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base = color_for(node.category);
            let fill = if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else if in_chain {
                blend_color(base, Color32::from_rgb(247, 194, 111), 0.55)
            } else if is_related || is_match {
                base
            } else if selection_active || search_active {
                dim_color(base, 0.45)
            } else {
                base
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("concept-selection", node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            if node.is_active {
                painter.circle_filled(
                    position,
                    radius + 6.0,
                    Color32::from_rgba_unmultiplied(255, 214, 92, 70),
                );
            }
            painter.circle_filled(position, radius, blend_color(fill, SELECTED_COLOR, selection_mix * 0.5));

            let ring = if node.is_active {
                Stroke::new(2.4, ACTIVE_COLOR)
            } else if is_match {
                Stroke::new(2.0, Color32::from_rgb(103, 196, 255))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(12, 12, 12, 190))
            };
            painter.circle_stroke(position, radius, ring);
            if selection_mix > 0.0 {
                painter.circle_stroke(
                    position,
                    radius + 3.0 + (1.0 - selection_mix) * 6.0,
                    Stroke::new(1.8, SELECTED_COLOR.gamma_multiply(selection_mix)),
                );
            }

            let show_label = is_selected
                || is_hovered
                || is_related
                || in_chain
                || is_match
                || node.is_active
                || radius > 12.0
                || transform.scale > 1.2;
            if show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_label(&node.label, LABEL_CHARS),
                    FontId::proportional(12.0),
                    Color32::from_gray(236),
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(index) = hovered
            && let Some(node) = view.nodes.get(index)
        {
            let first_mention = node
                .timestamps
                .first()
                .map(|&seconds| format_clock(seconds))
                .unwrap_or_else(|| "never mentioned".to_owned());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  first at {}",
                    node.label,
                    node.category.label(),
                    first_mention
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
