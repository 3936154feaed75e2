use eframe::egui::{self, Color32, Rect, Sense, Stroke, Ui, pos2, vec2};

use crate::util::format_clock;

use super::super::ViewModel;
use super::super::render_utils::{ACTIVE_COLOR, color_for, dim_color};

const STRIP_HEIGHT: f32 = 22.0;

/// Horizontal position of `seconds` on a strip spanning `rect`.
fn marker_x(rect: Rect, seconds: f64, duration: f64) -> f32 {
    let fraction = if duration > 0.0 {
        (seconds / duration).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    rect.left() + fraction * rect.width()
}

fn seconds_at(rect: Rect, x: f32, duration: f64) -> f64 {
    if rect.width() <= 0.0 {
        return 0.0;
    }
    f64::from(((x - rect.left()) / rect.width()).clamp(0.0, 1.0)) * duration
}

impl ViewModel {
    pub(in crate::app) fn draw_timeline(&mut self, ui: &mut Ui) {
        let duration = self.playback.duration();
        let mut position = self.playback.position();

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let label = if self.playback.is_playing() { "Pause" } else { "Play" };
            if ui.button(label).on_hover_text("Space").clicked() {
                self.playback.toggle();
            }
            ui.monospace(format!(
                "{} / {}",
                format_clock(position),
                format_clock(duration)
            ));

            ui.spacing_mut().slider_width = (ui.available_width() - 16.0).max(80.0);
            let response = ui.add(
                egui::Slider::new(&mut position, 0.0..=duration)
                    .show_value(false)
                    .trailing_fill(true),
            );
            if response.changed() {
                self.session.request_seek(position);
            }
        });

        let (rect, response) = ui.allocate_exact_size(
            vec2(ui.available_width(), STRIP_HEIGHT),
            Sense::click(),
        );
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 3.0, Color32::from_rgb(28, 32, 40));

        let view = self.session.view();
        for node in &view.nodes {
            let base = color_for(node.category);
            for &seconds in &node.timestamps {
                let x = marker_x(rect, seconds, duration);
                let (inset, color, width) = if node.is_active {
                    (1.0, ACTIVE_COLOR, 2.5)
                } else {
                    (6.0, dim_color(base, 0.8), 1.5)
                };
                painter.line_segment(
                    [pos2(x, rect.top() + inset), pos2(x, rect.bottom() - inset)],
                    Stroke::new(width, color),
                );
            }
        }

        let playhead = marker_x(rect, self.playback.position(), duration);
        painter.line_segment(
            [pos2(playhead, rect.top()), pos2(playhead, rect.bottom())],
            Stroke::new(2.0, Color32::WHITE),
        );

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.session.request_seek(seconds_at(rect, pointer.x, duration));
        }
        ui.add_space(4.0);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Pos2;

    use super::*;

    fn strip() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 0.0), vec2(600.0, STRIP_HEIGHT))
    }

    #[test]
    fn markers_span_the_strip() {
        assert_eq!(marker_x(strip(), 0.0, 120.0), 100.0);
        assert_eq!(marker_x(strip(), 60.0, 120.0), 400.0);
        assert_eq!(marker_x(strip(), 500.0, 120.0), 700.0);
        assert_eq!(marker_x(strip(), 5.0, 0.0), 100.0);
    }

    #[test]
    fn strip_clicks_map_back_to_seconds() {
        assert_eq!(seconds_at(strip(), 400.0, 120.0), 60.0);
        assert_eq!(seconds_at(strip(), 20.0, 120.0), 0.0);
        assert_eq!(seconds_at(strip(), 900.0, 120.0), 120.0);
    }
}
