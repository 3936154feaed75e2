use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::concept::{Category, EdgeKind};

use super::viewport::ZoomTransform;

pub(super) const ACTIVE_COLOR: Color32 = Color32::from_rgb(255, 214, 92);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

/// Static category palette.
pub(super) fn color_for(category: Category) -> Color32 {
    match category {
        Category::Definition => Color32::from_rgb(86, 156, 232),
        Category::Example => Color32::from_rgb(104, 196, 128),
        Category::Application => Color32::from_rgb(232, 140, 86),
        Category::Prerequisite => Color32::from_rgb(176, 122, 220),
    }
}

pub(super) fn edge_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::Prerequisite => Color32::from_rgb(150, 118, 196),
        EdgeKind::Related => Color32::from_rgb(110, 118, 130),
        EdgeKind::Example => Color32::from_rgb(96, 160, 116),
        EdgeKind::Application => Color32::from_rgb(196, 132, 90),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount).round() as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    let scale = |channel: u8| (channel as f32 * factor) as u8;
    Color32::from_rgba_unmultiplied(
        scale(color.r()),
        scale(color.g()),
        scale(color.b()),
        (color.a() as f32 * (0.4 + factor * 0.6)) as u8,
    )
}

/// On-screen radius for a node of visual weight `size`.
pub(super) fn node_radius(size: f32, scale: f32) -> f32 {
    (size.max(1.0) * scale).clamp(3.0, 60.0)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ZoomTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(21, 24, 30));

    let step = (64.0 * transform.scale.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(58, 66, 78, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Conservative test: the segment's bounding box touches the canvas.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end)
        .expand(padding)
        .intersects(rect)
}
