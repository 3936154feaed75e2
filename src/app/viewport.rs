use eframe::egui::{Pos2, Rect, Vec2, vec2};

pub(in crate::app) const MIN_SCALE: f32 = 0.1;
pub(in crate::app) const MAX_SCALE: f32 = 4.0;
const ZOOM_STEP: f32 = 1.5;
const FOCUS_ZOOM_FACTOR: f32 = 1.3;
const FOCUS_MIN_SCALE: f32 = 1.2;
const FOCUS_MAX_SCALE: f32 = 2.0;
const FOCUS_VERTICAL_BIAS: f32 = 0.1;

/// Screen position of a world point is `rect.center() + translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ZoomTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ZoomTransform {
    pub(in crate::app) const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub(in crate::app) fn world_to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.translate + world * self.scale
    }

    pub(in crate::app) fn screen_to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.translate) / self.scale
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug)]
struct FocusAnimation {
    from: ZoomTransform,
    to: ZoomTransform,
    started_at: f64,
    duration: f64,
}

impl FocusAnimation {
    fn sample(&self, now: f64) -> (ZoomTransform, bool) {
        if self.duration <= 0.0 {
            return (self.to, true);
        }

        let progress = ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32;
        if progress >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(self.to, ease_in_out_cubic(progress)), false)
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// Scale reached by a focus move: at least a 1.3x step in, kept legible.
pub(in crate::app) fn focus_scale(current: f32) -> f32 {
    (current * FOCUS_ZOOM_FACTOR).clamp(FOCUS_MIN_SCALE, FOCUS_MAX_SCALE)
}

pub(in crate::app) struct Viewport {
    transform: ZoomTransform,
    animation: Option<FocusAnimation>,
    focus_duration: f64,
}

impl Viewport {
    pub(in crate::app) fn new(focus_duration: f64) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            animation: None,
            focus_duration: focus_duration.max(0.0),
        }
    }

    pub(in crate::app) fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub(in crate::app) fn zoom_in(&mut self) {
        self.zoom_about(Vec2::ZERO, ZOOM_STEP);
    }

    pub(in crate::app) fn zoom_out(&mut self) {
        self.zoom_about(Vec2::ZERO, 1.0 / ZOOM_STEP);
    }

    /// Zooms keeping the world point under `anchor` (offset from the canvas
    /// center) fixed on screen.
    pub(in crate::app) fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        self.animation = None;
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let old_scale = self.transform.scale;
        let new_scale = clamp_scale(old_scale * factor);
        let world_under_anchor = (anchor - self.transform.translate) / old_scale;
        self.transform.scale = new_scale;
        self.transform.translate = anchor - world_under_anchor * new_scale;
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        self.animation = None;
        if delta.is_finite() {
            self.transform.translate += delta;
        }
    }

    pub(in crate::app) fn reset(&mut self) {
        self.set_immediately(ZoomTransform::IDENTITY);
    }

    pub(in crate::app) fn set_immediately(&mut self, transform: ZoomTransform) {
        self.animation = None;
        self.transform = ZoomTransform {
            translate: transform.translate,
            scale: clamp_scale(transform.scale),
        };
    }

    /// Starts an eased camera move centring `world` slightly above the middle
    /// of a `viewport_size` canvas. Returns the destination transform.
    pub(in crate::app) fn focus_on(
        &mut self,
        world: Vec2,
        viewport_size: Vec2,
        now: f64,
    ) -> ZoomTransform {
        let scale = focus_scale(self.transform.scale);
        let target = ZoomTransform {
            translate: -(world * scale) - vec2(0.0, viewport_size.y * FOCUS_VERTICAL_BIAS),
            scale,
        };

        self.animation = Some(FocusAnimation {
            from: self.transform,
            to: target,
            started_at: now,
            duration: self.focus_duration,
        });
        self.advance(now);
        target
    }

    /// Applies any running focus animation. Returns whether it is still running.
    pub(in crate::app) fn advance(&mut self, now: f64) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };

        let (transform, finished) = animation.sample(now);
        self.transform = transform;
        if finished {
            self.animation = None;
        }
        !finished
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 800.0))
    }

    #[test]
    fn zoom_is_clamped_after_many_steps() {
        let mut viewport = Viewport::new(0.75);
        for _ in 0..50 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.transform().scale, MAX_SCALE);

        for _ in 0..50 {
            viewport.zoom_out();
        }
        assert!((viewport.transform().scale - MIN_SCALE).abs() < 1e-6);
    }

    #[test]
    fn zoom_steps_by_one_and_a_half() {
        let mut viewport = Viewport::new(0.75);
        viewport.zoom_in();
        assert!((viewport.transform().scale - 1.5).abs() < 1e-6);
        viewport.zoom_out();
        assert!((viewport.transform().scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let rect = canvas();
        let mut viewport = Viewport::new(0.75);
        viewport.pan_by(vec2(40.0, -25.0));

        let pointer = pos2(700.0, 300.0);
        let world_before = viewport.transform().screen_to_world(rect, pointer);
        viewport.zoom_about(pointer - rect.center(), 2.0);
        let screen_after = viewport.transform().world_to_screen(rect, world_before);

        assert!((screen_after - pointer).length() < 1e-3);
    }

    #[test]
    fn focus_scale_stays_in_legible_band() {
        for current in [0.1, 0.5, 0.9, 1.0, 1.2, 1.5, 1.7, 2.0, 3.0, 4.0] {
            let scale = focus_scale(current);
            assert!((FOCUS_MIN_SCALE..=FOCUS_MAX_SCALE).contains(&scale));
            if current < FOCUS_MIN_SCALE {
                assert!(scale >= current);
            }
        }
        assert!((focus_scale(1.5) - 1.95).abs() < 1e-6);
    }

    #[test]
    fn focus_centres_node_above_middle() {
        let rect = canvas();
        let mut viewport = Viewport::new(0.75);
        let node = vec2(120.0, -60.0);

        viewport.focus_on(node, rect.size(), 10.0);
        assert!(viewport.is_animating());
        assert!(!viewport.advance(10.75));

        let screen = viewport.transform().world_to_screen(rect, node);
        assert!((screen.x - rect.center().x).abs() < 1e-3);
        assert!((screen.y - (rect.center().y - 80.0)).abs() < 1e-3);
        assert!((viewport.transform().scale - 1.3).abs() < 1e-6);
    }

    #[test]
    fn focus_animation_is_continuous() {
        let mut viewport = Viewport::new(0.75);
        viewport.pan_by(vec2(10.0, 10.0));
        let start = viewport.transform();

        let target = viewport.focus_on(vec2(300.0, 300.0), vec2(1000.0, 800.0), 0.0);
        assert_eq!(viewport.transform(), start);

        let mut previous = start;
        for frame in 1..=45 {
            viewport.advance(frame as f64 / 60.0);
            let current = viewport.transform();
            let jump = (current.translate - previous.translate).length();
            assert!(jump < (target.translate - start.translate).length() * 0.1);
            previous = current;
        }
        assert_eq!(viewport.transform(), target);
    }

    #[test]
    fn gestures_cancel_focus_animation() {
        let mut viewport = Viewport::new(0.75);
        viewport.focus_on(vec2(50.0, 50.0), vec2(800.0, 600.0), 0.0);
        viewport.pan_by(vec2(5.0, 0.0));
        assert!(!viewport.is_animating());
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut viewport = Viewport::new(0.75);
        viewport.zoom_in();
        viewport.pan_by(vec2(-30.0, 12.0));
        viewport.reset();
        assert_eq!(viewport.transform(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn screen_and_world_round_trip() {
        let rect = canvas();
        let transform = ZoomTransform {
            translate: vec2(33.0, -17.0),
            scale: 2.5,
        };
        let world = vec2(-48.0, 91.0);
        let back = transform.screen_to_world(rect, transform.world_to_screen(rect, world));
        assert!((back - world).length() < 1e-3);
    }
}
