use log::debug;

use crate::config::{MAX_ACTIVATION_WINDOW_SECS, MIN_ACTIVATION_WINDOW_SECS};

use super::graph::ViewNode;

/// True iff some timestamp lies strictly within `window` seconds of `clock`.
pub(in crate::app) fn is_active_at(timestamps: &[f64], clock: f64, window: f64) -> bool {
    timestamps
        .iter()
        .any(|timestamp| (timestamp - clock).abs() < window)
}

pub(in crate::app) struct ActivationSync {
    window_secs: f64,
    clock: Option<f64>,
}

impl ActivationSync {
    pub(in crate::app) fn new(window_secs: f64) -> Self {
        Self {
            window_secs: clamp_window(window_secs),
            clock: None,
        }
    }

    pub(in crate::app) fn window_secs(&self) -> f64 {
        self.window_secs
    }

    pub(in crate::app) fn clock(&self) -> Option<f64> {
        self.clock
    }

    pub(in crate::app) fn set_window(&mut self, window_secs: f64) {
        self.window_secs = clamp_window(window_secs);
    }

    /// Records the playback position and recomputes every node. Returns
    /// whether any node flipped.
    pub(in crate::app) fn apply_clock(&mut self, clock: f64, nodes: &mut [ViewNode]) -> bool {
        if !clock.is_finite() {
            return false;
        }
        self.clock = Some(clock);
        self.refresh(nodes)
    }

    pub(in crate::app) fn refresh(&self, nodes: &mut [ViewNode]) -> bool {
        let mut changed = 0usize;
        for node in nodes {
            let active = self
                .clock
                .is_some_and(|clock| is_active_at(&node.timestamps, clock, self.window_secs));
            if node.is_active != active {
                node.is_active = active;
                changed += 1;
            }
        }

        if changed > 0 {
            debug!(
                "activation changed for {changed} concepts at {:?}s",
                self.clock
            );
        }
        changed > 0
    }
}

fn clamp_window(window_secs: f64) -> f64 {
    if window_secs.is_finite() {
        window_secs.clamp(MIN_ACTIVATION_WINDOW_SECS, MAX_ACTIVATION_WINDOW_SECS)
    } else {
        crate::config::DEFAULT_ACTIVATION_WINDOW_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::tests::view_node;

    #[test]
    fn scenario_ticks_follow_window() {
        assert!(is_active_at(&[0.0, 20.0], 12.0, 15.0));
        assert!(!is_active_at(&[0.0, 20.0], 40.0, 15.0));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        assert!(!is_active_at(&[30.0], 45.0, 15.0));
        assert!(!is_active_at(&[30.0], 15.0, 15.0));
        assert!(is_active_at(&[30.0], 44.999, 15.0));
        assert!(is_active_at(&[30.0], 15.001, 15.0));
    }

    #[test]
    fn unsorted_and_empty_timestamps() {
        assert!(is_active_at(&[300.0, 5.0, 90.0], 8.0, 5.0));
        assert!(!is_active_at(&[], 0.0, 15.0));
    }

    #[test]
    fn apply_clock_reports_only_real_changes() {
        let mut sync = ActivationSync::new(15.0);
        let mut nodes = vec![view_node("a", &[0.0, 20.0]), view_node("b", &[100.0])];

        assert!(sync.apply_clock(12.0, &mut nodes));
        assert!(nodes[0].is_active);
        assert!(!nodes[1].is_active);

        assert!(!sync.apply_clock(13.0, &mut nodes), "same flags, no update");
        assert!(sync.apply_clock(95.0, &mut nodes));
        assert!(!nodes[0].is_active);
        assert!(nodes[1].is_active);
    }

    #[test]
    fn narrower_window_deactivates_on_refresh() {
        let mut sync = ActivationSync::new(15.0);
        let mut nodes = vec![view_node("a", &[20.0])];
        sync.apply_clock(12.0, &mut nodes);
        assert!(nodes[0].is_active);

        sync.set_window(5.0);
        assert!(sync.refresh(&mut nodes));
        assert!(!nodes[0].is_active);
    }

    #[test]
    fn no_clock_means_nothing_active() {
        let sync = ActivationSync::new(15.0);
        let mut nodes = vec![view_node("a", &[0.0])];
        assert!(!sync.refresh(&mut nodes));
        assert!(!nodes[0].is_active);
        assert_eq!(sync.clock(), None);
    }
}
