use log::debug;

const MIN_DURATION_SECS: f64 = 60.0;
const DURATION_TAIL_SECS: f64 = 30.0;

/// Stand-in for the lecture video element: a clock that plays, pauses and
/// seeks, and pushes its position to the graph on a fixed tick.
pub(in crate::app) struct PlaybackClock {
    position: f64,
    duration: f64,
    playing: bool,
    tick_interval: f64,
    since_tick: f64,
    tick_due: bool,
}

impl PlaybackClock {
    pub(in crate::app) fn new(duration: f64, tick_interval: f64) -> Self {
        Self {
            position: 0.0,
            duration: duration.max(1.0),
            playing: false,
            tick_interval: tick_interval.max(0.0),
            since_tick: 0.0,
            tick_due: true,
        }
    }

    /// Duration covering every timestamp in a snapshot, with some tail.
    pub(in crate::app) fn duration_for(latest_timestamp: Option<f64>) -> f64 {
        latest_timestamp
            .map(|latest| latest + DURATION_TAIL_SECS)
            .unwrap_or(0.0)
            .max(MIN_DURATION_SECS)
    }

    pub(in crate::app) fn position(&self) -> f64 {
        self.position
    }

    pub(in crate::app) fn duration(&self) -> f64 {
        self.duration
    }

    pub(in crate::app) fn is_playing(&self) -> bool {
        self.playing
    }

    pub(in crate::app) fn toggle(&mut self) {
        self.playing = !self.playing;
        if self.playing && self.position >= self.duration {
            self.position = 0.0;
            self.tick_due = true;
        }
    }

    pub(in crate::app) fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(1.0);
        if self.position > self.duration {
            self.seek(self.duration);
        }
    }

    pub(in crate::app) fn seek(&mut self, position: f64) {
        if !position.is_finite() {
            return;
        }
        self.position = position.clamp(0.0, self.duration);
        self.tick_due = true;
        debug!("playback seek to {:.2}s", self.position);
    }

    /// Moves the clock by `delta_secs` when playing. Returns the position
    /// when a sync tick is due.
    pub(in crate::app) fn advance(&mut self, delta_secs: f64) -> Option<f64> {
        if self.playing && delta_secs.is_finite() && delta_secs > 0.0 {
            self.position = (self.position + delta_secs).min(self.duration);
            self.since_tick += delta_secs;
            if self.since_tick >= self.tick_interval {
                self.since_tick = 0.0;
                self.tick_due = true;
            }
            if self.position >= self.duration {
                self.playing = false;
                self.tick_due = true;
            }
        }

        if self.tick_due {
            self.tick_due = false;
            Some(self.position)
        } else {
            None
        }
    }
}
