use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::concept::FIRST_ORDER_SIZE_THRESHOLD;

pub const DEFAULT_ACTIVATION_WINDOW_SECS: f64 = 15.0;
pub const MIN_ACTIVATION_WINDOW_SECS: f64 = 0.5;
pub const MAX_ACTIVATION_WINDOW_SECS: f64 = 120.0;
const MIN_TICK_INTERVAL_SECS: f64 = 1.0 / 60.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub graph: GraphSettings,
    pub layout: LayoutSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// A node is active while playback is strictly closer than this to one of its timestamps.
    pub activation_window_secs: f64,
    pub tick_interval_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub first_order_size_threshold: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub carry_positions: bool,
    pub focus_duration_secs: f64,
    pub max_coordinate: f32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            activation_window_secs: DEFAULT_ACTIVATION_WINDOW_SECS,
            tick_interval_secs: 0.25,
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            first_order_size_threshold: FIRST_ORDER_SIZE_THRESHOLD,
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            carry_positions: false,
            focus_duration_secs: 0.75,
            max_coordinate: 50_000.0,
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings JSON in {}", path.display()))?;
        info!("loaded settings from {}", path.display());
        Ok(settings.normalized())
    }

    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();

        self.sync.activation_window_secs = clamp_or(
            self.sync.activation_window_secs,
            MIN_ACTIVATION_WINDOW_SECS,
            MAX_ACTIVATION_WINDOW_SECS,
            defaults.sync.activation_window_secs,
        );
        self.sync.tick_interval_secs = clamp_or(
            self.sync.tick_interval_secs,
            MIN_TICK_INTERVAL_SECS,
            5.0,
            defaults.sync.tick_interval_secs,
        );
        self.layout.focus_duration_secs = clamp_or(
            self.layout.focus_duration_secs,
            0.0,
            5.0,
            defaults.layout.focus_duration_secs,
        );
        if !self.layout.max_coordinate.is_finite() || self.layout.max_coordinate < 100.0 {
            self.layout.max_coordinate = defaults.layout.max_coordinate;
        }
        if !self.graph.first_order_size_threshold.is_finite() {
            self.graph.first_order_size_threshold = defaults.graph.first_order_size_threshold;
        }

        self
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_path_uses_defaults() {
        let settings = Settings::load(None).expect("defaults load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sync.activation_window_secs, 15.0);
        assert_eq!(settings.graph.first_order_size_threshold, 18.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"sync": {{"activation_window_secs": 5}}}}"#).expect("write settings");

        let settings = Settings::load(Some(file.path())).expect("settings load");
        assert_eq!(settings.sync.activation_window_secs, 5.0);
        assert_eq!(settings.sync.tick_interval_secs, 0.25);
        assert!(!settings.layout.carry_positions);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut settings = Settings::default();
        settings.sync.activation_window_secs = -3.0;
        settings.sync.tick_interval_secs = f64::NAN;
        settings.layout.max_coordinate = 1.0;

        let settings = settings.normalized();
        assert_eq!(settings.sync.activation_window_secs, MIN_ACTIVATION_WINDOW_SECS);
        assert_eq!(settings.sync.tick_interval_secs, 0.25);
        assert_eq!(settings.layout.max_coordinate, 50_000.0);
    }

    #[test]
    fn invalid_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ nope").expect("write settings");

        let error = Settings::load(Some(file.path())).expect_err("invalid settings fail");
        assert!(format!("{error:#}").contains("invalid settings JSON"));
    }
}
