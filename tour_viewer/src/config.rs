use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

/// What `next`/`previous` do at either end of the scene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Last scene continues to the first and vice versa.
    #[default]
    Wrap,
    /// Navigation stops at the ends; the arrow for that direction is hidden.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RotationAxes {
    /// Horizontal drags only; vertical motion is ignored.
    YawOnly,
    #[default]
    YawPitch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub initial_scene: usize,
    pub auto_rotate: bool,
    pub show_controls: bool,
    pub show_hotspots: bool,
    pub display_height: Option<u32>,
    pub boundary: BoundaryPolicy,
    pub axes: RotationAxes,
    /// Degrees of rotation per pixel of mouse travel.
    pub mouse_sensitivity: f32,
    /// Degrees of rotation per pixel of touch travel.
    pub touch_sensitivity: f32,
    pub pitch_limit: f32,
    pub auto_rotate_interval_ms: u64,
    pub auto_rotate_step: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_scene: 0,
            auto_rotate: false,
            show_controls: true,
            show_hotspots: true,
            display_height: None,
            boundary: BoundaryPolicy::Wrap,
            axes: RotationAxes::YawPitch,
            mouse_sensitivity: 0.5,
            touch_sensitivity: 0.3,
            pitch_limit: 90.0,
            auto_rotate_interval_ms: 100,
            auto_rotate_step: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("pitch_limit must be within (0, 90] degrees (got {0})")]
    PitchLimit(f32),
    #[error("auto_rotate_interval_ms must be greater than zero")]
    ZeroInterval,
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("mouse_sensitivity", self.mouse_sensitivity),
            ("touch_sensitivity", self.touch_sensitivity),
            ("auto_rotate_step", self.auto_rotate_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(self.pitch_limit > 0.0 && self.pitch_limit <= 90.0) {
            return Err(ConfigError::PitchLimit(self.pitch_limit));
        }
        if self.auto_rotate_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Replaces every out-of-range tuning value with its default, logging
    /// each substitution.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for (name, value, fallback) in [
            (
                "mouse_sensitivity",
                &mut self.mouse_sensitivity,
                defaults.mouse_sensitivity,
            ),
            (
                "touch_sensitivity",
                &mut self.touch_sensitivity,
                defaults.touch_sensitivity,
            ),
            (
                "auto_rotate_step",
                &mut self.auto_rotate_step,
                defaults.auto_rotate_step,
            ),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                log::warn!("{name} {value} is not positive; using {fallback}");
                *value = fallback;
            }
        }
        if !(self.pitch_limit > 0.0 && self.pitch_limit <= 90.0) {
            log::warn!(
                "pitch_limit {} outside (0, 90]; using {}",
                self.pitch_limit,
                defaults.pitch_limit
            );
            self.pitch_limit = defaults.pitch_limit;
        }
        if self.auto_rotate_interval_ms == 0 {
            log::warn!(
                "auto_rotate_interval_ms is zero; using {}",
                defaults.auto_rotate_interval_ms
            );
            self.auto_rotate_interval_ms = defaults.auto_rotate_interval_ms;
        }
        self
    }

    pub fn auto_rotate_interval(&self) -> Duration {
        Duration::from_millis(self.auto_rotate_interval_ms)
    }

    /// Initial scene clamped into the tour; out-of-range values fall back to
    /// the last scene.
    pub fn initial_scene_for(&self, scene_count: usize) -> usize {
        if scene_count == 0 {
            return 0;
        }
        if self.initial_scene >= scene_count {
            log::warn!(
                "initial scene {} outside tour of {} scenes; using {}",
                self.initial_scene,
                scene_count,
                scene_count - 1
            );
            return scene_count - 1;
        }
        self.initial_scene
    }
}

pub fn load_viewer_preset(path: &Path) -> Result<ViewerConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading viewer preset {}", path.display()))?;
    let config: ViewerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing viewer preset {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating viewer preset {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_pointer_tuning() {
        let config = ViewerConfig::default();
        assert_eq!(config.mouse_sensitivity, 0.5);
        assert_eq!(config.touch_sensitivity, 0.3);
        assert_eq!(config.pitch_limit, 90.0);
        assert_eq!(config.auto_rotate_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn preset_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp preset");
        write!(
            file,
            r#"{{"boundary": "clamp", "axes": "yaw_only", "auto_rotate": true}}"#
        )
        .expect("write preset");

        let config = load_viewer_preset(file.path()).expect("preset loads");
        assert_eq!(config.boundary, BoundaryPolicy::Clamp);
        assert_eq!(config.axes, RotationAxes::YawOnly);
        assert!(config.auto_rotate);
        assert_eq!(config.mouse_sensitivity, 0.5);
    }

    #[test]
    fn preset_with_bad_pitch_limit_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp preset");
        write!(file, r#"{{"pitch_limit": 120}}"#).expect("write preset");
        let err = load_viewer_preset(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("pitch_limit"));
    }

    #[test]
    fn initial_scene_is_clamped_to_tour() {
        let config = ViewerConfig {
            initial_scene: 7,
            ..ViewerConfig::default()
        };
        assert_eq!(config.initial_scene_for(3), 2);
        assert_eq!(config.initial_scene_for(0), 0);
    }

    #[test]
    fn zero_sensitivity_fails_validation() {
        let config = ViewerConfig {
            touch_sensitivity: 0.0,
            ..ViewerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "touch_sensitivity",
                value: 0.0
            })
        );
    }

    #[test]
    fn sanitizing_replaces_only_bad_values() {
        let config = ViewerConfig {
            pitch_limit: f32::NAN,
            mouse_sensitivity: -1.0,
            touch_sensitivity: 0.8,
            auto_rotate_interval_ms: 0,
            boundary: BoundaryPolicy::Clamp,
            ..ViewerConfig::default()
        }
        .sanitized();
        assert_eq!(config.pitch_limit, 90.0);
        assert_eq!(config.mouse_sensitivity, 0.5);
        assert_eq!(config.touch_sensitivity, 0.8);
        assert_eq!(config.auto_rotate_interval_ms, 100);
        assert_eq!(config.boundary, BoundaryPolicy::Clamp);
        assert!(config.validate().is_ok());
    }
}
