//! Session Settings
//!
//! Fixed configuration of an editing session. The timeline duration is a
//! session constant and is never derived from keyframe positions.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kinema_core::settings::TimelineSettings;
//!
//! let settings = TimelineSettings {
//!     duration_ms: 8000.0,
//!     loop_playback: true,
//!     ..Default::default()
//! };
//! settings.validate()?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{KinemaError, Result};

// ---------------------------------------------------------------------------
// SmoothingSettings
// ---------------------------------------------------------------------------

/// Configuration of the render-side smoothing stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub enabled: bool,
    /// Approach rate per second; each frame moves `clamp(dt * speed, 0, 1)`
    /// of the remaining distance.
    pub speed: f32,
    /// Differences at or below this are considered settled.
    pub threshold: f32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 8.0,
            threshold: 0.001,
        }
    }
}

// ---------------------------------------------------------------------------
// TimelineSettings
// ---------------------------------------------------------------------------

/// Session-wide timeline configuration. All times are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub duration_ms: f32,
    /// Display frame rate for the frame counter.
    pub fps: u32,
    /// Writes closer than this to an existing keyframe overwrite it.
    pub keyframe_epsilon_ms: f32,
    /// `play()` from within this distance of the end rewinds to 0 first.
    pub rewind_margin_ms: f32,
    pub loop_playback: bool,
    pub smoothing: SmoothingSettings,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            duration_ms: 5000.0,
            fps: 30,
            keyframe_epsilon_ms: 50.0,
            rewind_margin_ms: 100.0,
            loop_playback: false,
            smoothing: SmoothingSettings::default(),
        }
    }
}

impl TimelineSettings {
    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(KinemaError::InvalidSettings(format!(
                "duration_ms must be positive, got {}",
                self.duration_ms
            )));
        }
        if self.fps == 0 {
            return Err(KinemaError::InvalidSettings("fps must be non-zero".into()));
        }
        if !(self.keyframe_epsilon_ms.is_finite() && self.keyframe_epsilon_ms >= 0.0) {
            return Err(KinemaError::InvalidSettings(format!(
                "keyframe_epsilon_ms must be non-negative, got {}",
                self.keyframe_epsilon_ms
            )));
        }
        if !(self.rewind_margin_ms.is_finite() && self.rewind_margin_ms >= 0.0) {
            return Err(KinemaError::InvalidSettings(format!(
                "rewind_margin_ms must be non-negative, got {}",
                self.rewind_margin_ms
            )));
        }
        if !(self.smoothing.speed.is_finite() && self.smoothing.speed >= 0.0) {
            return Err(KinemaError::InvalidSettings(format!(
                "smoothing.speed must be non-negative, got {}",
                self.smoothing.speed
            )));
        }
        Ok(())
    }

    /// Parses and validates settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        log::info!("Loaded timeline settings from {}", path.display());
        Ok(settings)
    }

    /// Total number of display frames across the timeline.
    #[must_use]
    pub fn total_frames(&self) -> u32 {
        ((self.duration_ms / 1000.0) * self.fps as f32).round() as u32
    }

    #[must_use]
    pub fn time_to_frame(&self, time_ms: f32) -> u32 {
        ((time_ms / self.duration_ms) * self.total_frames() as f32)
            .round()
            .max(0.0) as u32
    }

    #[must_use]
    pub fn frame_to_time(&self, frame: u32) -> f32 {
        (frame as f32 / self.total_frames() as f32) * self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor() {
        let s = TimelineSettings::default();
        assert!((s.duration_ms - 5000.0).abs() < f32::EPSILON);
        assert!((s.keyframe_epsilon_ms - 50.0).abs() < f32::EPSILON);
        assert!((s.rewind_margin_ms - 100.0).abs() < f32::EPSILON);
        assert_eq!(s.total_frames(), 150);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn frame_conversion() {
        let s = TimelineSettings::default();
        assert_eq!(s.time_to_frame(0.0), 0);
        assert_eq!(s.time_to_frame(1000.0), 30);
        assert_eq!(s.time_to_frame(5000.0), 150);
        assert!((s.frame_to_time(75) - 2500.0).abs() < 1e-3);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let s = TimelineSettings::from_json(r#"{ "duration_ms": 2000, "smoothing": { "speed": 4 } }"#)
            .unwrap();
        assert!((s.duration_ms - 2000.0).abs() < f32::EPSILON);
        assert!((s.smoothing.speed - 4.0).abs() < f32::EPSILON);
        assert!(s.smoothing.enabled);
        assert_eq!(s.fps, 30);
    }

    #[test]
    fn zero_duration_rejected() {
        let err = TimelineSettings::from_json(r#"{ "duration_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, KinemaError::InvalidSettings(_)));
    }
}
