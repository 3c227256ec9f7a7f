//! Track Model
//!
//! [`TimelineModel`] is the plain data (one [`Track`] per parameter) and is
//! also the snapshot wire format. [`Timeline`] owns the model for a session
//! and enforces the write rules: known parameter names, valid times,
//! normalization of incoming values and epsilon merge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use kinema_core::errors::{KinemaError, Result};
use kinema_core::{ParameterRegistry, TimelineSettings};

use crate::tracks::{Keyframe, KeyframeWrite, Track, TrackStyle};

/// Row height used for freshly created tracks.
const DEFAULT_ROW_HEIGHT: f32 = 21.0;

/// All tracks of a session, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineModel {
    #[serde(rename = "rows")]
    pub tracks: Vec<Track>,
}

impl TimelineModel {
    /// One empty track per registered parameter.
    #[must_use]
    pub fn from_registry(registry: &ParameterRegistry) -> Self {
        let tracks = registry
            .iter()
            .map(|param| Track {
                name: param.name.clone(),
                display_name: Some(param.label.clone()),
                keyframes: Vec::new(),
                style: Some(TrackStyle {
                    fill_style: param.color.clone(),
                    stroke_style: param.color.clone(),
                    height: Some(DEFAULT_ROW_HEIGHT),
                }),
            })
            .collect();

        Self { tracks }
    }

    #[must_use]
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    pub fn track_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.name == name)
    }

    #[must_use]
    pub fn has_keyframes(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_empty())
    }

    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }
}

/// The session's timeline: a registry-bound, optionally initialized model.
pub struct Timeline {
    registry: Arc<ParameterRegistry>,
    epsilon: f32,
    duration: f32,
    model: Option<TimelineModel>,
}

impl Timeline {
    /// Creates an uninitialized timeline. Writes fail until
    /// [`initialize`](Self::initialize) or [`set_model`](Self::set_model).
    #[must_use]
    pub fn new(registry: Arc<ParameterRegistry>, settings: &TimelineSettings) -> Self {
        Self {
            registry,
            epsilon: settings.keyframe_epsilon_ms,
            duration: settings.duration_ms,
            model: None,
        }
    }

    /// Creates a fresh empty model from the registry, replacing any existing one.
    pub fn initialize(&mut self) {
        self.model = Some(TimelineModel::from_registry(&self.registry));
        log::debug!("Timeline initialized with {} tracks", self.registry.len());
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.model.is_some()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Checks that `time` is a valid keyframe position.
    pub fn validate_time(&self, time: f32) -> Result<()> {
        if time.is_finite() && (0.0..=self.duration).contains(&time) {
            Ok(())
        } else {
            Err(KinemaError::InvalidTime(time))
        }
    }

    /// Writes `value` (raw, UI domain) for `parameter` at `time`.
    ///
    /// A keyframe already within the merge tolerance of `time` is overwritten;
    /// otherwise a new keyframe is inserted in time order.
    pub fn add_or_update_keyframe(
        &mut self,
        parameter: &str,
        time: f32,
        value: f32,
    ) -> Result<KeyframeWrite> {
        if self.model.is_none() {
            return Err(KinemaError::Uninitialized);
        }
        let config = self
            .registry
            .get(parameter)
            .ok_or_else(|| KinemaError::UnknownParameter(parameter.to_string()))?;
        self.validate_time(time)?;

        let normalized = config.normalize(value);
        if !normalized.is_finite() {
            return Err(KinemaError::NonFinite {
                parameter: parameter.to_string(),
                value,
            });
        }

        let track = self
            .model
            .as_mut()
            .and_then(|model| model.track_mut(parameter))
            .ok_or_else(|| KinemaError::UnknownParameter(parameter.to_string()))?;

        let write = track.upsert(time, normalized, self.epsilon);
        log::debug!("Keyframe {write:?} on '{parameter}' at {time}ms (value {value})");
        Ok(write)
    }

    /// Removes the keyframe nearest `time` (within the merge tolerance).
    pub fn delete_keyframe(&mut self, parameter: &str, time: f32) -> Result<Keyframe> {
        let model = self.model.as_mut().ok_or(KinemaError::Uninitialized)?;
        let track = model
            .track_mut(parameter)
            .ok_or_else(|| KinemaError::UnknownParameter(parameter.to_string()))?;

        let removed = track
            .remove_near(time, self.epsilon)
            .ok_or_else(|| KinemaError::NoKeyframeNear {
                parameter: parameter.to_string(),
                time,
            })?;

        log::debug!("Deleted keyframe on '{parameter}' at {}ms", removed.time);
        Ok(removed)
    }

    /// Deletes the keyframe nearest `time` on every track. Returns how many
    /// keyframes were removed.
    pub fn delete_keyframes_at(&mut self, time: f32) -> usize {
        let Some(model) = self.model.as_mut() else {
            return 0;
        };
        let epsilon = self.epsilon;

        model
            .tracks
            .iter_mut()
            .filter_map(|track| track.remove_near(time, epsilon))
            .count()
    }

    #[must_use]
    pub fn model(&self) -> Option<&TimelineModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut TimelineModel> {
        self.model.as_mut()
    }

    /// Replaces the whole model.
    pub fn set_model(&mut self, model: TimelineModel) {
        log::debug!(
            "Timeline model replaced ({} tracks, {} keyframes)",
            model.tracks.len(),
            model.keyframe_count()
        );
        self.model = Some(model);
    }

    /// Releases the model; the timeline returns to the uninitialized state.
    pub fn release(&mut self) -> Option<TimelineModel> {
        self.model.take()
    }

    #[must_use]
    pub fn has_keyframes(&self) -> bool {
        self.model.as_ref().is_some_and(TimelineModel::has_keyframes)
    }
}
