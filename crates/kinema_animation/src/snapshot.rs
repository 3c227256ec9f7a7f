//! Session Snapshot
//!
//! JSON import/export of a [`TimelineModel`]:
//!
//! ```json
//! { "rows": [ { "name": "positionX", "displayName": "Position X",
//!               "keyframes": [ { "val": 0, "data": { "value": 0.5 }, "selected": false } ],
//!               "style": { "fillStyle": "#3B82F6" } } ] }
//! ```
//!
//! Export writes the live model verbatim. Import parses and validates into a
//! new model; the caller swaps it in only on success, so a rejected snapshot
//! never touches the current session.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde_json::Value;

use kinema_core::ParameterRegistry;
use kinema_core::errors::{KinemaError, Result};

use crate::model::TimelineModel;
use crate::tracks::Track;

/// File name suggested for exported snapshots.
pub const DEFAULT_FILE_NAME: &str = "animation-timeline.json";

/// Serializes `model` as pretty-printed JSON.
pub fn export(model: &TimelineModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// Parses and validates a snapshot against `registry`.
///
/// The input must be a JSON object with a `rows` array. Every row must name a
/// registered parameter (at most once) and every keyframe time must lie in
/// `[0, duration]`. Registered parameters without a row get an empty track.
pub fn import(json: &str, registry: &ParameterRegistry, duration: f32) -> Result<TimelineModel> {
    let value: Value = serde_json::from_str(json)?;

    let Some(object) = value.as_object() else {
        return Err(KinemaError::MalformedSnapshot(
            "expected a JSON object".into(),
        ));
    };
    if !object.get("rows").is_some_and(Value::is_array) {
        return Err(KinemaError::MalformedSnapshot(
            "missing `rows` array".into(),
        ));
    }

    let mut model: TimelineModel = serde_json::from_value(value)?;
    validate(&model, registry, duration)?;

    let defaults = TimelineModel::from_registry(registry);
    for track in defaults.tracks {
        if model.track(&track.name).is_none() {
            log::debug!("Snapshot has no row for '{}', adding an empty track", track.name);
            model.tracks.push(track);
        }
    }

    Ok(model)
}

fn validate(model: &TimelineModel, registry: &ParameterRegistry, duration: f32) -> Result<()> {
    let mut seen = FxHashSet::default();

    for track in &model.tracks {
        if !registry.contains(&track.name) {
            return Err(KinemaError::MalformedSnapshot(format!(
                "row '{}' is not a known parameter",
                track.name
            )));
        }
        if !seen.insert(track.name.as_str()) {
            return Err(KinemaError::MalformedSnapshot(format!(
                "row '{}' appears more than once",
                track.name
            )));
        }
        validate_keyframes(track, duration)?;
    }

    Ok(())
}

fn validate_keyframes(track: &Track, duration: f32) -> Result<()> {
    for kf in &track.keyframes {
        if !(kf.time.is_finite() && (0.0..=duration).contains(&kf.time)) {
            return Err(KinemaError::MalformedSnapshot(format!(
                "keyframe time {} on '{}' is outside [0, {duration}]",
                kf.time, track.name
            )));
        }
        if !kf.value.is_finite() {
            return Err(KinemaError::MalformedSnapshot(format!(
                "keyframe value on '{}' at {}ms is not finite",
                track.name, kf.time
            )));
        }
    }
    Ok(())
}

/// Writes `model` to `path` as JSON.
pub fn save(model: &TimelineModel, path: impl AsRef<Path>) -> Result<()> {
    let json = export(model)?;
    std::fs::write(path.as_ref(), json)?;
    log::info!("Saved timeline snapshot to {}", path.as_ref().display());
    Ok(())
}

/// Reads and validates a snapshot file.
pub fn load(path: impl AsRef<Path>, registry: &ParameterRegistry, duration: f32) -> Result<TimelineModel> {
    let json = std::fs::read_to_string(path.as_ref())?;
    import(&json, registry, duration)
}
