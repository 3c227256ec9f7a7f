use serde::{Deserialize, Serialize};

/// A single `(time, value)` sample on a track.
///
/// `value` is stored normalized (see [`ParameterConfig::normalize`]).
///
/// [`ParameterConfig::normalize`]: kinema_core::ParameterConfig::normalize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeyframeRecord", into = "KeyframeRecord")]
pub struct Keyframe {
    /// Milliseconds from the start of the timeline.
    pub time: f32,
    pub value: f32,
    /// UI-only selection flag, preserved through snapshots.
    pub selected: bool,
}

impl Keyframe {
    #[must_use]
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            selected: false,
        }
    }
}

// Snapshot wire form: `{ "val": time, "data": { "value": v }, "selected": b }`
#[derive(Serialize, Deserialize)]
struct KeyframeRecord {
    val: f32,
    #[serde(default)]
    data: KeyframeData,
    #[serde(default)]
    selected: bool,
}

#[derive(Default, Serialize, Deserialize)]
struct KeyframeData {
    #[serde(default)]
    value: f32,
}

impl From<KeyframeRecord> for Keyframe {
    fn from(record: KeyframeRecord) -> Self {
        Self {
            time: record.val,
            value: record.data.value,
            selected: record.selected,
        }
    }
}

impl From<Keyframe> for KeyframeRecord {
    fn from(kf: Keyframe) -> Self {
        Self {
            val: kf.time,
            data: KeyframeData { value: kf.value },
            selected: kf.selected,
        }
    }
}

/// Cosmetic row style carried through snapshots untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

/// Outcome of a successful keyframe write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeWrite {
    Inserted,
    /// An existing keyframe within the merge tolerance was overwritten.
    Updated,
}

/// The ordered keyframe sequence for one parameter.
///
/// Keyframes written through [`upsert`](Self::upsert) stay sorted by time with
/// no two closer than the merge tolerance. Tracks loaded from a snapshot are
/// kept verbatim until [`ensure_sorted`](Self::ensure_sorted) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TrackStyle>,
}

impl Track {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            keyframes: Vec::new(),
            style: None,
        }
    }

    #[must_use]
    pub fn with_keyframes(mut self, keyframes: Vec<Keyframe>) -> Self {
        self.keyframes = keyframes;
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Index of the keyframe closest to `time`, if it is strictly within `epsilon`.
    #[must_use]
    pub fn nearest_within(&self, time: f32, epsilon: f32) -> Option<usize> {
        self.keyframes
            .iter()
            .enumerate()
            .map(|(i, kf)| (i, (kf.time - time).abs()))
            .filter(|&(_, dist)| dist < epsilon)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Overwrites the value of the keyframe within `epsilon` of `time`, or
    /// inserts a new keyframe keeping the sequence sorted.
    pub fn upsert(&mut self, time: f32, value: f32, epsilon: f32) -> KeyframeWrite {
        if let Some(i) = self.nearest_within(time, epsilon) {
            self.keyframes[i].value = value;
            return KeyframeWrite::Updated;
        }

        self.keyframes.push(Keyframe::new(time, value));
        self.ensure_sorted();
        KeyframeWrite::Inserted
    }

    /// Removes the keyframe closest to `time` within `epsilon`.
    pub fn remove_near(&mut self, time: f32, epsilon: f32) -> Option<Keyframe> {
        let i = self.nearest_within(time, epsilon)?;
        Some(self.keyframes.remove(i))
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.keyframes.is_sorted_by(|a, b| a.time <= b.time)
    }

    /// Sorts keyframes by time. Idempotent; returns `true` if anything moved.
    pub fn ensure_sorted(&mut self) -> bool {
        if self.is_sorted() {
            return false;
        }
        self.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        true
    }

    /// Samples the normalized value at `time`.
    ///
    /// Expects a sorted track. Returns `None` for an empty track; a single
    /// keyframe is returned regardless of `time`. Outside the keyed range the
    /// nearest endpoint is held (no extrapolation).
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<f32> {
        let keyframes = &self.keyframes;
        let len = keyframes.len();

        match len {
            0 => None,
            1 => Some(keyframes[0].value),
            _ => {
                // First index with kf.time >= time; the bracket is [idx - 1, idx]
                let idx = keyframes.partition_point(|kf| kf.time < time);

                if idx == 0 {
                    return Some(keyframes[0].value);
                }
                if idx >= len {
                    return Some(keyframes[len - 1].value);
                }

                let before = keyframes[idx - 1];
                let after = keyframes[idx];
                let dt = after.time - before.time;

                let progress = if dt == 0.0 {
                    0.0
                } else {
                    (time - before.time) / dt
                };

                Some(lerp(before.value, after.value, progress))
            }
        }
    }
}

#[inline]
#[must_use]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}
