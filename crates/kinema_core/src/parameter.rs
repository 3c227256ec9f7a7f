//! Parameter Registry
//!
//! Declarative description of every animatable parameter in a session. The
//! registry is built once at session start and consumed both by the timeline
//! (one track per parameter, normalization of stored values) and by the
//! presentation layer (labels, colors, slider ranges).
//!
//! # Normalization
//!
//! Keyframe values are stored in a normalized space so that tracks with very
//! different domains share one comparison space:
//!
//! ```text
//! normalize(v)   = (v - min) / (max - min)
//! denormalize(n) = min + n * (max - min)
//! ```
//!
//! Normalized values are conventionally in `0..=1` but are not clamped.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{KinemaError, Result};

/// Default edit-delta threshold below which a control change is ignored.
pub const DEFAULT_TOLERANCE: f32 = 0.001;

/// Configuration record for a single animatable parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    /// Identifier; also the track name in the timeline model.
    pub name: String,
    /// Display label (cosmetic).
    pub label: String,
    /// Track color as a CSS-style hex string (cosmetic).
    #[serde(default)]
    pub color: Option<String>,
    pub min: f32,
    pub max: f32,
    #[serde(default = "default_step")]
    pub step: f32,
    /// Value used when nothing else provides one.
    #[serde(default)]
    pub default: f32,
    /// Minimum change that counts as a user edit.
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

fn default_step() -> f32 {
    0.01
}

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

impl ParameterConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, min: f32, max: f32) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            color: None,
            min,
            max,
            step: default_step(),
            default: 0.0,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: f32) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Width of the value domain.
    #[inline]
    #[must_use]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Maps a raw UI-domain value into normalized space.
    #[inline]
    #[must_use]
    pub fn normalize(&self, raw: f32) -> f32 {
        (raw - self.min) / self.span()
    }

    /// Maps a normalized value back into the UI domain.
    #[inline]
    #[must_use]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        self.min + normalized * self.span()
    }

    /// Clamps a raw value into `[min, max]`.
    #[inline]
    #[must_use]
    pub fn clamp(&self, raw: f32) -> f32 {
        raw.clamp(self.min, self.max)
    }

    fn validate(&self) -> Result<()> {
        let degenerate = !self.min.is_finite()
            || !self.max.is_finite()
            || self.span() <= 0.0
            || !self.span().is_finite();
        if degenerate {
            return Err(KinemaError::DegenerateRange {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Ordered set of parameter configurations, keyed by name.
///
/// Immutable once built. Iteration follows declaration order, which is also
/// the track order of a freshly created timeline model.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    params: Vec<ParameterConfig>,
    index: FxHashMap<String, usize>,
}

impl ParameterRegistry {
    /// Builds a registry, rejecting duplicate names and degenerate ranges.
    pub fn new(params: impl IntoIterator<Item = ParameterConfig>) -> Result<Self> {
        let mut registry = Self::default();
        for param in params {
            param.validate()?;
            if registry.index.contains_key(&param.name) {
                return Err(KinemaError::DuplicateParameter(param.name));
            }
            registry.index.insert(param.name.clone(), registry.params.len());
            registry.params.push(param);
        }
        log::debug!("Parameter registry built with {} parameters", registry.params.len());
        Ok(registry)
    }

    /// Parses a JSON array of [`ParameterConfig`] records.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Vec<ParameterConfig> = serde_json::from_str(json)?;
        Self::new(params)
    }

    /// The transform/opacity parameters of the single-object scene demo.
    #[must_use]
    pub fn cube_transform() -> Self {
        let params = vec![
            ParameterConfig::new("positionX", -5.0, 5.0)
                .with_label("Position X")
                .with_color("#3B82F6"),
            ParameterConfig::new("positionY", -5.0, 5.0)
                .with_label("Position Y")
                .with_color("#10B981"),
            ParameterConfig::new("positionZ", -5.0, 5.0)
                .with_label("Position Z")
                .with_color("#F59E0B"),
            ParameterConfig::new("rotationX", -180.0, 180.0)
                .with_label("Rotation X")
                .with_color("#EF4444")
                .with_step(1.0),
            ParameterConfig::new("rotationY", -180.0, 180.0)
                .with_label("Rotation Y")
                .with_color("#8B5CF6")
                .with_step(1.0),
            ParameterConfig::new("rotationZ", -180.0, 180.0)
                .with_label("Rotation Z")
                .with_color("#EC4899")
                .with_step(1.0),
            ParameterConfig::new("scale", 0.1, 3.0)
                .with_label("Scale")
                .with_color("#14B8A6")
                .with_default(1.0),
            ParameterConfig::new("opacity", 0.0, 1.0)
                .with_label("Opacity")
                .with_color("#F97316")
                .with_default(1.0),
        ];

        let registry = Self::new(params);
        debug_assert!(registry.is_ok(), "cube transform table is invalid: {registry:?}");
        registry.unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterConfig> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterConfig> {
        self.params.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Normalizes `raw` for the named parameter.
    pub fn normalize(&self, name: &str, raw: f32) -> Result<f32> {
        self.get(name)
            .map(|p| p.normalize(raw))
            .ok_or_else(|| KinemaError::UnknownParameter(name.to_string()))
    }

    /// Denormalizes `normalized` for the named parameter.
    pub fn denormalize(&self, name: &str, normalized: f32) -> Result<f32> {
        self.get(name)
            .map(|p| p.denormalize(normalized))
            .ok_or_else(|| KinemaError::UnknownParameter(name.to_string()))
    }

    /// Default value of every parameter, keyed by name.
    #[must_use]
    pub fn defaults(&self) -> FxHashMap<String, f32> {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.default))
            .collect()
    }
}
