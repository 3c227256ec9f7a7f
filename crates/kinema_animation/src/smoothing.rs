use kinema_core::SmoothingSettings;

use crate::tracks::lerp;
use crate::values::ParameterValues;

/// Per-parameter exponential approach toward a target.
///
/// Every [`step`](Self::step) moves each tracked value toward its target by
/// `clamp(dt * speed, 0, 1)` of the remaining distance, independently per
/// parameter. Values within `threshold` of their target snap onto it.
#[derive(Debug, Clone)]
pub struct Smoother {
    settings: SmoothingSettings,
    current: ParameterValues,
}

impl Smoother {
    #[must_use]
    pub fn new(settings: SmoothingSettings) -> Self {
        Self {
            settings,
            current: ParameterValues::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SmoothingSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    #[must_use]
    pub fn current(&self) -> &ParameterValues {
        &self.current
    }

    /// Fraction of the remaining distance covered in a frame of `dt` seconds.
    #[must_use]
    pub fn fraction(&self, dt: f32) -> f32 {
        (dt * self.settings.speed).clamp(0.0, 1.0)
    }

    /// Advances every target by one frame and returns the smoothed values.
    ///
    /// A parameter seen for the first time starts at its target.
    pub fn step(&mut self, targets: &ParameterValues, dt: f32) -> &ParameterValues {
        let fraction = self.fraction(dt);
        let threshold = self.settings.threshold;

        for (name, &target) in targets {
            let current = self.current.entry(name.clone()).or_insert(target);
            if (*current - target).abs() > threshold {
                *current = lerp(*current, target, fraction);
            } else {
                *current = target;
            }
        }

        &self.current
    }

    /// Jumps straight to `targets`.
    pub fn snap(&mut self, targets: &ParameterValues) {
        for (name, &target) in targets {
            self.current.insert(name.clone(), target);
        }
    }

    /// Overrides a single tracked value.
    pub fn set(&mut self, name: &str, value: f32) {
        self.current.insert(name.to_string(), value);
    }

    pub fn reset(&mut self) {
        self.current.clear();
    }
}
