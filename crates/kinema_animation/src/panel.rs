use std::sync::Arc;

use kinema_core::ParameterRegistry;
use kinema_core::errors::{KinemaError, Result};

use crate::values::ParameterValues;

/// The live parameter controls shown to the user.
///
/// Implementations raise a change notification for every change, whatever
/// caused it; telling user edits apart from timeline writes is the job of
/// the [`SyncController`](crate::sync::SyncController).
pub trait ControlPanel {
    /// Current value of every control.
    fn values(&self) -> &ParameterValues;

    /// Applies a full or partial update.
    fn set_values(&mut self, updates: &ParameterValues);

    /// Takes the pending change notification, if any, with the values at the
    /// time of the last change.
    fn take_change(&mut self) -> Option<ParameterValues>;
}

/// In-memory control panel backed by a parameter registry.
pub struct PanelState {
    registry: Arc<ParameterRegistry>,
    values: ParameterValues,
    changed: bool,
}

impl PanelState {
    /// Creates a panel with every control at its default value.
    #[must_use]
    pub fn new(registry: Arc<ParameterRegistry>) -> Self {
        let values = registry.defaults();
        Self {
            registry,
            values,
            changed: false,
        }
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    /// A user edit: clamps into the parameter domain and returns the value
    /// actually stored.
    pub fn edit(&mut self, name: &str, value: f32) -> Result<f32> {
        let param = self
            .registry
            .get(name)
            .ok_or_else(|| KinemaError::UnknownParameter(name.to_string()))?;

        if !value.is_finite() {
            return Err(KinemaError::NonFinite {
                parameter: name.to_string(),
                value,
            });
        }

        let value = param.clamp(value);
        self.store(name, value);
        Ok(value)
    }

    #[must_use]
    pub fn has_pending_change(&self) -> bool {
        self.changed
    }

    fn store(&mut self, name: &str, value: f32) {
        let previous = self.values.insert(name.to_string(), value);
        if previous != Some(value) {
            self.changed = true;
        }
    }
}

impl ControlPanel for PanelState {
    fn values(&self) -> &ParameterValues {
        &self.values
    }

    fn set_values(&mut self, updates: &ParameterValues) {
        for (name, &value) in updates {
            if self.registry.contains(name) {
                self.store(name, value);
            } else {
                log::debug!("Ignoring update for unknown control '{name}'");
            }
        }
    }

    fn take_change(&mut self) -> Option<ParameterValues> {
        if std::mem::take(&mut self.changed) {
            Some(self.values.clone())
        } else {
            None
        }
    }
}
