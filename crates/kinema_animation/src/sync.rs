//! Synchronization Controller
//!
//! Three writers touch the same parameter values: the user (through the
//! control panel), timeline playback (interpolated values pushed into the
//! panel), and the smoothing stage (render-side approach toward the panel
//! values). The controller keeps them from feeding back into each other.
//!
//! # Write discipline
//!
//! A single [`SyncPhase`] says who is writing right now:
//!
//! ```text
//!            on_control_change()                 apply_timeline_values()
//!   Idle ─────────────────────────▶ UserEditing      Idle ────────────────▶ TimelineWriting
//!    ▲                                   │            ▲                          │
//!    └──────────── (same call) ──────────┘            └────── end_of_tick() ─────┘
//! ```
//!
//! Change notifications that arrive while `TimelineWriting` (or while playback
//! is active) are the panel echoing the timeline's own write and are never
//! recorded as keyframes. The phase is released by the host's end-of-tick
//! hook, not by a timer, so the suppression window is exactly one tick.

use std::sync::Arc;

use kinema_core::errors::{KinemaError, Result};
use kinema_core::{ParameterRegistry, SmoothingSettings};

use crate::interpolator::InterpolatedFrame;
use crate::model::Timeline;
use crate::panel::ControlPanel;
use crate::smoothing::Smoother;
use crate::values::{ParameterValues, finite_only};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    UserEditing,
    TimelineWriting,
}

pub struct SyncController {
    registry: Arc<ParameterRegistry>,
    phase: SyncPhase,
    /// Mirror of the scheduler's play state.
    playing: bool,
    /// Last value seen per parameter, from any writer.
    last_known: ParameterValues,
    smoother: Smoother,
    /// Last finite values delivered to the render binding.
    rendered: ParameterValues,
    dropped_writes: usize,
}

impl SyncController {
    /// `initial` are the control values at session start.
    #[must_use]
    pub fn new(
        registry: Arc<ParameterRegistry>,
        smoothing: SmoothingSettings,
        initial: &ParameterValues,
    ) -> Self {
        let mut rendered = registry.defaults();
        rendered.extend(initial.iter().map(|(k, &v)| (k.clone(), v)));

        let mut smoother = Smoother::new(smoothing);
        smoother.snap(&rendered);

        Self {
            registry,
            phase: SyncPhase::Idle,
            playing: false,
            last_known: rendered.clone(),
            smoother,
            rendered,
            dropped_writes: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            log::debug!("Sync: playing = {playing}");
        }
        self.playing = playing;
    }

    #[must_use]
    pub fn last_known(&self, name: &str) -> Option<f32> {
        self.last_known.get(name).copied()
    }

    /// Number of non-finite writes dropped so far.
    #[must_use]
    pub fn dropped_writes(&self) -> usize {
        self.dropped_writes
    }

    #[must_use]
    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    pub fn smoother_mut(&mut self) -> &mut Smoother {
        &mut self.smoother
    }

    /// Handles a control-panel change notification.
    ///
    /// Ignored while the timeline is writing or playback is active. Otherwise
    /// every parameter that moved by more than its tolerance since the last
    /// known value gets a keyframe at `time`. Returns the names recorded.
    pub fn on_control_change(
        &mut self,
        values: &ParameterValues,
        time: f32,
        timeline: &mut Timeline,
    ) -> Vec<String> {
        if self.phase == SyncPhase::TimelineWriting || self.playing {
            log::trace!("Sync: change ignored (phase {:?}, playing {})", self.phase, self.playing);
            return Vec::new();
        }

        self.phase = SyncPhase::UserEditing;
        let registry = Arc::clone(&self.registry);
        let mut recorded = Vec::new();

        for param in registry.iter() {
            let Some(&value) = values.get(&param.name) else {
                continue;
            };
            if !value.is_finite() {
                log::warn!("Sync: ignoring non-finite edit of '{}': {value}", param.name);
                continue;
            }

            let last = self.last_known(&param.name).unwrap_or(param.default);
            if (value - last).abs() <= param.tolerance {
                continue;
            }

            match timeline.add_or_update_keyframe(&param.name, time, value) {
                Ok(_) => {
                    self.last_known.insert(param.name.clone(), value);
                    recorded.push(param.name.clone());
                }
                Err(err) => log::warn!("Sync: keyframe for '{}' not recorded: {err}", param.name),
            }
        }

        self.phase = SyncPhase::Idle;
        recorded
    }

    /// Enters `TimelineWriting`. Fails only while a user edit is in progress.
    pub fn begin_timeline_write(&mut self) -> bool {
        match self.phase {
            SyncPhase::Idle | SyncPhase::TimelineWriting => {
                self.phase = SyncPhase::TimelineWriting;
                true
            }
            SyncPhase::UserEditing => false,
        }
    }

    /// Pushes interpolated values into the panel as a timeline write.
    ///
    /// Non-finite values are dropped (the panel keeps its previous value).
    /// The phase stays `TimelineWriting` until [`end_of_tick`](Self::end_of_tick),
    /// so the panel's resulting change notification is suppressed. Returns
    /// the number of values written.
    pub fn apply_timeline_values<P: ControlPanel + ?Sized>(
        &mut self,
        frame: &InterpolatedFrame,
        panel: &mut P,
    ) -> Result<usize> {
        self.playing = frame.playing;

        let (updates, dropped) = finite_only(&frame.values, "timeline");
        self.dropped_writes += dropped;
        if updates.is_empty() {
            return Ok(0);
        }

        if !self.begin_timeline_write() {
            return Err(KinemaError::TickFailed(
                "timeline write attempted during a user edit".into(),
            ));
        }

        panel.set_values(&updates);
        let written = updates.len();
        self.last_known.extend(updates);

        log::trace!("Sync: timeline wrote {written} values at {}ms", frame.time);
        Ok(written)
    }

    /// End-of-tick hook: releases a timeline write.
    pub fn end_of_tick(&mut self) {
        if self.phase == SyncPhase::TimelineWriting {
            self.phase = SyncPhase::Idle;
        }
    }

    /// Smoothing runs only when enabled, during playback, and never while a
    /// timeline write is in progress.
    #[must_use]
    pub fn smoothing_active(&self) -> bool {
        self.smoother.is_enabled() && self.playing && self.phase != SyncPhase::TimelineWriting
    }

    /// Computes the values for the render binding from the current panel
    /// values, applying smoothing when active.
    ///
    /// Only finite values ever reach the returned map; a non-finite result
    /// keeps the previous value for that parameter.
    pub fn render_values(&mut self, panel_values: &ParameterValues, dt: f32) -> &ParameterValues {
        let registry = Arc::clone(&self.registry);
        let smoothing = self.smoothing_active();

        if smoothing {
            self.smoother.step(panel_values, dt);
        }

        for param in registry.iter() {
            let name = param.name.as_str();
            let candidate = if smoothing {
                self.smoother.current().get(name).copied()
            } else {
                panel_values.get(name).copied()
            };
            let Some(value) = candidate else {
                continue;
            };

            if value.is_finite() {
                self.rendered.insert(param.name.clone(), value);
                if !smoothing {
                    self.smoother.set(name, value);
                }
            } else {
                self.dropped_writes += 1;
                log::warn!("Dropping non-finite render value for '{name}': {value}");
                if let Some(&previous) = self.rendered.get(name) {
                    self.smoother.set(name, previous);
                }
            }
        }

        &self.rendered
    }
}
