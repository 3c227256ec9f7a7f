//! Editor Session
//!
//! [`EditorSession`] wires the timeline, the playback scheduler, the
//! synchronization controller, a control panel and a render binding into one
//! per-session object. It has no window or UI of its own and is driven by the
//! host through two per-frame entry points.
//!
//! # Frame loops
//!
//! - [`ui_frame`](EditorSession::ui_frame): user edits → keyframes, playback
//!   tick → interpolation → control panel, then the end-of-tick hook.
//! - [`render_frame`](EditorSession::render_frame): control panel values →
//!   (smoothing) → render binding.
//!
//! The two loops may interleave in any order; the render loop sees values at
//! most one UI tick old.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kinema::{EditorSession, ParameterRegistry, TimelineSettings};
//! use kinema::animation::{PanelState, TransformBinding};
//!
//! let registry = Arc::new(ParameterRegistry::cube_transform());
//! let panel = PanelState::new(registry.clone());
//! let binding = TransformBinding::cube(&registry);
//! let mut session = EditorSession::new(TimelineSettings::default(), registry, panel, binding)?;
//!
//! loop {
//!     clock.tick();
//!     session.ui_frame(clock.timestamp_ms());
//!     session.render_frame(clock.dt_seconds());
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use kinema_animation::interpolator::interpolate;
use kinema_animation::panel::ControlPanel;
use kinema_animation::scheduler::{ObserverKey, PlaybackEvent, PlaybackScheduler, Tick, TickStatus};
use kinema_animation::snapshot;
use kinema_animation::sync::SyncController;
use kinema_animation::tracks::{Keyframe, KeyframeWrite};
use kinema_animation::{RenderBinding, Timeline};
use kinema_core::errors::{KinemaError, Result};
use kinema_core::{ParameterRegistry, TimelineSettings};

/// A single editing session.
///
/// # Lifecycle
///
/// 1. Create with [`EditorSession::new`]; the timeline starts with one empty
///    track per registered parameter.
/// 2. Drive [`ui_frame`](Self::ui_frame) and [`render_frame`](Self::render_frame)
///    every frame.
/// 3. [`dispose`](Self::dispose) (or drop) to cancel pending ticks and release
///    the model.
pub struct EditorSession<P: ControlPanel, R: RenderBinding> {
    settings: TimelineSettings,
    registry: Arc<ParameterRegistry>,
    timeline: Timeline,
    scheduler: PlaybackScheduler,
    sync: SyncController,
    panel: P,
    binding: R,
    disposed: bool,
}

impl<P: ControlPanel, R: RenderBinding> EditorSession<P, R> {
    pub fn new(
        settings: TimelineSettings,
        registry: Arc<ParameterRegistry>,
        panel: P,
        binding: R,
    ) -> Result<Self> {
        settings.validate()?;

        let mut timeline = Timeline::new(Arc::clone(&registry), &settings);
        timeline.initialize();

        let scheduler = PlaybackScheduler::new(&settings);
        let sync = SyncController::new(Arc::clone(&registry), settings.smoothing, panel.values());

        log::info!(
            "Editor session created: {} parameters, {}ms timeline",
            registry.len(),
            settings.duration_ms
        );

        Ok(Self {
            settings,
            registry,
            timeline,
            scheduler,
            sync,
            panel,
            binding,
            disposed: false,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ParameterRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    #[must_use]
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncController {
        &mut self.sync
    }

    #[must_use]
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Direct access for user edits; changes are picked up on the next
    /// [`ui_frame`](Self::ui_frame) or [`handle_control_changes`](Self::handle_control_changes).
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    #[must_use]
    pub fn binding(&self) -> &R {
        &self.binding
    }

    #[inline]
    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.scheduler.time()
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    #[must_use]
    pub fn current_frame(&self) -> u32 {
        self.settings.time_to_frame(self.scheduler.time())
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&PlaybackEvent) + 'static) -> ObserverKey {
        self.scheduler.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, key: ObserverKey) -> bool {
        self.scheduler.unsubscribe(key)
    }

    // ========================================================================
    // Frame Loops
    // ========================================================================

    /// Forwards a pending control-panel change to the synchronization
    /// controller. Returns the parameters that received a keyframe.
    pub fn handle_control_changes(&mut self) -> Vec<String> {
        if self.disposed {
            return Vec::new();
        }
        let Some(values) = self.panel.take_change() else {
            return Vec::new();
        };
        self.sync
            .on_control_change(&values, self.scheduler.time(), &mut self.timeline)
    }

    /// UI/timeline frame. `timestamp_ms` is the host's monotonic frame time.
    pub fn ui_frame(&mut self, timestamp_ms: f64) -> Option<Tick> {
        if self.disposed {
            return None;
        }

        self.handle_control_changes();

        let registry = &self.registry;
        let timeline = &mut self.timeline;
        let sync = &mut self.sync;
        let panel = &mut self.panel;

        let tick = self.scheduler.tick(timestamp_ms, |time| {
            let model = timeline.model_mut().ok_or(KinemaError::Uninitialized)?;
            if !model.has_keyframes() {
                return Ok(());
            }
            let frame = interpolate(model, registry, time, true);
            sync.apply_timeline_values(&frame, panel).map(|_| ())
        });

        if let Some(Tick {
            status: TickStatus::Looped,
            ..
        }) = tick
        {
            self.write_timeline_values();
        }

        self.finish_tick();
        tick
    }

    /// Render frame. `delta_seconds` is the time since the previous render frame.
    pub fn render_frame(&mut self, delta_seconds: f32) {
        if self.disposed {
            return;
        }
        let values = self.sync.render_values(self.panel.values(), delta_seconds);
        self.binding.apply(values);
    }

    /// Interpolates at the current time and writes into the panel.
    fn write_timeline_values(&mut self) -> usize {
        let time = self.scheduler.time();
        let playing = self.scheduler.is_playing();

        let Some(model) = self.timeline.model_mut() else {
            return 0;
        };
        if !model.has_keyframes() {
            return 0;
        }

        let frame = interpolate(model, &self.registry, time, playing);
        match self.sync.apply_timeline_values(&frame, &mut self.panel) {
            Ok(written) => written,
            Err(err) => {
                log::warn!("Timeline refresh at {time}ms skipped: {err}");
                0
            }
        }
    }

    /// Swallows the panel's echo of a timeline write, then runs the
    /// end-of-tick hook.
    fn finish_tick(&mut self) {
        self.handle_control_changes();
        self.sync.end_of_tick();
        self.sync.set_playing(self.scheduler.is_playing());
    }

    /// Records edits still queued in the panel before the cursor or the play
    /// state moves underneath them.
    fn flush_pending_edits(&mut self) {
        let recorded = self.handle_control_changes();
        if !recorded.is_empty() {
            log::debug!("Flushed queued edits for {recorded:?} before transport change");
        }
    }

    /// Cursor moved outside of a tick: refresh the panel and close the write.
    fn on_time_changed(&mut self) {
        self.write_timeline_values();
        self.finish_tick();
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Starts playback; returns `false` if already playing.
    pub fn play(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.flush_pending_edits();
        let before = self.scheduler.time();
        let started = self.scheduler.play();
        self.sync.set_playing(self.scheduler.is_playing());

        if started && self.scheduler.time() != before {
            self.on_time_changed();
        }
        started
    }

    /// Stops playback, keeping the current time.
    pub fn pause(&mut self) {
        if self.disposed {
            return;
        }
        self.flush_pending_edits();
        self.scheduler.pause();
        self.sync.set_playing(false);
    }

    /// Stops playback and rewinds to 0.
    pub fn stop(&mut self) {
        if self.disposed {
            return;
        }
        self.flush_pending_edits();
        self.scheduler.stop();
        self.sync.set_playing(false);
        self.on_time_changed();
    }

    /// Moves the cursor; the play state is unchanged.
    pub fn seek(&mut self, time: f32) -> f32 {
        if self.disposed {
            return self.scheduler.time();
        }
        self.flush_pending_edits();
        let time = self.scheduler.seek(time);
        self.on_time_changed();
        time
    }

    /// Cancels playback and moves to 0.
    pub fn go_to_start(&mut self) {
        self.pause();
        self.seek(0.0);
    }

    /// Moves to the end of the timeline.
    pub fn go_to_end(&mut self) {
        let duration = self.settings.duration_ms;
        self.seek(duration);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.scheduler.set_looping(looping);
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.scheduler.toggle_loop()
    }

    // ========================================================================
    // Keyframe Editing
    // ========================================================================

    /// Writes a keyframe for `parameter` at the current time.
    pub fn record_keyframe(&mut self, parameter: &str, value: f32) -> Result<KeyframeWrite> {
        if self.disposed {
            return Err(KinemaError::Disposed);
        }
        let time = self.scheduler.time();
        self.timeline.add_or_update_keyframe(parameter, time, value)
    }

    pub fn delete_keyframe(&mut self, parameter: &str, time: f32) -> Result<Keyframe> {
        if self.disposed {
            return Err(KinemaError::Disposed);
        }
        self.timeline.delete_keyframe(parameter, time)
    }

    /// Deletes the keyframe nearest the cursor on every track.
    pub fn delete_keyframes_at_cursor(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let removed = self.timeline.delete_keyframes_at(self.scheduler.time());
        log::debug!("Deleted {removed} keyframes at {}ms", self.scheduler.time());
        removed
    }

    // ========================================================================
    // Import / Export
    // ========================================================================

    pub fn export_snapshot(&self) -> Result<String> {
        let model = self.timeline.model().ok_or(KinemaError::Uninitialized)?;
        snapshot::export(model)
    }

    /// Replaces the model with a snapshot. On error the session is untouched.
    pub fn import_snapshot(&mut self, json: &str) -> Result<()> {
        if self.disposed {
            return Err(KinemaError::Disposed);
        }
        self.flush_pending_edits();
        let model = snapshot::import(json, &self.registry, self.settings.duration_ms)
            .inspect_err(|err| log::error!("Snapshot import rejected: {err}"))?;

        self.timeline.set_model(model);
        self.on_time_changed();
        Ok(())
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let model = self.timeline.model().ok_or(KinemaError::Uninitialized)?;
        snapshot::save(model, path)
    }

    pub fn load_snapshot(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.disposed {
            return Err(KinemaError::Disposed);
        }
        self.flush_pending_edits();
        let model = snapshot::load(path, &self.registry, self.settings.duration_ms)
            .inspect_err(|err| log::error!("Snapshot load failed: {err}"))?;

        self.timeline.set_model(model);
        self.on_time_changed();
        Ok(())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Cancels any pending tick, drops observers and releases the model.
    /// Every later frame call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.dispose();
        self.sync.set_playing(false);
        self.sync.end_of_tick();
        self.timeline.release();
        self.disposed = true;
        log::info!("Editor session disposed");
    }
}

impl<P: ControlPanel, R: RenderBinding> Drop for EditorSession<P, R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
