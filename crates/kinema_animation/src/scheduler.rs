//! Playback Scheduler
//!
//! Frame-driven playback clock. The host calls [`PlaybackScheduler::tick`]
//! from its per-frame callback with a monotonic timestamp; the scheduler only
//! does work while a frame is pending, i.e. while it is playing.
//!
//! ```text
//!             play()                 tick() reaches end, LoopMode::Once
//!  Stopped ───────────▶ Playing ───────────────────────────────────▶ Stopped
//!     ▲                  │  │  pause() / stop() / failed tick
//!     └──────────────────┘  └──▶ tick() reaches end, LoopMode::Loop: rewind, keep playing
//! ```
//!
//! Invariant: a frame is pending if and only if the state is `Playing`.

use slotmap::{SlotMap, new_key_type};

use kinema_core::TimelineSettings;
use kinema_core::errors::Result;

new_key_type! {
    /// Handle returned by [`PlaybackScheduler::subscribe`].
    pub struct ObserverKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Notifications delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { from: f32 },
    TimeChanged(f32),
    /// Reached the end with looping on; time is back at 0.
    Looped,
    Paused(f32),
    Stopped,
    /// Reached the end with looping off.
    Finished,
    /// A tick failed to apply and playback was forced to stop.
    Aborted(String),
}

/// What a processed tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    Looped,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Time that was applied on this tick.
    pub time: f32,
    pub status: TickStatus,
}

/// Identifier of the next scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest(u64);

type Observer = Box<dyn FnMut(&PlaybackEvent)>;

pub struct PlaybackScheduler {
    duration: f32,
    rewind_margin: f32,
    pub loop_mode: LoopMode,

    time: f32,
    state: PlaybackState,

    /// Timeline time at which the current playback run started.
    start_time: f32,
    /// Host timestamp of the first tick of the current run.
    clock_origin: Option<f64>,
    pending_frame: Option<FrameRequest>,
    next_request: u64,
    disposed: bool,

    observers: SlotMap<ObserverKey, Observer>,
}

impl PlaybackScheduler {
    #[must_use]
    pub fn new(settings: &TimelineSettings) -> Self {
        Self {
            duration: settings.duration_ms,
            rewind_margin: settings.rewind_margin_ms,
            loop_mode: if settings.loop_playback {
                LoopMode::Loop
            } else {
                LoopMode::Once
            },
            time: 0.0,
            state: PlaybackState::Stopped,
            start_time: 0.0,
            clock_origin: None,
            pending_frame: None,
            next_request: 0,
            disposed: false,
            observers: SlotMap::with_key(),
        }
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    #[inline]
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.loop_mode == LoopMode::Loop
    }

    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending_frame
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.loop_mode = if looping { LoopMode::Loop } else { LoopMode::Once };
    }

    /// Flips the loop flag and returns the new value.
    pub fn toggle_loop(&mut self) -> bool {
        self.set_looping(!self.is_looping());
        self.is_looping()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&PlaybackEvent) + 'static) -> ObserverKey {
        self.observers.insert(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, key: ObserverKey) -> bool {
        self.observers.remove(key).is_some()
    }

    fn emit(&mut self, event: &PlaybackEvent) {
        for observer in self.observers.values_mut() {
            observer(event);
        }
    }

    fn schedule_frame(&mut self) {
        self.pending_frame = Some(FrameRequest(self.next_request));
        self.next_request += 1;
    }

    fn cancel_frame(&mut self) {
        if let Some(FrameRequest(id)) = self.pending_frame.take() {
            log::trace!("Cancelled frame request {id}");
        }
        self.clock_origin = None;
    }

    /// Starts playback. Does nothing if already playing or disposed.
    ///
    /// Starting within the rewind margin of the end rewinds to 0 first.
    /// Returns `true` if playback started.
    pub fn play(&mut self) -> bool {
        if self.disposed || self.is_playing() {
            return false;
        }

        self.cancel_frame();
        if self.time >= self.duration - self.rewind_margin {
            self.time = 0.0;
            self.emit(&PlaybackEvent::TimeChanged(0.0));
        }

        self.start_time = self.time;
        self.state = PlaybackState::Playing;
        self.schedule_frame();

        log::debug!("Playback started at {}ms", self.start_time);
        self.emit(&PlaybackEvent::Started {
            from: self.start_time,
        });
        true
    }

    /// Stops playback and keeps the current time.
    pub fn pause(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_frame();
        let was_playing = self.is_playing();
        self.state = PlaybackState::Stopped;

        if was_playing {
            log::debug!("Playback paused at {}ms", self.time);
            self.emit(&PlaybackEvent::Paused(self.time));
        }
    }

    /// Stops playback and rewinds to 0.
    pub fn stop(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_frame();
        self.state = PlaybackState::Stopped;
        self.time = 0.0;

        log::debug!("Playback stopped");
        self.emit(&PlaybackEvent::TimeChanged(0.0));
        self.emit(&PlaybackEvent::Stopped);
    }

    /// Moves the cursor without changing the play state. The time is clamped
    /// into `[0, duration]`; during playback the run continues from there.
    pub fn seek(&mut self, time: f32) -> f32 {
        if self.disposed {
            return self.time;
        }

        let time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration)
        };
        self.time = time;

        if self.is_playing() {
            self.start_time = time;
            self.clock_origin = None;
        }

        self.emit(&PlaybackEvent::TimeChanged(time));
        time
    }

    /// Advances playback to the host timestamp `timestamp_ms` and hands the
    /// new time to `apply`.
    ///
    /// Returns `None` when no frame is pending. If `apply` fails, playback is
    /// forced to `Stopped`, the pending frame is dropped and observers receive
    /// [`PlaybackEvent::Aborted`].
    pub fn tick<F>(&mut self, timestamp_ms: f64, apply: F) -> Option<Tick>
    where
        F: FnOnce(f32) -> Result<()>,
    {
        if self.disposed || self.pending_frame.is_none() {
            return None;
        }
        debug_assert!(self.is_playing(), "frame pending while not playing");

        let origin = *self.clock_origin.get_or_insert(timestamp_ms);
        let elapsed = (timestamp_ms - origin).max(0.0) as f32;
        let new_time = (self.start_time + elapsed).min(self.duration);
        self.time = new_time;

        if let Err(err) = apply(new_time) {
            log::error!("Playback tick at {new_time}ms failed, stopping: {err}");
            self.cancel_frame();
            self.state = PlaybackState::Stopped;
            self.emit(&PlaybackEvent::Aborted(err.to_string()));
            return None;
        }

        self.emit(&PlaybackEvent::TimeChanged(new_time));

        let status = if new_time < self.duration {
            self.schedule_frame();
            TickStatus::Continue
        } else {
            match self.loop_mode {
                LoopMode::Loop => {
                    self.start_time = 0.0;
                    self.clock_origin = None;
                    self.time = 0.0;
                    self.schedule_frame();

                    log::debug!("Playback looped");
                    self.emit(&PlaybackEvent::Looped);
                    self.emit(&PlaybackEvent::TimeChanged(0.0));
                    TickStatus::Looped
                }
                LoopMode::Once => {
                    self.cancel_frame();
                    self.state = PlaybackState::Stopped;

                    log::debug!("Playback finished");
                    self.emit(&PlaybackEvent::Finished);
                    TickStatus::Finished
                }
            }
        };

        Some(Tick {
            time: new_time,
            status,
        })
    }

    /// Tears the scheduler down: cancels any pending frame, drops observers,
    /// and ignores every later call.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_frame();
        self.state = PlaybackState::Stopped;
        self.observers.clear();
        self.disposed = true;
        log::debug!("Playback scheduler disposed");
    }
}
