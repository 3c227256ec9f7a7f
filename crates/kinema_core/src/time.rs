#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

enum ClockSource {
    Wall { start: Instant, last: Instant },
    /// Advances by `step` per tick regardless of real time.
    Fixed { step: Duration },
}

/// Frame clock for driving the UI and render loops.
///
/// The playback scheduler only needs a millisecond timestamp per frame
/// ([`timestamp_ms`](Self::timestamp_ms)); the render loop needs a frame
/// delta ([`dt_seconds`](Self::dt_seconds)).
///
/// A wall clock follows [`Instant`]. A fixed-step clock advances by a
/// constant step so headless runs and tests replay identically. The first
/// tick of either reports a timestamp of (about) zero, which is where the
/// scheduler anchors playback.
pub struct FrameClock {
    source: ClockSource,
    elapsed: Duration,
    delta: Duration,
    max_delta: Option<Duration>,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Wall clock starting now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(ClockSource::Wall {
            start: now,
            last: now,
        })
    }

    /// Deterministic clock advancing by `step` on every tick after the first.
    #[must_use]
    pub fn fixed_step(step: Duration) -> Self {
        Self::with_source(ClockSource::Fixed { step })
    }

    fn with_source(source: ClockSource) -> Self {
        Self {
            source,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            max_delta: None,
            frame_count: 0,
        }
    }

    /// Caps the render delta after a stall (debugger break, hidden window).
    ///
    /// Only [`delta`](Self::delta) is clamped; the timestamp keeps following
    /// the source so playback stays on the real timeline.
    #[must_use]
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = Some(max_delta);
        self
    }

    /// Samples the clock; call once at the start of every frame.
    pub fn tick(&mut self) {
        let raw_delta = match &mut self.source {
            ClockSource::Wall { start, last } => {
                let now = Instant::now();
                let delta = now - *last;
                self.elapsed = now - *start;
                *last = now;
                delta
            }
            ClockSource::Fixed { step } => {
                if self.frame_count > 0 {
                    self.elapsed += *step;
                }
                *step
            }
        };

        self.delta = self.max_delta.map_or(raw_delta, |max| raw_delta.min(max));
        self.frame_count += 1;
    }

    #[must_use]
    pub fn is_fixed_step(&self) -> bool {
        matches!(self.source, ClockSource::Fixed { .. })
    }

    /// Time since the previous tick, after clamping.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time at the last tick, in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
