//! Keyframe timeline for Kinema.
//!
//! Bottom-up:
//! - [`tracks`]: keyframes and per-parameter tracks (epsilon merge, sampling)
//! - [`model`]: the session timeline model and its write rules
//! - [`interpolator`]: time → per-parameter values
//! - [`scheduler`]: frame-driven playback clock
//! - [`smoothing`] / [`sync`]: feedback-free synchronization between user
//!   edits, playback and the render loop
//! - [`panel`] / [`binding`]: control panel and render binding interfaces
//! - [`snapshot`]: JSON import/export

pub mod binding;
pub mod interpolator;
pub mod model;
pub mod panel;
pub mod scheduler;
pub mod smoothing;
pub mod snapshot;
pub mod sync;
pub mod tracks;
pub mod values;

pub use binding::{Axis, ObjectTransform, PropertyBinding, RenderBinding, TargetPath, TransformBinding};
pub use interpolator::{InterpolatedFrame, interpolate};
pub use model::{Timeline, TimelineModel};
pub use panel::{ControlPanel, PanelState};
pub use scheduler::{LoopMode, ObserverKey, PlaybackEvent, PlaybackScheduler, PlaybackState, Tick, TickStatus};
pub use smoothing::Smoother;
pub use sync::{SyncController, SyncPhase};
pub use tracks::{Keyframe, KeyframeWrite, Track, TrackStyle};
pub use values::ParameterValues;
