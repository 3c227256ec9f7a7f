#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Kinema: a keyframe timeline editor for a small set of named numeric
//! parameters driving a 3D object.
//!
//! - [`kinema_core`]: parameter registry, settings, errors, frame clock
//! - [`animation`]: tracks, interpolation, playback and synchronization
//! - [`session`]: the per-session composition of all of the above

pub mod session;

pub use kinema_animation as animation;
pub use kinema_core::{errors, parameter, settings, time};

pub use errors::{KinemaError, Result};
pub use kinema_animation::{
    ControlPanel, InterpolatedFrame, Keyframe, KeyframeWrite, LoopMode, PanelState, PlaybackEvent,
    PlaybackScheduler, PlaybackState, RenderBinding, SyncController, SyncPhase, Timeline,
    TimelineModel, Track, TransformBinding,
};
pub use kinema_core::{FrameClock, ParameterConfig, ParameterRegistry, SmoothingSettings, TimelineSettings};
pub use session::EditorSession;
