//! Kinema core types.
//!
//! - [`errors`]: the shared error enum and `Result` alias
//! - [`parameter`]: declarative parameter registry and value normalization
//! - [`settings`]: session timeline/smoothing configuration
//! - [`time`]: monotonic frame clock

pub mod errors;
pub mod parameter;
pub mod settings;
pub mod time;

pub use errors::{KinemaError, Result};
pub use parameter::{ParameterConfig, ParameterRegistry};
pub use settings::{SmoothingSettings, TimelineSettings};
pub use time::FrameClock;
