//! Error Types
//!
//! This module defines the error types used throughout the editor core.
//!
//! # Overview
//!
//! The main error type [`KinemaError`] covers all failure modes including:
//! - Timeline model errors (unknown parameter, uninitialized model)
//! - Parameter registry and settings validation
//! - Non-finite values caught at a write boundary
//! - Snapshot import and file I/O errors
//! - Playback scheduling errors
//!
//! None of these are fatal. Model and numeric errors are recovered locally by
//! the caller (the write is skipped); only import/export failures are meant to
//! be surfaced to the user.
//!
//! ```rust,ignore
//! use kinema_core::errors::{KinemaError, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the editor core.
#[derive(Error, Debug)]
pub enum KinemaError {
    // ========================================================================
    // Timeline Model Errors
    // ========================================================================
    /// The timeline has no model yet (or it was released on teardown).
    #[error("Timeline is not initialized")]
    Uninitialized,

    /// No track exists for the given parameter name.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// No keyframe lies within the merge tolerance of the requested time.
    #[error("No keyframe near {time}ms on '{parameter}'")]
    NoKeyframeNear {
        /// Track that was searched
        parameter: String,
        /// Requested time in milliseconds
        time: f32,
    },

    /// Keyframe time is negative or not a finite number.
    #[error("Invalid keyframe time: {0}")]
    InvalidTime(f32),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A parameter whose domain has zero width cannot be normalized.
    #[error("Parameter '{name}' has a degenerate range [{min}, {max}]")]
    DegenerateRange {
        /// Parameter name
        name: String,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// The same parameter name was registered twice.
    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    /// Session settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ========================================================================
    // Numeric Errors
    // ========================================================================
    /// A computed value was NaN or infinite.
    #[error("Non-finite value for '{parameter}': {value}")]
    NonFinite {
        /// Parameter the value belongs to
        parameter: String,
        /// The offending value
        value: f32,
    },

    // ========================================================================
    // Import / Export Errors
    // ========================================================================
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot parsed as JSON but does not have the expected shape.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Scheduling Errors
    // ========================================================================
    /// A tick could not be applied; playback was force-stopped.
    #[error("Playback tick failed: {0}")]
    TickFailed(String),

    /// The session was torn down and no longer accepts work.
    #[error("Session has been disposed")]
    Disposed,
}

/// Alias for `Result<T, KinemaError>`.
pub type Result<T> = std::result::Result<T, KinemaError>;
