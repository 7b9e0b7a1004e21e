//! Error types
//!
//! None of these ever reach the player: the session logs them and keeps the
//! game running.

use thiserror::Error;

/// Problems detected while advancing the simulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// The world lost its hero
    #[error("world has no hero")]
    HeroMissing,

    /// An entity ended a tick with a NaN or infinite coordinate
    #[error("shape {id} has non-finite state")]
    NonFinite {
        /// Entity ID of the offending shape
        id: u32,
    },
}

/// Errors raised by a drawing surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend rejected a draw call
    #[error("render backend error: {0}")]
    Backend(String),
}

/// External entropy refill failures
#[derive(Error, Debug)]
pub enum EntropyError {
    /// Transport-level failure
    #[error("entropy fetch failed: {0}")]
    Network(String),

    /// The payload was not the expected JSON
    #[error("malformed entropy payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service answered but reported failure
    #[error("entropy service reported failure")]
    Rejected,

    /// The service returned no numbers
    #[error("entropy service returned no data")]
    Empty,
}

/// Invalid configuration
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A numeric field is outside its allowed range
    #[error("setting {field} out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// The settings document could not be parsed
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
