//! Error types
//!
//! The tick itself never fails; these cover misconfiguration at `configure`
//! time and settings file I/O.

use thiserror::Error;

/// Errors surfaced to callers that build or configure battles
#[derive(Debug, Error)]
pub enum SimError {
    /// Weapon identity not present in the registry
    #[error("unknown weapon type: {0}")]
    UnknownWeapon(String),

    /// Arena rectangle with a non-positive or non-finite dimension
    #[error("invalid arena size {width}x{height}")]
    InvalidArena { width: f32, height: f32 },

    /// Settings value outside its usable range
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be parsed
    #[error("settings parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// Settings file could not be read or written
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
}
