// error.rs — Error type for configuration and settings handling.
//
// The generator itself has no failure modes once constructed; everything
// that can go wrong is rejected up front when a configuration is built.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::VrsTier;

/// Result alias used across the crate.
pub type VrsResult<T> = Result<T, VrsError>;

#[derive(Error, Debug)]
pub enum VrsError {
    #[error("tile size {0} is not supported (expected 8, 16 or 32)")]
    InvalidTileSize(u32),

    #[error("frame resolution {width}x{height} must be non-zero in both axes")]
    ZeroResolution { width: u32, height: u32 },

    #[error("{name} must be finite and non-negative (got {value})")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("image-based shading rates need tier 2 hardware support (found {0})")]
    UnsupportedTier(VrsTier),

    #[error("frame source is {actual_w}x{actual_h} but the generator expects {expected_w}x{expected_h}")]
    FrameSizeMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
