// config.rs — Generator configuration, user settings and hardware caps.
//
// Three layers, from most to least volatile:
//
//   VrsSettings   user-tunable knobs (sliders in a debug UI, or a TOML
//                 file). Serializable.
//   HardwareCaps  what the GPU reports: VRS tier, shading-rate tile size,
//                 whether 2x4/4x2/4x4 are available. Serializable so a
//                 captured device report can be replayed offline.
//   VrsConfig     the flat, per-frame parameter block the generator runs
//                 with. Built from the other two via `from_caps`, or
//                 filled in directly.
//
// VrsConfig is validated by VrsGenerator::new; invalid tile sizes or
// resolutions never reach the batch loops.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{VrsError, VrsResult};

/// Default variance cutoff ("VRS threshold").
pub const DEFAULT_VARIANCE_CUTOFF: f32 = 0.015;
/// Default motion factor ("VRS motion factor").
pub const DEFAULT_MOTION_FACTOR: f32 = 0.01;

// ---------------------------------------------------------------------------
// Tile size
// ---------------------------------------------------------------------------

/// Edge length in pixels of one VRS-image texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSize {
    T8,
    T16,
    T32,
}

impl TileSize {
    #[inline]
    pub fn pixels(self) -> u32 {
        match self {
            TileSize::T8 => 8,
            TileSize::T16 => 16,
            TileSize::T32 => 32,
        }
    }
}

impl TryFrom<u32> for TileSize {
    type Error = VrsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(TileSize::T8),
            16 => Ok(TileSize::T16),
            32 => Ok(TileSize::T32),
            other => Err(VrsError::InvalidTileSize(other)),
        }
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.pixels())
    }
}

// ---------------------------------------------------------------------------
// Hardware capabilities
// ---------------------------------------------------------------------------

/// Variable-rate-shading support level reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VrsTier {
    NotSupported,
    /// Per-draw rates only.
    Tier1,
    /// Per-draw, per-primitive and image-based rates.
    Tier2,
}

impl fmt::Display for VrsTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VrsTier::NotSupported => write!(f, "not supported"),
            VrsTier::Tier1 => write!(f, "tier 1"),
            VrsTier::Tier2 => write!(f, "tier 2"),
        }
    }
}

/// Device report relevant to image-based shading rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareCaps {
    pub tier: VrsTier,
    /// Shading-rate image tile size in pixels.
    pub tile_size: u32,
    /// 2x4, 4x2 and 4x4 are available.
    pub additional_rates_supported: bool,
}

impl Default for HardwareCaps {
    fn default() -> Self {
        HardwareCaps {
            tier: VrsTier::Tier2,
            tile_size: 16,
            additional_rates_supported: false,
        }
    }
}

// ---------------------------------------------------------------------------
// User settings
// ---------------------------------------------------------------------------

/// User-tunable generation settings.
///
/// Missing keys in a TOML document fall back to the defaults:
///
/// ```toml
/// variance_cutoff = 0.05
/// motion_factor = 0.05
/// allow_additional_rates = true
/// use_motion_vectors = true
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrsSettings {
    /// Luminance variance below which a region may be shaded coarsely.
    pub variance_cutoff: f32,
    /// Scale from motion-vector length (pixels) to a variance allowance.
    pub motion_factor: f32,
    /// Use 2x4/4x2/4x4 when the hardware supports them.
    pub allow_additional_rates: bool,
    /// Reproject through motion vectors and deduct motion from variance.
    pub use_motion_vectors: bool,
}

impl Default for VrsSettings {
    fn default() -> Self {
        VrsSettings {
            variance_cutoff: DEFAULT_VARIANCE_CUTOFF,
            motion_factor: DEFAULT_MOTION_FACTOR,
            allow_additional_rates: true,
            use_motion_vectors: true,
        }
    }
}

impl VrsSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(text: &str) -> VrsResult<Self> {
        let settings: VrsSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> VrsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VrsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?settings, "loaded VRS settings");
        Ok(settings)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> VrsResult<String> {
        Ok(toml::to_string(self)?)
    }

    fn validate(&self) -> VrsResult<()> {
        check_parameter("variance_cutoff", self.variance_cutoff)?;
        check_parameter("motion_factor", self.motion_factor)
    }
}

// ---------------------------------------------------------------------------
// VrsConfig
// ---------------------------------------------------------------------------

/// Full parameter block for one generator invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VrsConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// VRS-image tile size in pixels: 8, 16 or 32.
    pub tile_size: u32,
    pub variance_cutoff: f32,
    pub motion_factor: f32,
    /// Emit 2x4/4x2/4x4 (additional-rates mode).
    pub additional_rates: bool,
    /// When false, motion is treated as zero everywhere.
    pub use_motion_vectors: bool,
}

impl Default for VrsConfig {
    fn default() -> Self {
        VrsConfig {
            width: 1920,
            height: 1080,
            tile_size: 16,
            variance_cutoff: DEFAULT_VARIANCE_CUTOFF,
            motion_factor: DEFAULT_MOTION_FACTOR,
            additional_rates: false,
            use_motion_vectors: true,
        }
    }
}

impl VrsConfig {
    /// Configuration for a `width`×`height` frame with default settings.
    pub fn for_resolution(width: u32, height: u32, tile_size: u32) -> Self {
        VrsConfig {
            width,
            height,
            tile_size,
            ..VrsConfig::default()
        }
    }

    /// Combine a device report with user settings.
    ///
    /// Additional rates are enabled only when the hardware supports them
    /// and the user allows them.
    ///
    /// # Errors
    /// `UnsupportedTier` unless the device reports tier 2, plus every
    /// error `validate` can return.
    pub fn from_caps(
        width: u32,
        height: u32,
        caps: &HardwareCaps,
        settings: &VrsSettings,
    ) -> VrsResult<Self> {
        if caps.tier != VrsTier::Tier2 {
            warn!(tier = %caps.tier, "image-based shading rates unavailable");
            return Err(VrsError::UnsupportedTier(caps.tier));
        }
        let config = VrsConfig {
            width,
            height,
            tile_size: caps.tile_size,
            variance_cutoff: settings.variance_cutoff,
            motion_factor: settings.motion_factor,
            additional_rates: caps.additional_rates_supported && settings.allow_additional_rates,
            use_motion_vectors: settings.use_motion_vectors,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field; returns the parsed tile size on success.
    pub fn validate(&self) -> VrsResult<TileSize> {
        let tile = TileSize::try_from(self.tile_size)?;
        if self.width == 0 || self.height == 0 {
            return Err(VrsError::ZeroResolution {
                width: self.width,
                height: self.height,
            });
        }
        check_parameter("variance_cutoff", self.variance_cutoff)?;
        check_parameter("motion_factor", self.motion_factor)?;
        Ok(tile)
    }

    /// VRS-image dimensions `(columns, rows)` for this configuration.
    pub fn vrs_image_dims(&self) -> (u32, u32) {
        vrs_image_dims(self.width, self.height, self.tile_size)
    }
}

/// VRS-image dimensions for a frame: `ceil(w / tile) × ceil(h / tile)`.
///
/// # Panics
/// Panics if `tile_size` is zero.
#[inline]
pub fn vrs_image_dims(width: u32, height: u32, tile_size: u32) -> (u32, u32) {
    assert!(tile_size > 0, "tile size must be non-zero");
    (width.div_ceil(tile_size), height.div_ceil(tile_size))
}

fn check_parameter(name: &'static str, value: f32) -> VrsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(VrsError::InvalidParameter { name, value })
    }
}
