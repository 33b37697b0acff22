// vrsgen: Variable-rate-shading image generation
// CPU reference implementation plus a wgpu compute mirror
//
// Given a rendered frame's luminance and per-pixel motion vectors, produce
// one shading-rate code per screen tile: coarse rates where the image is
// flat or moving fast, full rate across edges and fine detail.

pub mod image;
pub mod convert;
pub mod error;
pub mod rate;
pub mod config;
pub mod frame;
pub mod sampler;
pub mod analyzer;
pub mod reducer;
pub mod dispatch;
pub mod tile_grid;
pub mod generator;
pub mod combiner;
pub mod overlay;
pub mod gpu;

pub use combiner::{Combiner, RateCombiners};
pub use config::{HardwareCaps, TileSize, VrsConfig, VrsSettings, VrsTier};
pub use error::{VrsError, VrsResult};
pub use frame::{Frame, FrameSource};
pub use generator::VrsGenerator;
pub use rate::ShadingRate;
pub use tile_grid::{RateSink, TileGrid};
