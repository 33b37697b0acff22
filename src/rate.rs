// rate.rs — Shading-rate codes.
//
// A shading rate tells the rasterizer how many pixels one pixel-shader
// invocation covers. The packed 8-bit code written into the VRS image is
//
//   code = (log2(x_rate) << 2) | log2(y_rate)
//
//   ┌──────┬──────┬──────────────────────────┐
//   │ rate │ code │ availability             │
//   ├──────┼──────┼──────────────────────────┤
//   │ 1x1  │ 0x0  │ always (full rate)       │
//   │ 1x2  │ 0x1  │ always                   │
//   │ 2x1  │ 0x4  │ always                   │
//   │ 2x2  │ 0x5  │ always                   │
//   │ 2x4  │ 0x6  │ additional rates only    │
//   │ 4x2  │ 0x9  │ additional rates only    │
//   │ 4x4  │ 0xA  │ additional rates only    │
//   └──────┴──────┴──────────────────────────┘
//
// Numeric code order is not a coarseness order: 2x4 and 4x2 cover the same
// pixel count, and 2x1 outranks 1x2. The reducers still combine codes with
// plain integer MIN / bitwise AND, the convention the generated images
// follow. Coarseness comparisons go through `axes()` or
// `pixels_per_invocation()`.

use std::fmt;

/// Per-axis rate: how many pixels along one axis share an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AxisRate {
    X1 = 0,
    X2 = 1,
    X4 = 2,
}

impl AxisRate {
    /// log2 of the pixel count.
    #[inline]
    pub fn log2(self) -> u8 {
        self as u8
    }

    /// Number of pixels covered along this axis.
    #[inline]
    pub fn pixels(self) -> u32 {
        1 << self.log2()
    }

    /// Inverse of `log2`; values above 2 saturate at `X4`.
    pub fn from_log2(v: u8) -> Self {
        match v {
            0 => AxisRate::X1,
            1 => AxisRate::X2,
            _ => AxisRate::X4,
        }
    }
}

/// One of the seven shading rates a VRS image can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingRate {
    #[default]
    R1x1,
    R1x2,
    R2x1,
    R2x2,
    R2x4,
    R4x2,
    R4x4,
}

/// Pack per-axis rates into a shading-rate code.
#[inline]
pub fn make_code(x: AxisRate, y: AxisRate) -> u8 {
    (x.log2() << 2) | y.log2()
}

impl ShadingRate {
    /// Every rate, finest to coarsest (ascending code).
    pub const ALL: [ShadingRate; 7] = [
        ShadingRate::R1x1,
        ShadingRate::R1x2,
        ShadingRate::R2x1,
        ShadingRate::R2x2,
        ShadingRate::R2x4,
        ShadingRate::R4x2,
        ShadingRate::R4x4,
    ];

    /// The packed 8-bit code stored in the VRS image.
    #[inline]
    pub fn code(self) -> u8 {
        let (x, y) = self.axes();
        make_code(x, y)
    }

    /// Decode a packed code. Returns `None` for codes that name no
    /// supported rate (1x4, 4x1 or anything above 0xA).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(ShadingRate::R1x1),
            0x1 => Some(ShadingRate::R1x2),
            0x4 => Some(ShadingRate::R2x1),
            0x5 => Some(ShadingRate::R2x2),
            0x6 => Some(ShadingRate::R2x4),
            0x9 => Some(ShadingRate::R4x2),
            0xA => Some(ShadingRate::R4x4),
            _ => None,
        }
    }

    /// Build a rate from per-axis rates. 1x4 and 4x1 have no hardware
    /// encoding and are reduced to 1x2 / 2x1.
    pub fn from_axes(x: AxisRate, y: AxisRate) -> Self {
        use AxisRate::*;
        match (x, y) {
            (X1, X1) => ShadingRate::R1x1,
            (X1, _) => ShadingRate::R1x2,
            (X2, X1) | (X4, X1) => ShadingRate::R2x1,
            (X2, X2) => ShadingRate::R2x2,
            (X2, X4) => ShadingRate::R2x4,
            (X4, X2) => ShadingRate::R4x2,
            (X4, X4) => ShadingRate::R4x4,
        }
    }

    /// Per-axis rates `(x, y)`.
    pub fn axes(self) -> (AxisRate, AxisRate) {
        use AxisRate::*;
        match self {
            ShadingRate::R1x1 => (X1, X1),
            ShadingRate::R1x2 => (X1, X2),
            ShadingRate::R2x1 => (X2, X1),
            ShadingRate::R2x2 => (X2, X2),
            ShadingRate::R2x4 => (X2, X4),
            ShadingRate::R4x2 => (X4, X2),
            ShadingRate::R4x4 => (X4, X4),
        }
    }

    /// Rates with a 4-pixel axis need the additional-rates capability.
    pub fn is_additional(self) -> bool {
        let (x, y) = self.axes();
        x == AxisRate::X4 || y == AxisRate::X4
    }

    /// Pixels covered by one invocation (1, 2, 4, 8 or 16).
    pub fn pixels_per_invocation(self) -> u32 {
        let (x, y) = self.axes();
        x.pixels() * y.pixels()
    }

    /// True if this rate is at least as coarse as `other` on both axes.
    pub fn is_at_least_as_coarse_as(self, other: ShadingRate) -> bool {
        let (sx, sy) = self.axes();
        let (ox, oy) = other.axes();
        sx >= ox && sy >= oy
    }

    /// Overlay color (linear RGB) used by the debug visualization.
    pub fn overlay_color(self) -> [f32; 3] {
        match self {
            ShadingRate::R1x1 => [1.0, 0.0, 0.0],
            ShadingRate::R1x2 => [1.0, 1.0, 0.0],
            ShadingRate::R2x1 => [1.0, 0.5, 0.0],
            ShadingRate::R2x2 => [0.0, 1.0, 0.0],
            ShadingRate::R2x4 => [0.5, 0.5, 1.0],
            ShadingRate::R4x2 => [1.0, 0.5, 1.0],
            ShadingRate::R4x4 => [0.0, 1.0, 1.0],
        }
    }
}

impl fmt::Display for ShadingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.axes();
        write!(f, "{}x{}", x.pixels(), y.pixels())
    }
}

// Packed constants for the reducers, which work on raw codes.
pub const CODE_1X1: u8 = 0x0;
pub const CODE_1X2: u8 = 0x1;
pub const CODE_2X1: u8 = 0x4;
pub const CODE_2X2: u8 = 0x5;
pub const CODE_2X4: u8 = 0x6;
pub const CODE_4X2: u8 = 0x9;
pub const CODE_4X4: u8 = 0xA;
