// tile_grid.rs — The VRS image: one shading-rate code per screen tile.
//
// The grid covers the frame with tile_size × tile_size cells using ceiling
// division, so the right column and bottom row may hang past the frame edge:
//
//   frame 100×75, tile 16  →  7 × 5 tiles
//   ┌──┬──┬──┬──┬──┬──┬─┐
//   │  │  │  │  │  │  │ │ ← last column covers pixels 96..99 only
//   ├──┼──┼──┼──┼──┼──┼─┤
//   ...
//
// The generator writes through the `RateSink` trait so a renderer can point
// it at its own mapped texture instead; TileGrid is the in-memory sink.

use std::fmt;

use crate::config::{vrs_image_dims, VrsConfig};
use crate::image::Image;
use crate::rate::{ShadingRate, CODE_1X1};

/// Destination for per-tile shading-rate codes.
pub trait RateSink {
    /// Store `code` for tile `(tile_x, tile_y)`. Only called for tiles
    /// inside the grid.
    fn write(&mut self, tile_x: usize, tile_y: usize, code: u8);
}

/// In-memory VRS image.
#[derive(Clone, Debug)]
pub struct TileGrid {
    codes: Image<u8>,
    tile_size: u32,
    frame_w: u32,
    frame_h: u32,
}

impl TileGrid {
    /// Grid for a `frame_w`×`frame_h` frame, every tile at full rate.
    ///
    /// # Panics
    /// Panics if `tile_size` is zero.
    pub fn new(frame_w: u32, frame_h: u32, tile_size: u32) -> Self {
        let (cols, rows) = vrs_image_dims(frame_w, frame_h, tile_size);
        TileGrid {
            codes: Image::filled(cols as usize, rows as usize, CODE_1X1),
            tile_size,
            frame_w,
            frame_h,
        }
    }

    /// Grid sized for a generator configuration.
    pub fn for_config(config: &VrsConfig) -> Self {
        Self::new(config.width, config.height, config.tile_size)
    }

    /// Reset every tile to 1x1 (code 0).
    pub fn clear(&mut self) {
        self.codes.fill(CODE_1X1);
    }

    /// Grid dimensions (cols, rows).
    pub fn dims(&self) -> (usize, usize) {
        (self.codes.width(), self.codes.height())
    }

    pub fn cols(&self) -> usize {
        self.codes.width()
    }

    pub fn rows(&self) -> usize {
        self.codes.height()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Frame size the grid was built for.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_w, self.frame_h)
    }

    /// Raw code of tile `(tx, ty)`.
    ///
    /// # Panics
    /// Panics if the tile is outside the grid.
    #[inline]
    pub fn get(&self, tx: usize, ty: usize) -> u8 {
        self.codes.get(tx, ty)
    }

    /// Decoded rate of tile `(tx, ty)`; `None` for an unknown code.
    pub fn rate(&self, tx: usize, ty: usize) -> Option<ShadingRate> {
        ShadingRate::from_code(self.get(tx, ty))
    }

    /// Code of the tile containing pixel `(x, y)`, if that pixel is in the frame.
    pub fn code_at_pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.frame_w || y >= self.frame_h {
            return None;
        }
        let tx = (x / self.tile_size) as usize;
        let ty = (y / self.tile_size) as usize;
        Some(self.codes.get(tx, ty))
    }

    /// Row-major codes, ready to upload as an R8_UINT texture.
    pub fn as_bytes(&self) -> &[u8] {
        self.codes.as_slice()
    }

    /// Number of tiles per rate.
    pub fn histogram(&self) -> RateHistogram {
        let mut hist = RateHistogram::default();
        for (_, _, code) in self.codes.pixels() {
            match ShadingRate::ALL.iter().position(|r| r.code() == code) {
                Some(i) => hist.counts[i] += 1,
                None => hist.invalid += 1,
            }
        }
        hist
    }

    /// Fraction of full-rate pixel-shader invocations still needed when
    /// the frame is shaded with this grid. 1.0 = no savings, 1/16 = all 4x4.
    /// Edge tiles only count the pixels inside the frame; unknown codes
    /// count as full rate.
    pub fn shading_cost(&self) -> f32 {
        let total = self.frame_w as f64 * self.frame_h as f64;
        if total == 0.0 {
            return 1.0;
        }
        let t = self.tile_size;
        let mut invocations = 0.0f64;
        for (tx, ty, code) in self.codes.pixels() {
            let x0 = tx as u32 * t;
            let y0 = ty as u32 * t;
            let w = (x0 + t).min(self.frame_w) - x0;
            let h = (y0 + t).min(self.frame_h) - y0;
            let ppi = ShadingRate::from_code(code).map_or(1, |r| r.pixels_per_invocation());
            invocations += (w * h) as f64 / ppi as f64;
        }
        (invocations / total) as f32
    }
}

impl RateSink for TileGrid {
    #[inline]
    fn write(&mut self, tile_x: usize, tile_y: usize, code: u8) {
        if tile_x < self.codes.width() && tile_y < self.codes.height() {
            self.codes.set(tile_x, tile_y, code);
        }
    }
}

/// Tile counts per shading rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateHistogram {
    /// Indexed like `ShadingRate::ALL`.
    pub counts: [usize; 7],
    /// Tiles holding a code that names no rate.
    pub invalid: usize,
}

impl RateHistogram {
    pub fn count(&self, rate: ShadingRate) -> usize {
        ShadingRate::ALL
            .iter()
            .position(|&r| r == rate)
            .map_or(0, |i| self.counts[i])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.invalid
    }
}

impl fmt::Display for RateHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total().max(1) as f64;
        for (rate, &n) in ShadingRate::ALL.iter().zip(self.counts.iter()) {
            writeln!(f, "  {rate}: {n:>7} ({:5.1}%)", 100.0 * n as f64 / total)?;
        }
        if self.invalid > 0 {
            writeln!(f, "  invalid: {}", self.invalid)?;
        }
        Ok(())
    }
}
