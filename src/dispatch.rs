// dispatch.rs — Batch layout and dispatch sizing.
//
// The frame is processed in square batches (GPU: one workgroup each).
// A batch owns a grid of "cells" (2x2 blocks in base mode, 4x4 regions in
// additional-rates mode) plus one cell of padding on every side, which it
// samples so that border cells can see their neighbours.
//
//   mode        tile  span  cells/side  cell  tiles/side  cells/tile
//   ─────────── ────  ────  ──────────  ────  ──────────  ──────────
//   base          8    16        8        2        2           4
//   base         16    16        8        2        1           8
//   base         32    32       16        2        1          16
//   additional    8    32        8        4        4           2
//   additional   16    32        8        4        2           4
//   additional   32    32        8        4        1           8
//
// Batch counts per axis: ceil(vrs_dim * tile / span), i.e.
// ceil(vrs_dim / tiles_per_side) since span is a multiple of the tile.

use crate::config::{vrs_image_dims, TileSize, VrsConfig};

/// Largest cells-per-side of any layout (base mode, tile 32).
pub const MAX_CELLS_1D: usize = 16;
/// Largest padded sample count of any layout.
pub const MAX_SAMPLES: usize = (MAX_CELLS_1D + 2) * (MAX_CELLS_1D + 2);
/// Largest number of tiles a single batch writes.
pub const MAX_TILES_PER_BATCH: usize = 16;

/// Which algorithm variant runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// 2x2 is the coarsest rate; cells are 2x2 blocks.
    Base,
    /// Up to 4x4; cells are 4x4 regions.
    AdditionalRates,
}

/// Geometry of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLayout {
    pub mode: GenerationMode,
    pub tile_size: TileSize,
    /// Pixels covered by a batch along each axis.
    pub span: u32,
    /// Interior cells along each axis.
    pub cells_1d: u32,
    /// Pixels per cell along each axis.
    pub cell_size: u32,
    /// Output tiles along each axis.
    pub tiles_1d: u32,
}

impl BatchLayout {
    pub fn new(tile_size: TileSize, additional_rates: bool) -> Self {
        let tile = tile_size.pixels();
        let (mode, span, cell_size) = if additional_rates {
            (GenerationMode::AdditionalRates, 32, 4)
        } else {
            (GenerationMode::Base, tile.max(16), 2)
        };
        BatchLayout {
            mode,
            tile_size,
            span,
            cells_1d: span / cell_size,
            cell_size,
            tiles_1d: span / tile,
        }
    }

    /// Cells along each axis including the one-cell border.
    #[inline]
    pub fn samples_1d(&self) -> usize {
        self.cells_1d as usize + 2
    }

    /// Interior cells belonging to one output tile, per axis.
    #[inline]
    pub fn cells_per_tile_1d(&self) -> usize {
        (self.cells_1d / self.tiles_1d) as usize
    }

    /// Threads per GPU workgroup (one per interior cell).
    #[inline]
    pub fn workgroup_invocations(&self) -> u32 {
        self.cells_1d * self.cells_1d
    }
}

/// Number of batches (workgroups) along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchInfo {
    pub groups_x: u32,
    pub groups_y: u32,
}

impl DispatchInfo {
    pub fn new(width: u32, height: u32, layout: &BatchLayout) -> Self {
        let (vrs_w, vrs_h) = vrs_image_dims(width, height, layout.tile_size.pixels());
        DispatchInfo {
            groups_x: vrs_w.div_ceil(layout.tiles_1d),
            groups_y: vrs_h.div_ceil(layout.tiles_1d),
        }
    }

    /// Dispatch for an already validated configuration.
    pub fn for_config(config: &VrsConfig, tile_size: TileSize) -> Self {
        let layout = BatchLayout::new(tile_size, config.additional_rates);
        Self::new(config.width, config.height, &layout)
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.groups_x as usize * self.groups_y as usize
    }
}
