// generator.rs — Tiled VRS-image generation (CPU reference).
//
// One call processes one frame. The frame is cut into batches (see
// dispatch.rs); each batch runs two phases over a fixed-size stack buffer:
//
//   PHASE 1 — sample
//     Analyze every cell of the padded neighbourhood, (cells_1d + 2)² of
//     them, starting one cell before the batch origin:
//
//       ┌───┬───┬───┬───┬───┬───┐
//       │ p │ p │ p │ p │ p │ p │   p = padding cell (read only as a
//       ├───┼───┼───┼───┼───┼───┤       neighbour)
//       │ p │ · │ · │ · │ · │ p │   · = interior cell (owned by the batch)
//       │ p │ · │ · │ · │ · │ p │
//       ...
//
//   PHASE 2 — reduce
//     Every interior cell combines itself with its 4 direct neighbours,
//     then the cells of each output tile reduce to one code.
//
//       base, tile 8      per tile: max H/V/C over its 4×4 blocks → decide
//       base, tile 16/32  every block decides; codes AND-ed from 2x2
//       additional        region cascade → MIN with neighbours → MIN per tile
//
// Batches share nothing, so `generate_parallel` fans them out with rayon
// and then writes results in batch order; its output is byte-identical to
// the sequential `generate`.

use rayon::prelude::*;
use tracing::{debug, trace_span};

use crate::analyzer::{analyze_block, analyze_region, BlockStats};
use crate::config::{TileSize, VrsConfig};
use crate::dispatch::{BatchLayout, DispatchInfo, GenerationMode, MAX_SAMPLES, MAX_TILES_PER_BATCH};
use crate::error::{VrsError, VrsResult};
use crate::frame::FrameSource;
use crate::rate::{CODE_2X2, CODE_4X4};
use crate::reducer::{
    adjust_block, decide_base_rate, select_region_rate, smooth_region_rate, AdjustedVariance,
};
use crate::sampler::Sampler;
use crate::tile_grid::{RateSink, TileGrid};

// ---------------------------------------------------------------------------
// Batch output
// ---------------------------------------------------------------------------

/// Codes produced by one batch, row-major over its tiles.
#[derive(Debug, Clone, Copy)]
pub struct BatchOutput {
    pub group_x: u32,
    pub group_y: u32,
    tiles_1d: u32,
    codes: [u8; MAX_TILES_PER_BATCH],
}

impl BatchOutput {
    fn new(group_x: u32, group_y: u32, tiles_1d: u32) -> Self {
        BatchOutput { group_x, group_y, tiles_1d, codes: [0; MAX_TILES_PER_BATCH] }
    }

    /// Code of the batch-local tile `(tx, ty)`.
    pub fn code(&self, tx: u32, ty: u32) -> u8 {
        self.codes[(ty * self.tiles_1d + tx) as usize]
    }

    /// Write every tile that lies inside a `cols`×`rows` grid.
    fn emit<K: RateSink + ?Sized>(&self, sink: &mut K, cols: usize, rows: usize) {
        for ty in 0..self.tiles_1d {
            for tx in 0..self.tiles_1d {
                let gx = self.group_x as usize * self.tiles_1d as usize + tx as usize;
                let gy = self.group_y as usize * self.tiles_1d as usize + ty as usize;
                if gx < cols && gy < rows {
                    sink.write(gx, gy, self.code(tx, ty));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// VrsGenerator
// ---------------------------------------------------------------------------

/// CPU shading-rate image generator.
///
/// Construct once per configuration; `generate` may be called every frame.
#[derive(Debug, Clone)]
pub struct VrsGenerator {
    config: VrsConfig,
    tile_size: TileSize,
    layout: BatchLayout,
    dispatch: DispatchInfo,
}

impl VrsGenerator {
    /// Validate `config` and precompute the batch layout.
    ///
    /// # Errors
    /// Tile sizes other than 8/16/32, a zero-sized frame, or a negative or
    /// non-finite cutoff / motion factor.
    pub fn new(config: VrsConfig) -> VrsResult<Self> {
        let tile_size = config.validate()?;
        let layout = BatchLayout::new(tile_size, config.additional_rates);
        let dispatch = DispatchInfo::new(config.width, config.height, &layout);
        debug!(
            width = config.width,
            height = config.height,
            tile = tile_size.pixels(),
            mode = ?layout.mode,
            groups_x = dispatch.groups_x,
            groups_y = dispatch.groups_y,
            "VRS generator configured"
        );
        Ok(VrsGenerator { config, tile_size, layout, dispatch })
    }

    /// Swap in a new configuration (resolution, tile size or settings).
    pub fn reconfigure(&mut self, config: VrsConfig) -> VrsResult<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &VrsConfig {
        &self.config
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub fn mode(&self) -> GenerationMode {
        self.layout.mode
    }

    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    pub fn dispatch(&self) -> DispatchInfo {
        self.dispatch
    }

    /// An empty (all 1x1) grid of the right size for this configuration.
    pub fn create_grid(&self) -> TileGrid {
        TileGrid::for_config(&self.config)
    }

    /// Generate the VRS image for `source` into `sink`, one batch at a time.
    ///
    /// # Errors
    /// `FrameSizeMismatch` if the source is not the configured size.
    pub fn generate<S, K>(&self, source: &S, sink: &mut K) -> VrsResult<()>
    where
        S: FrameSource + ?Sized,
        K: RateSink + ?Sized,
    {
        self.check_source(source)?;
        let _span = trace_span!("vrs_generate", batches = self.dispatch.total()).entered();

        let sampler = Sampler::new(source, self.config.use_motion_vectors);
        let (cols, rows) = self.config.vrs_image_dims();
        for gy in 0..self.dispatch.groups_y {
            for gx in 0..self.dispatch.groups_x {
                self.run_batch(&sampler, gx, gy).emit(sink, cols as usize, rows as usize);
            }
        }
        Ok(())
    }

    /// Same result as `generate`, with batches spread over the rayon pool.
    pub fn generate_parallel<S, K>(&self, source: &S, sink: &mut K) -> VrsResult<()>
    where
        S: FrameSource + Sync + ?Sized,
        K: RateSink + ?Sized,
    {
        self.check_source(source)?;
        let _span = trace_span!("vrs_generate_parallel", batches = self.dispatch.total()).entered();

        let sampler = Sampler::new(source, self.config.use_motion_vectors);
        let groups_x = self.dispatch.groups_x as usize;
        let outputs: Vec<BatchOutput> = (0..self.dispatch.total())
            .into_par_iter()
            .map(|i| self.run_batch(&sampler, (i % groups_x) as u32, (i / groups_x) as u32))
            .collect();

        let (cols, rows) = self.config.vrs_image_dims();
        for out in &outputs {
            out.emit(sink, cols as usize, rows as usize);
        }
        Ok(())
    }

    /// Convenience: generate into a freshly allocated grid.
    pub fn generate_grid<S: FrameSource + Sync + ?Sized>(&self, source: &S) -> VrsResult<TileGrid> {
        let mut grid = self.create_grid();
        self.generate_parallel(source, &mut grid)?;
        Ok(grid)
    }

    /// Run a single batch. Exposed for tests and for tools that want to
    /// inspect per-batch results.
    pub fn run_batch<S: FrameSource + ?Sized>(
        &self,
        sampler: &Sampler<'_, S>,
        group_x: u32,
        group_y: u32,
    ) -> BatchOutput {
        match self.layout.mode {
            GenerationMode::Base => self.run_base_batch(sampler, group_x, group_y),
            GenerationMode::AdditionalRates => self.run_additional_batch(sampler, group_x, group_y),
        }
    }

    fn check_source<S: FrameSource + ?Sized>(&self, source: &S) -> VrsResult<()> {
        let w = u32::try_from(source.width());
        let h = u32::try_from(source.height());
        match (w, h) {
            (Ok(w), Ok(h)) if w == self.config.width && h == self.config.height => Ok(()),
            (w, h) => Err(VrsError::FrameSizeMismatch {
                expected_w: self.config.width,
                expected_h: self.config.height,
                actual_w: w.unwrap_or(u32::MAX),
                actual_h: h.unwrap_or(u32::MAX),
            }),
        }
    }

    /// Pixel position of padded cell (0, 0) for a batch.
    #[inline]
    fn padded_origin(&self, group_x: u32, group_y: u32) -> (i64, i64) {
        let span = self.layout.span as i64;
        let cell = self.layout.cell_size as i64;
        (group_x as i64 * span - cell, group_y as i64 * span - cell)
    }

    // --- Base mode ---

    fn run_base_batch<S: FrameSource + ?Sized>(
        &self,
        sampler: &Sampler<'_, S>,
        group_x: u32,
        group_y: u32,
    ) -> BatchOutput {
        let l = &self.layout;
        let n = l.samples_1d();
        let (ox, oy) = self.padded_origin(group_x, group_y);
        let motion_factor = self.config.motion_factor;
        let cutoff = self.config.variance_cutoff;

        // Phase 1
        let mut blocks = [BlockStats::default(); MAX_SAMPLES];
        for j in 0..n {
            for i in 0..n {
                let x = ox + 2 * i as i64;
                let y = oy + 2 * j as i64;
                blocks[j * n + i] = analyze_block(sampler, x, y, motion_factor);
            }
        }

        // Phase 2
        let adjusted = |cx: usize, cy: usize| -> AdjustedVariance {
            let at = |i: usize, j: usize| &blocks[j * n + i];
            let (i, j) = (cx + 1, cy + 1);
            adjust_block(at(i, j), [at(i - 1, j), at(i + 1, j), at(i, j - 1), at(i, j + 1)])
        };

        let per_tile = l.cells_per_tile_1d();
        let mut out = BatchOutput::new(group_x, group_y, l.tiles_1d);
        for ty in 0..l.tiles_1d as usize {
            for tx in 0..l.tiles_1d as usize {
                let cells = (0..per_tile).flat_map(|cy| (0..per_tile).map(move |cx| (cx, cy)));
                let cell = |(cx, cy): (usize, usize)| adjusted(tx * per_tile + cx, ty * per_tile + cy);

                let code = if l.tiles_1d > 1 {
                    let worst = cells.map(cell).fold(AdjustedVariance::default(), AdjustedVariance::max);
                    decide_base_rate(worst, cutoff)
                } else {
                    cells.map(cell).fold(CODE_2X2, |acc, v| acc & decide_base_rate(v, cutoff))
                };
                out.codes[ty * l.tiles_1d as usize + tx] = code;
            }
        }
        out
    }

    // --- Additional-rates mode ---

    fn run_additional_batch<S: FrameSource + ?Sized>(
        &self,
        sampler: &Sampler<'_, S>,
        group_x: u32,
        group_y: u32,
    ) -> BatchOutput {
        let l = &self.layout;
        let n = l.samples_1d();
        let (ox, oy) = self.padded_origin(group_x, group_y);
        let motion_factor = self.config.motion_factor;
        let cutoff = self.config.variance_cutoff;

        // Phase 1
        let mut rates = [0u8; MAX_SAMPLES];
        for j in 0..n {
            for i in 0..n {
                let x = ox + 4 * i as i64;
                let y = oy + 4 * j as i64;
                let var = analyze_region(sampler, x, y, motion_factor);
                rates[j * n + i] = select_region_rate(&var, cutoff);
            }
        }

        // Phase 2
        let smoothed = |cx: usize, cy: usize| -> u8 {
            let at = |i: usize, j: usize| rates[j * n + i];
            let (i, j) = (cx + 1, cy + 1);
            smooth_region_rate(at(i, j), [at(i - 1, j), at(i + 1, j), at(i, j - 1), at(i, j + 1)])
        };

        let per_tile = l.cells_per_tile_1d();
        let mut out = BatchOutput::new(group_x, group_y, l.tiles_1d);
        for ty in 0..l.tiles_1d as usize {
            for tx in 0..l.tiles_1d as usize {
                let mut code = CODE_4X4;
                for cy in 0..per_tile {
                    for cx in 0..per_tile {
                        code = code.min(smoothed(tx * per_tile + cx, ty * per_tile + cy));
                    }
                }
                out.codes[ty * l.tiles_1d as usize + tx] = code;
            }
        }
        out
    }
}
