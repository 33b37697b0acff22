// analyzer.rs — Luminance variance per 2x2 block and per 4x4 region.
//
// BASE MODE works on 2x2 blocks:
//
//     TL  TR        H = max(|TL-TR|, |BL-BR|)   horizontal variance
//     BL  BR        V = max(|TL-BL|, |TR-BR|)   vertical variance
//                   C = max(TL..BR) - min(TL..BR)
//
// ADDITIONAL-RATES MODE works on 4x4 regions made of four 2x2 sub-blocks.
// Besides the per-sub-block H/V/C it tracks luminance ranges over the two
// 4x2 row pairs, the two 2x4 column pairs and the whole region, which is
// what decides whether 4x2, 2x4 or 4x4 shading is safe.
//
// Motion: a moving region hides detail, so `motion_factor * |mv|` (read at
// the block or region origin) is deducted from every variance term.
// Luminance comes through the Sampler, i.e. reprojected along the motion.

use crate::frame::FrameSource;
use crate::sampler::Sampler;

// ---------------------------------------------------------------------------
// Base mode: 2x2 blocks
// ---------------------------------------------------------------------------

/// Variance statistics of one 2x2 pixel block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockStats {
    /// Horizontal variance, motion-deducted. May be negative.
    pub h: f32,
    /// Vertical variance, motion-deducted. May be negative.
    pub v: f32,
    /// Combined variance (luminance range), motion-deducted.
    pub c: f32,
    /// Smallest luminance in the block.
    pub min_lum: f32,
    /// Largest luminance in the block, motion-deducted.
    pub max_lum: f32,
}

/// Raw differences of one 2x2 quad, before motion deduction.
#[derive(Debug, Clone, Copy)]
struct Quad {
    h: f32,
    v: f32,
    c: f32,
    min: f32,
    max: f32,
}

#[inline]
fn sample_quad<S: FrameSource + ?Sized>(s: &Sampler<'_, S>, x: i64, y: i64) -> Quad {
    let tl = s.luminance(x, y);
    let tr = s.luminance(x + 1, y);
    let bl = s.luminance(x, y + 1);
    let br = s.luminance(x + 1, y + 1);

    let min = tl.min(tr).min(bl.min(br));
    let max = tl.max(tr).max(bl.max(br));
    Quad {
        h: (tl - tr).abs().max((bl - br).abs()),
        v: (tl - bl).abs().max((tr - br).abs()),
        c: max - min,
        min,
        max,
    }
}

/// Analyze the 2x2 block whose top-left pixel is `(x, y)`.
/// The block may lie partly or wholly outside the frame.
pub fn analyze_block<S: FrameSource + ?Sized>(
    sampler: &Sampler<'_, S>,
    x: i64,
    y: i64,
    motion_factor: f32,
) -> BlockStats {
    let q = sample_quad(sampler, x, y);
    let m = motion_factor * sampler.motion_length(x, y);
    BlockStats {
        h: q.h - m,
        v: q.v - m,
        c: q.c - m,
        min_lum: q.min,
        max_lum: q.max - m,
    }
}

// ---------------------------------------------------------------------------
// Additional-rates mode: 4x4 regions
// ---------------------------------------------------------------------------

/// Motion-deducted, non-negative variances of one 4x4 region, one per
/// candidate coarse rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionVariance {
    pub v2x1: f32,
    pub v1x2: f32,
    pub v2x2: f32,
    pub v4x2: f32,
    pub v2x4: f32,
    pub v4x4: f32,
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f32,
    max: f32,
}

impl Range {
    const EMPTY: Range = Range { min: f32::INFINITY, max: f32::NEG_INFINITY };

    #[inline]
    fn include(&mut self, q: &Quad) {
        self.min = self.min.min(q.min);
        self.max = self.max.max(q.max);
    }

    #[inline]
    fn extent(&self) -> f32 {
        self.max - self.min
    }
}

/// Analyze the 4x4 region whose top-left pixel is `(x, y)`.
pub fn analyze_region<S: FrameSource + ?Sized>(
    sampler: &Sampler<'_, S>,
    x: i64,
    y: i64,
    motion_factor: f32,
) -> RegionVariance {
    let m = motion_factor * sampler.motion_length(x, y);

    let mut out = RegionVariance::default();
    let mut rows = [Range::EMPTY; 2]; // 4x2: sub-block rows
    let mut cols = [Range::EMPTY; 2]; // 2x4: sub-block columns
    let mut all = Range::EMPTY;

    for sy in 0..2usize {
        for sx in 0..2usize {
            let q = sample_quad(sampler, x + 2 * sx as i64, y + 2 * sy as i64);
            out.v2x1 = out.v2x1.max((q.h - m).max(0.0));
            out.v1x2 = out.v1x2.max((q.v - m).max(0.0));
            out.v2x2 = out.v2x2.max((q.c - m).max(0.0));
            rows[sy].include(&q);
            cols[sx].include(&q);
            all.include(&q);
        }
    }

    out.v4x2 = (rows[0].extent().max(rows[1].extent()) - m).max(0.0);
    out.v2x4 = (cols[0].extent().max(cols[1].extent()) - m).max(0.0);
    out.v4x4 = (all.extent() - m).max(0.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::image::Image;

    fn frame_from(w: usize, h: usize, f: impl FnMut(usize, usize) -> f32) -> Frame {
        Frame::new(Image::from_fn(w, h, f))
    }

    #[test]
    fn test_block_flat() {
        let frame = Frame::flat(4, 4, 0.5);
        let s = Sampler::new(&frame, true);
        let b = analyze_block(&s, 0, 0, 0.01);
        assert_eq!(b, BlockStats { h: 0.0, v: 0.0, c: 0.0, min_lum: 0.5, max_lum: 0.5 });
    }

    #[test]
    fn test_block_vertical_stripes() {
        // Columns alternate 0,1 → strong horizontal variance only.
        let frame = frame_from(4, 4, |x, _| (x % 2) as f32);
        let s = Sampler::new(&frame, true);
        let b = analyze_block(&s, 0, 0, 0.0);
        assert_eq!(b.h, 1.0);
        assert_eq!(b.v, 0.0);
        assert_eq!(b.c, 1.0);
    }

    #[test]
    fn test_block_motion_deduction() {
        let lum = Image::from_fn(8, 8, |x, _| (x % 2) as f32);
        let mv = Image::filled(8, 8, [3.0f32, 4.0]); // |mv| = 5
        let frame = Frame::with_motion(lum, mv);
        let s = Sampler::new(&frame, true);
        let b = analyze_block(&s, 4, 5, 0.1);
        // Reads come from (1..=2, 1..=2); columns still alternate.
        assert!((b.h - 0.5).abs() < 1e-6);
        assert!((b.v + 0.5).abs() < 1e-6);
        assert!((b.max_lum - 0.5).abs() < 1e-6);
        assert_eq!(b.min_lum, 0.0);
    }

    #[test]
    fn test_block_outside_frame_is_clamped() {
        let frame = frame_from(2, 2, |x, y| (x + 2 * y) as f32);
        let s = Sampler::new(&frame, true);
        // Entirely above-left of the frame: all four reads hit (0,0).
        let b = analyze_block(&s, -4, -4, 0.0);
        assert_eq!(b.c, 0.0);
        assert_eq!(b.min_lum, 0.0);
    }

    #[test]
    fn test_region_flat() {
        let frame = Frame::flat(8, 8, 0.3);
        let s = Sampler::new(&frame, true);
        assert_eq!(analyze_region(&s, 0, 0, 0.0), RegionVariance::default());
    }

    #[test]
    fn test_region_step_between_column_pairs() {
        // Left half 0, right half 1: every 2x2 sub-block is flat, but the
        // 4-wide spans see the step.
        let frame = frame_from(4, 4, |x, _| if x < 2 { 0.0 } else { 1.0 });
        let s = Sampler::new(&frame, true);
        let r = analyze_region(&s, 0, 0, 0.0);
        assert_eq!(r.v2x1, 0.0);
        assert_eq!(r.v1x2, 0.0);
        assert_eq!(r.v2x2, 0.0);
        assert_eq!(r.v2x4, 0.0); // each column pair is uniform
        assert_eq!(r.v4x2, 1.0);
        assert_eq!(r.v4x4, 1.0);
    }

    #[test]
    fn test_region_motion_floors_at_zero() {
        let lum = Image::from_fn(4, 4, |x, y| ((x + y) % 2) as f32);
        let mv = Image::filled(4, 4, [0.0f32, 10.0]);
        let frame = Frame::with_motion(lum, mv);
        let s = Sampler::new(&frame, true);
        let r = analyze_region(&s, 0, 0, 1.0);
        assert_eq!(r, RegionVariance::default());
    }
}
