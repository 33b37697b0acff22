// sampler.rs — Motion-reprojected luminance reads with edge clamping.
//
// Every luminance read made by the analyzer goes through here:
//
//   1. clamp the requested position to the frame
//   2. read the motion vector at the clamped position
//   3. step back along it: src = clamp(pos - round(mv))
//   4. return the luminance at src
//
// `round` is round-half-to-even so the CPU path makes the same choice as
// WGSL `round()` on the GPU path.
//
// Positions are i64: batch neighbourhoods start one block before the frame
// origin, and motion vectors can point anywhere.

use crate::frame::FrameSource;

/// Clamping, reprojecting view over a frame source.
pub struct Sampler<'a, S: FrameSource + ?Sized> {
    source: &'a S,
    max_x: i64,
    max_y: i64,
    use_motion: bool,
}

impl<'a, S: FrameSource + ?Sized> Sampler<'a, S> {
    /// # Panics
    /// Panics if the source frame is empty.
    pub fn new(source: &'a S, use_motion: bool) -> Self {
        let (w, h) = (source.width(), source.height());
        assert!(w > 0 && h > 0, "cannot sample an empty {w}×{h} frame");
        Sampler {
            source,
            max_x: w as i64 - 1,
            max_y: h as i64 - 1,
            use_motion,
        }
    }

    /// Clamp a position into the frame.
    #[inline]
    pub fn clamp(&self, x: i64, y: i64) -> (usize, usize) {
        (x.clamp(0, self.max_x) as usize, y.clamp(0, self.max_y) as usize)
    }

    /// Motion vector at the clamped position; zero when motion is disabled.
    #[inline]
    pub fn motion(&self, x: i64, y: i64) -> [f32; 2] {
        if !self.use_motion {
            return [0.0, 0.0];
        }
        let (cx, cy) = self.clamp(x, y);
        self.source.motion(cx, cy)
    }

    /// Euclidean length of the motion vector at the clamped position.
    #[inline]
    pub fn motion_length(&self, x: i64, y: i64) -> f32 {
        let [mx, my] = self.motion(x, y);
        (mx * mx + my * my).sqrt()
    }

    /// Luminance seen at `pos` after reprojecting through its motion vector.
    #[inline]
    pub fn luminance(&self, x: i64, y: i64) -> f32 {
        let (cx, cy) = self.clamp(x, y);
        if !self.use_motion {
            return self.source.luminance(cx, cy);
        }
        let [mx, my] = self.source.motion(cx, cy);
        // Float-to-int casts saturate (NaN → 0), so wild vectors just clamp.
        let sx = (cx as i64).saturating_sub(mx.round_ties_even() as i64);
        let sy = (cy as i64).saturating_sub(my.round_ties_even() as i64);
        let (px, py) = self.clamp(sx, sy);
        self.source.luminance(px, py)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::image::Image;

    fn ramp(w: usize, h: usize) -> Image<f32> {
        Image::from_fn(w, h, |x, y| (y * w + x) as f32)
    }

    #[test]
    fn test_clamps_outside_reads() {
        let frame = Frame::new(ramp(4, 4));
        let s = Sampler::new(&frame, true);
        assert_eq!(s.luminance(-3, -3), 0.0);
        assert_eq!(s.luminance(10, 0), 3.0);
        assert_eq!(s.luminance(0, 10), 12.0);
    }

    #[test]
    fn test_clamp_extreme_positions() {
        let frame = Frame::new(ramp(4, 3));
        let s = Sampler::new(&frame, false);
        assert_eq!(s.clamp(i64::MAX, i64::MIN), (3, 0));
        assert_eq!(s.clamp(i64::MIN, i64::MAX), (0, 2));
        assert_eq!(s.luminance(2, 1), 6.0);
    }

    #[test]
    fn test_reprojects_along_motion() {
        let mut mv: Image<[f32; 2]> = Image::new(4, 4);
        // Pixel (2,2) moved here from (1,2).
        mv.set(2, 2, [1.0, 0.0]);
        let frame = Frame::with_motion(ramp(4, 4), mv);
        let s = Sampler::new(&frame, true);
        assert_eq!(s.luminance(2, 2), 9.0); // value at (1,2)
        assert_eq!(s.luminance(1, 1), 5.0); // zero motion elsewhere
    }

    #[test]
    fn test_reprojection_clamps_source() {
        let mv = Image::filled(4, 4, [-100.0f32, 100.0]);
        let frame = Frame::with_motion(ramp(4, 4), mv);
        let s = Sampler::new(&frame, true);
        // src = (x + 100, y - 100) → clamped to (3, 0)
        assert_eq!(s.luminance(0, 3), 3.0);
    }

    #[test]
    fn test_round_half_to_even() {
        let mv = Image::filled(8, 1, [1.5f32, 0.0]);
        let frame = Frame::with_motion(ramp(8, 1), mv);
        let s = Sampler::new(&frame, true);
        // round_ties_even(1.5) = 2
        assert_eq!(s.luminance(4, 0), 2.0);

        let mv = Image::filled(8, 1, [2.5f32, 0.0]);
        let frame = Frame::with_motion(ramp(8, 1), mv);
        let s = Sampler::new(&frame, true);
        // round_ties_even(2.5) = 2
        assert_eq!(s.luminance(4, 0), 2.0);
    }

    #[test]
    fn test_motion_disabled() {
        let mv = Image::filled(4, 4, [3.0f32, 4.0]);
        let frame = Frame::with_motion(ramp(4, 4), mv);
        let on = Sampler::new(&frame, true);
        let off = Sampler::new(&frame, false);
        assert_eq!(on.motion_length(1, 1), 5.0);
        assert_eq!(off.motion_length(1, 1), 0.0);
        assert_eq!(off.luminance(3, 3), 15.0);
    }

    #[test]
    fn test_non_finite_motion_does_not_panic() {
        let mv = Image::filled(4, 4, [f32::NAN, f32::INFINITY]);
        let frame = Frame::with_motion(ramp(4, 4), mv);
        let s = Sampler::new(&frame, true);
        // NaN → 0 shift, +inf → saturates and clamps to row 0.
        assert_eq!(s.luminance(2, 2), 2.0);
    }
}
