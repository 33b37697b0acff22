// frame.rs — Input frames: luminance + motion vectors.
//
// The generator only needs two per-pixel queries from the renderer, so the
// input side is a small trait. `Frame` is the owned implementation used by
// tests, demos and the GPU upload path; a renderer that already keeps its
// buffers elsewhere can implement `FrameSource` directly.
//
// Coordinates passed to a FrameSource are always inside the frame: the
// sampler clamps before every call.

use crate::convert;
use crate::image::Image;

/// Read access to one rendered frame.
pub trait FrameSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Luminance at an in-frame pixel.
    fn luminance(&self, x: usize, y: usize) -> f32;

    /// Screen-space motion at an in-frame pixel, in pixels, pointing from
    /// the previous frame's position to the current one.
    fn motion(&self, x: usize, y: usize) -> [f32; 2];
}

/// Owned frame: a luminance plane plus an optional motion plane.
/// Without a motion plane every pixel reports zero motion.
#[derive(Clone, Debug)]
pub struct Frame {
    luminance: Image<f32>,
    motion: Option<Image<[f32; 2]>>,
}

impl Frame {
    /// Frame with zero motion everywhere.
    pub fn new(luminance: Image<f32>) -> Self {
        Frame { luminance, motion: None }
    }

    /// Frame with a per-pixel motion plane.
    ///
    /// # Panics
    /// Panics if the two planes differ in size.
    pub fn with_motion(luminance: Image<f32>, motion: Image<[f32; 2]>) -> Self {
        assert!(
            luminance.width() == motion.width() && luminance.height() == motion.height(),
            "motion plane {}×{} does not match luminance plane {}×{}",
            motion.width(),
            motion.height(),
            luminance.width(),
            luminance.height(),
        );
        Frame { luminance, motion: Some(motion) }
    }

    /// Frame with every pixel at the same luminance and no motion.
    pub fn flat(width: usize, height: usize, value: f32) -> Self {
        Frame::new(Image::filled(width, height, value))
    }

    /// Frame from interleaved RGBA8 color, reduced to luminance.
    pub fn from_rgba8(width: usize, height: usize, rgba: &[u8]) -> Self {
        Frame::new(convert::rgba8_to_luminance(width, height, rgba))
    }

    pub fn luminance_image(&self) -> &Image<f32> {
        &self.luminance
    }

    pub fn motion_image(&self) -> Option<&Image<[f32; 2]>> {
        self.motion.as_ref()
    }

    /// Motion plane packed row by row; zeros when the frame has none.
    pub fn packed_motion(&self) -> Vec<[f32; 2]> {
        match &self.motion {
            Some(m) => m.to_packed_vec(),
            None => vec![[0.0; 2]; self.luminance.width() * self.luminance.height()],
        }
    }
}

impl FrameSource for Frame {
    #[inline]
    fn width(&self) -> usize {
        self.luminance.width()
    }

    #[inline]
    fn height(&self) -> usize {
        self.luminance.height()
    }

    #[inline]
    fn luminance(&self, x: usize, y: usize) -> f32 {
        self.luminance.get(x, y)
    }

    #[inline]
    fn motion(&self, x: usize, y: usize) -> [f32; 2] {
        match &self.motion {
            Some(m) => m.get(x, y),
            None => [0.0, 0.0],
        }
    }
}
