// convert.rs — Color → luminance and pixel-format conversions.
//
// The variance analysis runs on a single luminance channel. Renderers hand
// us color in a few layouts:
//   RGBA8 interleaved   (swapchain readback, PNG screenshots)
//   RGB f32 planes      (HDR intermediate targets)
//
// Luma uses ITU-R BT.601 coefficients: Y = 0.299*R + 0.587*G + 0.114*B,
// with 8-bit channels normalized to [0, 1] first so the variance cutoff
// means the same thing for every input format.

use crate::image::Image;

pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// BT.601 luma of one linear RGB triple.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

/// Interleaved RGBA8 → normalized luminance image. Alpha is ignored.
///
/// # Panics
/// Panics if `rgba.len() != width * height * 4`.
pub fn rgba8_to_luminance(width: usize, height: usize, rgba: &[u8]) -> Image<f32> {
    assert_eq!(
        rgba.len(),
        width * height * 4,
        "RGBA buffer length ({}) must equal width * height * 4 ({})",
        rgba.len(),
        width * height * 4,
    );
    let data = rgba
        .chunks_exact(4)
        .map(|px| {
            luma(
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            )
        })
        .collect();
    Image::from_vec(width, height, data)
}

/// Interleaved RGB8 → normalized luminance image.
///
/// # Panics
/// Panics if `rgb.len() != width * height * 3`.
pub fn rgb8_to_luminance(width: usize, height: usize, rgb: &[u8]) -> Image<f32> {
    assert_eq!(
        rgb.len(),
        width * height * 3,
        "RGB buffer length ({}) must equal width * height * 3 ({})",
        rgb.len(),
        width * height * 3,
    );
    let data = rgb
        .chunks_exact(3)
        .map(|px| {
            luma(
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            )
        })
        .collect();
    Image::from_vec(width, height, data)
}

/// Luminance from three separate f32 channel planes.
pub fn rgb_planes_to_luminance(r: &Image<f32>, g: &Image<f32>, b: &Image<f32>) -> Image<f32> {
    assert_eq!(r.width(), g.width());
    assert_eq!(r.width(), b.width());
    assert_eq!(r.height(), g.height());
    assert_eq!(r.height(), b.height());

    Image::from_fn(r.width(), r.height(), |x, y| luma(r.get(x, y), g.get(x, y), b.get(x, y)))
}

/// Convert an Image<u8> to Image<f32> with normalized values in [0.0, 1.0].
pub fn u8_to_f32_normalized(src: &Image<u8>) -> Image<f32> {
    Image::from_fn(src.width(), src.height(), |x, y| src.get(x, y) as f32 / 255.0)
}

/// Convert an Image<f32> (assumed [0.0, 1.0]) to Image<u8>, clamped and rounded.
pub fn f32_normalized_to_u8(src: &Image<f32>) -> Image<u8> {
    Image::from_fn(src.width(), src.height(), |x, y| {
        (src.get(x, y) * 255.0).clamp(0.0, 255.0).round() as u8
    })
}
