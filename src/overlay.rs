// overlay.rs — Debug visualization of a VRS image.
//
// Each pixel is the frame's luminance tinted by its tile's rate color:
//
//   out = (1 - alpha) * luma + alpha * color(rate)
//
// Optional tile borders are drawn darkened so individual tiles stay
// readable at 8-pixel tile sizes.

use crate::image::Image;
use crate::rate::ShadingRate;
use crate::tile_grid::TileGrid;

/// How the overlay is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Blend weight of the rate color, 0 = frame only, 1 = colors only.
    pub alpha: f32,
    /// Darken the first row and column of every tile.
    pub grid_lines: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle { alpha: 0.4, grid_lines: true }
    }
}

const GRID_LINE_SCALE: f32 = 0.5;

/// Render `grid` over `luminance` as RGBA8.
///
/// Pixels whose tile holds an unknown code are drawn without tint.
///
/// # Panics
/// Panics if `luminance` does not match the grid's frame size.
pub fn render_overlay(luminance: &Image<f32>, grid: &TileGrid, style: OverlayStyle) -> Image<[u8; 4]> {
    let (fw, fh) = grid.frame_size();
    assert!(
        luminance.width() == fw as usize && luminance.height() == fh as usize,
        "overlay frame {}x{} does not match grid frame {fw}x{fh}",
        luminance.width(),
        luminance.height(),
    );
    let alpha = style.alpha.clamp(0.0, 1.0);
    let tile = grid.tile_size() as usize;

    Image::from_fn(luminance.width(), luminance.height(), |x, y| {
        let l = luminance.get(x, y).clamp(0.0, 1.0);
        let mut rgb = match ShadingRate::from_code(grid.get(x / tile, y / tile)) {
            Some(rate) => rate.overlay_color().map(|c| (1.0 - alpha) * l + alpha * c),
            None => [l; 3],
        };
        if style.grid_lines && (x % tile == 0 || y % tile == 0) {
            rgb = rgb.map(|c| c * GRID_LINE_SCALE);
        }
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        [r, g, b, 255]
    })
}

/// Pack RGBA8 into 0x00RRGGBB words, the layout minifb windows expect.
pub fn to_argb(image: &Image<[u8; 4]>) -> Vec<u32> {
    let mut out = Vec::with_capacity(image.width() * image.height());
    for y in 0..image.height() {
        out.extend(
            image
                .row(y)
                .iter()
                .map(|&[r, g, b, _]| (r as u32) << 16 | (g as u32) << 8 | b as u32),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::{CODE_2X2, CODE_4X4};
    use crate::tile_grid::RateSink;

    #[test]
    fn test_alpha_zero_is_grayscale() {
        let lum = Image::filled(16, 16, 0.5f32);
        let grid = TileGrid::new(16, 16, 8);
        let img = render_overlay(&lum, &grid, OverlayStyle { alpha: 0.0, grid_lines: false });
        assert!(img.pixels().all(|(_, _, p)| p == [128, 128, 128, 255]));
    }

    #[test]
    fn test_alpha_one_is_rate_color() {
        let lum = Image::filled(16, 8, 0.0f32);
        let mut grid = TileGrid::new(16, 8, 8);
        grid.write(1, 0, CODE_2X2);
        let img = render_overlay(&lum, &grid, OverlayStyle { alpha: 1.0, grid_lines: false });
        assert_eq!(img.get(3, 3), [255, 0, 0, 255]); // 1x1 red
        assert_eq!(img.get(12, 3), [0, 255, 0, 255]); // 2x2 green
    }

    #[test]
    fn test_grid_lines_darken_tile_edges() {
        let lum = Image::filled(16, 16, 1.0f32);
        let mut grid = TileGrid::new(16, 16, 8);
        for ty in 0..2 {
            for tx in 0..2 {
                grid.write(tx, ty, CODE_4X4);
            }
        }
        let img = render_overlay(&lum, &grid, OverlayStyle { alpha: 0.0, grid_lines: true });
        assert_eq!(img.get(8, 3), [128, 128, 128, 255]);
        assert_eq!(img.get(3, 0), [128, 128, 128, 255]);
        assert_eq!(img.get(3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_partial_edge_tiles() {
        let lum = Image::filled(12, 10, 0.25f32);
        let grid = TileGrid::new(12, 10, 8);
        let img = render_overlay(&lum, &grid, OverlayStyle::default());
        assert_eq!((img.width(), img.height()), (12, 10));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_size_mismatch_panics() {
        let lum = Image::filled(8, 8, 0.0f32);
        let grid = TileGrid::new(16, 16, 8);
        render_overlay(&lum, &grid, OverlayStyle::default());
    }

    #[test]
    fn test_to_argb() {
        let img = Image::from_vec(2, 1, vec![[0x12, 0x34, 0x56, 0xFF], [0xFF, 0, 0, 0]]);
        assert_eq!(to_argb(&img), vec![0x123456, 0xFF0000]);
    }
}
