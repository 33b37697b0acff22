// tests/test_output.rs — Consuming a generated VRS image: statistics,
// rate combiners and the debug overlay.

use vrsgen::image::Image;
use vrsgen::overlay::{render_overlay, to_argb, OverlayStyle};
use vrsgen::rate::{CODE_1X1, CODE_2X2};
use vrsgen::{Combiner, Frame, RateCombiners, ShadingRate, TileGrid, VrsConfig, VrsGenerator};

/// Left half flat, right half vertical stripes.
fn half_striped(w: usize, h: usize) -> Frame {
    Frame::new(Image::from_fn(w, h, |x, _| {
        if x < w / 2 {
            0.5
        } else {
            (x % 2) as f32
        }
    }))
}

fn generate(frame: &Frame, tile: u32) -> TileGrid {
    let lum = frame.luminance_image();
    let cfg = VrsConfig {
        variance_cutoff: 0.1,
        ..VrsConfig::for_resolution(lum.width() as u32, lum.height() as u32, tile)
    };
    VrsGenerator::new(cfg).unwrap().generate_grid(frame).unwrap()
}

#[test]
fn histogram_counts_every_tile() {
    let grid = generate(&half_striped(128, 64), 16);
    let hist = grid.histogram();
    assert_eq!(hist.total(), grid.cols() * grid.rows());
    assert_eq!(hist.invalid, 0);
    assert!(hist.count(ShadingRate::R2x2) > 0);
    assert!(hist.count(ShadingRate::R1x2) > 0);

    let text = hist.to_string();
    assert!(text.contains("2x2"));
    assert!(text.contains("1x2"));
}

#[test]
fn shading_cost_of_mixed_frame() {
    let grid = generate(&half_striped(128, 64), 16);
    // Columns: three flat tiles at 2x2, the seam tile at 1x1 (border
    // penalty), four striped tiles at 1x2.
    let expected = (3.0 * 0.25 + 1.0 + 4.0 * 0.5) / 8.0;
    assert!((grid.shading_cost() - expected).abs() < 1e-6);
    assert_eq!(grid.rate(3, 0), Some(ShadingRate::R1x1));

    let flat = generate(&Frame::flat(128, 64, 0.5), 16);
    assert!((flat.shading_cost() - 0.25).abs() < 1e-6);
}

#[test]
fn clear_resets_to_full_rate() {
    let mut grid = generate(&Frame::flat(64, 64, 0.5), 8);
    assert!(grid.as_bytes().iter().all(|&c| c == CODE_2X2));
    grid.clear();
    assert!(grid.as_bytes().iter().all(|&c| c == CODE_1X1));
    assert!((grid.shading_cost() - 1.0).abs() < 1e-6);
}

#[test]
fn combiners_cap_image_rate() {
    let grid = generate(&Frame::flat(64, 64, 0.5), 16);
    // A draw that wants at least full rate in x.
    let c = RateCombiners {
        base: ShadingRate::R1x2,
        primitive: Combiner::Passthrough,
        image: Combiner::Min,
        additional_rates: false,
    };
    let out = c.resolve_grid(&grid);
    assert!(out.as_bytes().iter().all(|&code| code == ShadingRate::R1x2.code()));

    let c = RateCombiners { image: Combiner::Max, ..c };
    let out = c.resolve_grid(&grid);
    assert!(out.as_bytes().iter().all(|&code| code == CODE_2X2));
}

#[test]
fn overlay_tints_by_rate() {
    let frame = half_striped(64, 32);
    let grid = generate(&frame, 16);
    let style = OverlayStyle { alpha: 1.0, grid_lines: false };
    let img = render_overlay(frame.luminance_image(), &grid, style);
    assert_eq!((img.width(), img.height()), (64, 32));

    // Left tile 2x2 (green), far-right tile 1x2 (yellow).
    assert_eq!(img.get(4, 4), [0, 255, 0, 255]);
    assert_eq!(img.get(60, 4), [255, 255, 0, 255]);

    let argb = to_argb(&img);
    assert_eq!(argb.len(), 64 * 32);
    assert_eq!(argb[4 * 64 + 4], 0x00FF00);
}
