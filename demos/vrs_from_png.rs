// demos/vrs_from_png.rs
//
// Generate a VRS image for a single rendered frame and write the debug
// overlay next to it.
//
// Usage:
//   cargo run --example vrs_from_png --release -- frame.png
//   cargo run --example vrs_from_png --release -- frame.png 8 settings.toml
//
// Writes vis_output/<name>_vrs.png and prints the rate histogram. Without
// motion vectors the frame is treated as static.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use vrsgen::overlay::{render_overlay, OverlayStyle};
use vrsgen::{Frame, VrsConfig, VrsGenerator, VrsSettings};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <frame.png> [tile_size] [settings.toml]", args[0]);
        std::process::exit(1);
    }
    let input = PathBuf::from(&args[1]);
    let tile: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(16);
    let settings = match args.get(3) {
        Some(path) => VrsSettings::load(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
        None => VrsSettings::default(),
    };

    let frame = load_frame(&input);
    let (w, h) = (frame.luminance_image().width(), frame.luminance_image().height());
    println!("Frame: {} ({w}×{h})", input.display());

    let config = VrsConfig {
        variance_cutoff: settings.variance_cutoff,
        motion_factor: settings.motion_factor,
        additional_rates: settings.allow_additional_rates,
        use_motion_vectors: settings.use_motion_vectors,
        ..VrsConfig::for_resolution(w as u32, h as u32, tile)
    };
    let generator = match VrsGenerator::new(config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let grid = generator.generate_grid(&frame).expect("frame matches config");
    info!(elapsed_ms = start.elapsed().as_secs_f64() * 1e3, "generated VRS image");

    let (cols, rows) = grid.dims();
    println!("VRS image: {cols}×{rows} tiles of {tile}px");
    print!("{}", grid.histogram());
    println!("Shading cost: {:.1}% of full rate", grid.shading_cost() * 100.0);

    let overlay = render_overlay(frame.luminance_image(), &grid, OverlayStyle::default());
    let out_dir = Path::new("vis_output");
    fs::create_dir_all(out_dir).expect("failed to create vis_output/");
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let out_path = out_dir.join(format!("{stem}_vrs.png"));

    let raw: Vec<u8> = overlay.to_packed_vec().into_iter().flatten().collect();
    image::RgbaImage::from_raw(w as u32, h as u32, raw)
        .expect("overlay buffer size")
        .save(&out_path)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", out_path.display()));
    println!("Saved: {}", out_path.display());
}

fn load_frame(path: &Path) -> Frame {
    let rgba = image::open(path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    Frame::from_rgba8(w as usize, h as usize, rgba.as_raw())
}
