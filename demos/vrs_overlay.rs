// demos/vrs_overlay.rs
//
// Live view of the VRS image over an animated synthetic scene. The scene
// scrolls, so motion vectors are non-zero and the motion factor visibly
// coarsens the moving parts.
//
// Usage:
//   cargo run --example vrs_overlay --release
//   cargo run --example vrs_overlay --release -- settings.toml
//
// Controls:
//   Space  — pause/resume
//   1/2/3  — tile size 8/16/32
//   A      — toggle additional rates (2x4, 4x2, 4x4)
//   M      — toggle motion vectors
//   +/-    — raise/lower the variance cutoff
//   O      — toggle overlay
//   Q/Esc  — quit

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::env;
use std::time::Instant;
use tracing::info;

use vrsgen::image::Image;
use vrsgen::overlay::{render_overlay, to_argb, OverlayStyle};
use vrsgen::{Frame, VrsConfig, VrsGenerator, VrsSettings};

const WIDTH: usize = 1280;
const HEIGHT: usize = 720;

fn main() {
    tracing_subscriber::fmt::init();

    let settings = match env::args().nth(1) {
        Some(path) => VrsSettings::load(&path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
        None => VrsSettings::default(),
    };

    let mut config = VrsConfig {
        variance_cutoff: settings.variance_cutoff,
        motion_factor: settings.motion_factor,
        additional_rates: settings.allow_additional_rates,
        use_motion_vectors: settings.use_motion_vectors,
        ..VrsConfig::for_resolution(WIDTH as u32, HEIGHT as u32, 16)
    };
    let mut generator = VrsGenerator::new(config).expect("invalid settings");

    let mut window = Window::new(
        "vrsgen — VRS overlay",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )
    .expect("failed to create window");
    window.set_target_fps(60);

    let mut t = 0usize;
    let mut paused = false;
    let mut show_overlay = true;
    let mut fb = vec![0u32; WIDTH * HEIGHT];

    println!("\nControls: Space=pause, 1/2/3=tile, A=additional, M=motion, +/-=cutoff, O=overlay, Q/Esc=quit\n");

    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        let mut changed = false;
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            paused = !paused;
        }
        if window.is_key_pressed(Key::O, KeyRepeat::No) {
            show_overlay = !show_overlay;
        }
        for (key, tile) in [(Key::Key1, 8), (Key::Key2, 16), (Key::Key3, 32)] {
            if window.is_key_pressed(key, KeyRepeat::No) {
                config.tile_size = tile;
                changed = true;
            }
        }
        if window.is_key_pressed(Key::A, KeyRepeat::No) {
            config.additional_rates = !config.additional_rates;
            changed = true;
        }
        if window.is_key_pressed(Key::M, KeyRepeat::No) {
            config.use_motion_vectors = !config.use_motion_vectors;
            changed = true;
        }
        if window.is_key_pressed(Key::Equal, KeyRepeat::Yes) {
            config.variance_cutoff = (config.variance_cutoff + 0.005).min(1.0);
            changed = true;
        }
        if window.is_key_pressed(Key::Minus, KeyRepeat::Yes) {
            config.variance_cutoff = (config.variance_cutoff - 0.005).max(0.0);
            changed = true;
        }
        if changed {
            if let Err(e) = generator.reconfigure(config) {
                eprintln!("Error: {e}");
            }
            info!(
                tile = config.tile_size,
                additional = config.additional_rates,
                motion = config.use_motion_vectors,
                cutoff = config.variance_cutoff,
                "reconfigured"
            );
        }

        let frame = make_frame(WIDTH, HEIGHT, t);
        let start = Instant::now();
        let grid = generator.generate_grid(&frame).expect("frame matches config");
        let elapsed = start.elapsed();

        let style = OverlayStyle {
            alpha: if show_overlay { 0.4 } else { 0.0 },
            grid_lines: show_overlay,
        };
        let rgba = render_overlay(frame.luminance_image(), &grid, style);
        fb.copy_from_slice(&to_argb(&rgba));

        window.set_title(&format!(
            "vrsgen — tile {} | {} | cutoff {:.3} | cost {:.1}% | {:.2} ms",
            config.tile_size,
            if config.additional_rates { "additional" } else { "base" },
            config.variance_cutoff,
            grid.shading_cost() * 100.0,
            elapsed.as_secs_f64() * 1e3,
        ));
        window.update_with_buffer(&fb, WIDTH, HEIGHT).unwrap();

        if !paused {
            t += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic scene
// ---------------------------------------------------------------------------

/// Static sky on top, scrolling textured ground below, and a bouncing
/// checkered box. Motion vectors describe the ground scroll and the box.
fn make_frame(w: usize, h: usize, t: usize) -> Frame {
    let horizon = h / 3;
    let scroll = (t * 4) % w;
    let (bx, by) = box_position(w, h, t);
    let (pbx, pby) = box_position(w, h, t.saturating_sub(1));
    let box_mv = [bx as f32 - pbx as f32, by as f32 - pby as f32];

    let in_box = |x: usize, y: usize| x >= bx && x < bx + 160 && y >= by && y < by + 160;

    let lum = Image::from_fn(w, h, |x, y| {
        if in_box(x, y) {
            if ((x - bx) / 20 + (y - by) / 20) % 2 == 0 { 0.9 } else { 0.1 }
        } else if y < horizon {
            0.6 + 0.2 * y as f32 / horizon as f32
        } else {
            let u = (x + scroll) % w;
            let stripe = ((u / 8) % 2) as f32 * 0.15;
            let grain = (((u * 7) ^ (y * 13)) & 15) as f32 / 200.0;
            0.25 + stripe + grain
        }
    });
    let mv = Image::from_fn(w, h, |x, y| {
        if in_box(x, y) {
            box_mv
        } else if y < horizon {
            [0.0, 0.0]
        } else {
            [-4.0, 0.0]
        }
    });
    Frame::with_motion(lum, mv)
}

fn box_position(w: usize, h: usize, t: usize) -> (usize, usize) {
    let period_x = 2 * (w - 160);
    let period_y = 2 * (h - 160);
    let px = (t * 6) % period_x;
    let py = (t * 3) % period_y;
    let x = if px < w - 160 { px } else { period_x - px };
    let y = if py < h - 160 { py } else { period_y - py };
    (x, y)
}
