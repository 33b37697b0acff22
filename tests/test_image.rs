// tests/test_image.rs — Integration tests for Image<T> and conversions.
//
// Runs with `cargo test --test test_image`. Integration tests only see the
// crate's public API.

use vrsgen::convert;
use vrsgen::image::Image;

// ===== Construction & basic access =====

#[test]
fn image_new_zero_initialized() {
    let img: Image<u8> = Image::new(100, 50);
    assert_eq!(img.width(), 100);
    assert_eq!(img.height(), 50);
    assert_eq!(img.get(0, 0), 0);
    assert_eq!(img.get(99, 49), 0);
}

#[test]
fn image_set_get_checkerboard() {
    let mut img: Image<f32> = Image::new(10, 10);
    for y in 0..10 {
        for x in 0..10 {
            img.set(x, y, ((x + y) % 2) as f32);
        }
    }
    for y in 0..10 {
        for x in 0..10 {
            assert_eq!(img.get(x, y), ((x + y) % 2) as f32, "mismatch at ({x}, {y})");
        }
    }
}

#[test]
fn image_from_vec_layout() {
    //  [10, 20, 30]
    //  [40, 50, 60]
    let img = Image::from_vec(3, 2, vec![10u8, 20, 30, 40, 50, 60]);
    assert_eq!(img.get(0, 0), 10);
    assert_eq!(img.get(2, 0), 30);
    assert_eq!(img.get(0, 1), 40);
    assert_eq!(img.get(2, 1), 60);
}

#[test]
fn motion_plane_pixels() {
    let img = Image::from_fn(3, 2, |x, y| [x as f32, -(y as f32)]);
    assert_eq!(img.get(2, 1), [2.0, -1.0]);
    assert_eq!(img[(1, 0)], [1.0, 0.0]);
}

// ===== Stride =====

#[test]
fn stride_does_not_affect_pixel_access() {
    let mut img: Image<u8> = Image::new_with_stride(3, 2, 8);
    img.set(0, 0, 1);
    img.set(2, 0, 2);
    img.set(0, 1, 3);
    img.set(2, 1, 4);

    assert_eq!(img.get(2, 1), 4);
    assert_eq!(img.row(0), &[1, 0, 2]);
    // Packed copy drops the padding.
    assert_eq!(img.to_packed_vec(), vec![1, 0, 2, 3, 0, 4]);
}

#[test]
fn pixels_iterator_skips_padding() {
    let mut img: Image<u8> = Image::new_with_stride(2, 2, 4);
    img.set(0, 0, 1);
    img.set(1, 0, 2);
    img.set(0, 1, 3);
    img.set(1, 1, 4);

    let pixels: Vec<_> = img.pixels().collect();
    assert_eq!(pixels, vec![(0, 0, 1), (1, 0, 2), (0, 1, 3), (1, 1, 4)]);
}

#[test]
#[should_panic]
fn out_of_bounds_get_panics() {
    let img: Image<u8> = Image::new(4, 4);
    img.get(4, 0);
}

// ===== Conversions =====

#[test]
fn normalized_roundtrip_preserves_extremes() {
    let data = vec![0u8, 1, 127, 128, 254, 255];
    let img = Image::from_vec(6, 1, data.clone());
    let back = convert::f32_normalized_to_u8(&convert::u8_to_f32_normalized(&img));
    for (i, &d) in data.iter().enumerate() {
        assert_eq!(back.get(i, 0), d, "roundtrip mismatch at pixel {i}");
    }
}

#[test]
fn rgba_luminance_is_normalized() {
    let rgba = [255u8, 255, 255, 255, 0, 0, 0, 255, 128, 128, 128, 255];
    let lum = convert::rgba8_to_luminance(3, 1, &rgba);
    assert!((lum.get(0, 0) - 1.0).abs() < 1e-6);
    assert_eq!(lum.get(1, 0), 0.0);
    assert!((lum.get(2, 0) - 128.0 / 255.0).abs() < 1e-5);
}

// ===== Clone & edge cases =====

#[test]
fn clone_is_independent() {
    let mut img: Image<u8> = Image::new(4, 4);
    img.set(0, 0, 42);
    let img2 = img.clone();
    img.set(0, 0, 99);
    assert_eq!(img2.get(0, 0), 42);
    assert_eq!(img.get(0, 0), 99);
}

#[test]
fn empty_dimension_image() {
    let img: Image<u8> = Image::new(0, 0);
    assert!(img.is_empty());
    assert_eq!(img.pixels().count(), 0);
}
