//! Integration tests for the shared float-plane filters.

use image::{GrayImage, ImageBuffer, Luma};
use kpbench::detection::filters::{
    Plane, PlaneExt, box_sum, downsample, gaussian_blur, hessian_determinant, sobel,
    structure_tensor, to_plane, zip_map,
};

fn constant_plane(width: u32, height: u32, value: f32) -> Plane {
    ImageBuffer::from_pixel(width, height, Luma([value]))
}

/// Left half dark, right half bright
fn vertical_edge() -> GrayImage {
    GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 0u8 } else { 200u8 }]))
}

#[test]
fn test_to_plane_scales_intensities() {
    let img = GrayImage::from_pixel(3, 2, Luma([255u8]));
    let plane = to_plane(&img, 1.0 / 255.0);
    assert_eq!(plane.dimensions(), (3, 2));
    assert!((plane.at(2, 1) - 1.0).abs() < 1e-6);
    assert_eq!(plane.min_max().map(|(lo, hi)| hi - lo), Some(0.0));
}

#[test]
fn test_clamped_replicates_edges() {
    let plane = ImageBuffer::from_fn(4, 3, |x, y| Luma([(y * 4 + x) as f32]));
    assert_eq!(plane.clamped(-5, -5), 0.0);
    assert_eq!(plane.clamped(10, 0), 3.0);
    assert_eq!(plane.clamped(1, 99), 9.0);
    assert_eq!(plane.min_max(), Some((0.0, 11.0)));
    assert_eq!(Plane::new(0, 0).min_max(), None);
}

#[test]
fn test_gaussian_blur_keeps_constant_plane() {
    let plane = constant_plane(16, 12, 0.5);
    let blurred = gaussian_blur(&plane, 1.6);
    for p in blurred.pixels() {
        assert!((p[0] - 0.5).abs() < 1e-5);
    }

    // Non-positive sigma is a no-op
    assert_eq!(gaussian_blur(&plane, 0.0), plane);
}

#[test]
fn test_gaussian_blur_spreads_impulse() {
    let mut plane = constant_plane(15, 15, 0.0);
    plane.put_pixel(7, 7, Luma([1.0]));
    let blurred = gaussian_blur(&plane, 1.0);

    let centre = blurred.at(7, 7);
    assert!(centre < 1.0 && centre > 0.0);
    assert!(blurred.at(8, 7) > 0.0);
    assert!((blurred.at(8, 7) - blurred.at(6, 7)).abs() < 1e-6);
    assert!(blurred.at(8, 7) < centre);
}

#[test]
fn test_box_sum_counts_window() {
    let ones = constant_plane(8, 8, 1.0);
    let sums = box_sum(&ones, 3);
    // Edge padding replicates, so every window sums to 9
    assert!((sums.at(4, 4) - 9.0).abs() < 1e-6);
    assert!((sums.at(0, 0) - 9.0).abs() < 1e-6);
    assert_eq!(box_sum(&ones, 0).min_max(), Some((0.0, 0.0)));
}

#[test]
fn test_sobel_responds_to_vertical_edge() {
    let (gx, gy) = sobel(&vertical_edge(), 1.0);
    assert!(gx.at(10, 10).abs() > 0.0);
    assert_eq!(gx.at(3, 10), 0.0);
    assert_eq!(gy.at(10, 10), 0.0);
}

#[test]
fn test_structure_tensor_on_edge_is_rank_one() {
    let (sxx, syy, sxy) = structure_tensor(&vertical_edge(), 3, 1.0 / 255.0);
    assert!(sxx.at(10, 10) > 0.0);
    assert_eq!(syy.at(10, 10), 0.0);
    assert_eq!(sxy.at(10, 10), 0.0);

    let det = zip_map(&zip_map(&sxx, &syy, |a, b| a * b), &sxy, |ab, c| ab - c * c);
    assert_eq!(det.at(10, 10), 0.0);
}

#[test]
fn test_hessian_determinant_peaks_on_blob() {
    let mut plane = constant_plane(21, 21, 0.0);
    plane.put_pixel(10, 10, Luma([1.0]));
    let smoothed = gaussian_blur(&plane, 2.0);
    let response = hessian_determinant(&smoothed, 2.0);

    assert!(response.at(10, 10) > 0.0);
    assert!(response.at(10, 10) > response.at(14, 10));
    assert_eq!(hessian_determinant(&constant_plane(5, 5, 0.3), 1.0).min_max(), Some((0.0, 0.0)));
}

#[test]
fn test_downsample_takes_even_pixels() {
    let plane = ImageBuffer::from_fn(5, 3, |x, y| Luma([(y * 5 + x) as f32]));
    let half = downsample(&plane);
    assert_eq!(half.dimensions(), (3, 2));
    assert_eq!(half.at(1, 1), 12.0);
    assert_eq!(half.at(2, 0), 4.0);
}
