//! Floating point planes and the filters the detectors share.
//!
//! Smoothing and gradients come from `imageproc`, which pads by continuity
//! (replicating edge pixels). Hand-written stencils below clamp the same way.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::filter::{gaussian_blur_f32, separable_filter_equal};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Single channel f32 image
pub type Plane = Image<Luma<f32>>;

/// Scalar access to a [`Plane`] by `usize` coordinates
pub trait PlaneExt {
    fn at(&self, x: usize, y: usize) -> f32;

    /// Pixel at (x, y) with coordinates clamped into the plane
    fn clamped(&self, x: isize, y: isize) -> f32;

    /// Smallest and largest value, `None` for an empty plane
    fn min_max(&self) -> Option<(f32, f32)>;
}

impl PlaneExt for Plane {
    fn at(&self, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[0]
    }

    fn clamped(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width() as isize - 1);
        let y = y.clamp(0, self.height() as isize - 1);
        self.at(x as usize, y as usize)
    }

    fn min_max(&self) -> Option<(f32, f32)> {
        self.pixels().map(|p| p[0]).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Convert a grayscale image, multiplying each intensity by `scale`
pub fn to_plane(image: &GrayImage, scale: f32) -> Plane {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[0] as f32 * scale])
    })
}

/// Element-wise combination of two planes of equal size
pub fn zip_map(a: &Plane, b: &Plane, f: impl Fn(f32, f32) -> f32) -> Plane {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    ImageBuffer::from_fn(a.width(), a.height(), |x, y| {
        Luma([f(a.get_pixel(x, y)[0], b.get_pixel(x, y)[0])])
    })
}

/// Gaussian smoothing; a non-positive sigma leaves the plane unchanged
pub fn gaussian_blur(src: &Plane, sigma: f32) -> Plane {
    if sigma <= 0.0 || !sigma.is_finite() || src.width() == 0 || src.height() == 0 {
        return src.clone();
    }
    gaussian_blur_f32(src, sigma)
}

/// Sum over a `block` x `block` window anchored at `block / 2`
pub fn box_sum(src: &Plane, block: usize) -> Plane {
    if block == 0 {
        return Plane::new(src.width(), src.height());
    }
    separable_filter_equal(src, &vec![1.0f32; block])
}

/// 3x3 Sobel derivatives (dx, dy) of a grayscale image, scaled by `scale`
pub fn sobel(image: &GrayImage, scale: f32) -> (Plane, Plane) {
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);
    let to_f32 = |g: &Image<Luma<i16>>| {
        ImageBuffer::from_fn(g.width(), g.height(), |x, y| {
            Luma([g.get_pixel(x, y)[0] as f32 * scale])
        })
    };
    (to_f32(&gx), to_f32(&gy))
}

/// Box-windowed structure tensor entries (Sxx, Syy, Sxy) on intensities
/// multiplied by `scale`
pub fn structure_tensor(image: &GrayImage, block: usize, scale: f32) -> (Plane, Plane, Plane) {
    let (gx, gy) = sobel(image, scale);
    let sxx = box_sum(&zip_map(&gx, &gx, |a, b| a * b), block);
    let syy = box_sum(&zip_map(&gy, &gy, |a, b| a * b), block);
    let sxy = box_sum(&zip_map(&gx, &gy, |a, b| a * b), block);
    (sxx, syy, sxy)
}

/// Determinant of the scale-normalised Hessian, `sigma` in plane pixels
pub fn hessian_determinant(src: &Plane, sigma: f32) -> Plane {
    let norm = sigma.powi(4);
    ImageBuffer::from_fn(src.width(), src.height(), |x, y| {
        let p = |dx: isize, dy: isize| src.clamped(x as isize + dx, y as isize + dy);
        let c = p(0, 0);
        let lxx = p(1, 0) - 2.0 * c + p(-1, 0);
        let lyy = p(0, 1) - 2.0 * c + p(0, -1);
        let lxy = (p(1, 1) - p(1, -1) - p(-1, 1) + p(-1, -1)) * 0.25;
        Luma([(lxx * lyy - lxy * lxy) * norm])
    })
}

/// Every second pixel in both directions
pub fn downsample(src: &Plane) -> Plane {
    let w = src.width().div_ceil(2);
    let h = src.height().div_ceil(2);
    ImageBuffer::from_fn(w, h, |x, y| *src.get_pixel(x * 2, y * 2))
}

/// Resize a grayscale image by `1 / factor`, keeping at least one pixel
pub fn shrink(image: &GrayImage, factor: f32) -> GrayImage {
    let w = ((image.width() as f32 / factor).round() as u32).max(1);
    let h = ((image.height() as f32 / factor).round() as u32).max(1);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Triangle)
}

/// Whether `plane[x, y]` wins its `(2r+1)^2` neighbourhood.
///
/// Plateaus are resolved in favour of the first pixel in raster order.
pub fn is_local_max(plane: &Plane, x: usize, y: usize, radius: usize) -> bool {
    let v = plane.at(x, y);
    let r = radius as isize;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 || nx >= plane.width() as isize || ny >= plane.height() as isize {
                continue;
            }
            let n = plane.at(nx as usize, ny as usize);
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if n > v || (earlier && n == v) {
                return false;
            }
        }
    }
    true
}
