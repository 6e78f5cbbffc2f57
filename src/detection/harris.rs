//! Harris corner detector.
//!
//! Response `R = det(M) - k * trace(M)^2` of the box-windowed structure
//! tensor, min-max normalised to [0, 255] and thresholded. Accepted
//! pixels compete with overlapping keypoints; the stronger one stays.

use image::GrayImage;

use super::KeypointDetector;
use super::filters::{Plane, PlaneExt, structure_tensor, zip_map};
use crate::models::Keypoint;

/// Parameters of the [`HarrisDetector`]
#[derive(Debug, Clone)]
pub struct HarrisParams {
    /// Side of the structure tensor window
    pub block_size: usize,
    /// Sobel aperture, also sets the keypoint size (`2 * aperture`)
    pub aperture_size: usize,
    /// Minimum normalised response, in [0, 255]
    pub min_response: f32,
    pub k: f32,
    /// Largest tolerated overlap between two keypoints, 0 means none
    pub max_overlap: f32,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            block_size: 2,
            aperture_size: 3,
            min_response: 100.0,
            k: 0.04,
            max_overlap: 0.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct HarrisDetector {
    pub params: HarrisParams,
}

impl HarrisDetector {
    pub fn new(params: HarrisParams) -> Self {
        Self { params }
    }

    /// Raw Harris response for every pixel
    pub fn corner_response(&self, image: &GrayImage) -> Plane {
        let (sxx, syy, sxy) = structure_tensor(image, self.params.block_size, 1.0);
        let det = zip_map(&zip_map(&sxx, &syy, |a, b| a * b), &sxy, |ab, c| ab - c * c);
        let trace = zip_map(&sxx, &syy, |a, b| a + b);
        zip_map(&det, &trace, |d, t| d - self.params.k * t * t)
    }
}

/// Fraction of the smaller circle's area covered by the other circle
fn overlap(a: &Keypoint, b: &Keypoint) -> f32 {
    let (r1, r2) = (a.size / 2.0, b.size / 2.0);
    let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    if d >= r1 + r2 {
        return 0.0;
    }
    let (small, large) = if r1 < r2 { (r1, r2) } else { (r2, r1) };
    if d <= large - small {
        return 1.0;
    }
    // Lens area of two intersecting circles
    let part1 = small * small * ((d * d + small * small - large * large) / (2.0 * d * small)).acos();
    let part2 = large * large * ((d * d + large * large - small * small) / (2.0 * d * large)).acos();
    let part3 = 0.5
        * ((-d + small + large) * (d + small - large) * (d - small + large) * (d + small + large))
            .max(0.0)
            .sqrt();
    let lens = part1 + part2 - part3;
    lens / (std::f32::consts::PI * small * small)
}

impl KeypointDetector for HarrisDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let response = self.corner_response(image);
        let (lo, hi) = match response.min_max() {
            Some((lo, hi)) if hi > lo => (lo, hi),
            _ => return Vec::new(),
        };
        let scale = 255.0 / (hi - lo);
        let size = 2.0 * self.params.aperture_size as f32;

        let mut keypoints: Vec<Keypoint> = Vec::new();
        for (x, y, pixel) in response.enumerate_pixels() {
            let r = (pixel[0] - lo) * scale;
            if r <= self.params.min_response {
                continue;
            }
            let candidate = Keypoint::new(x as f32, y as f32, size).with_response(r);

            let mut overlapped = false;
            for existing in keypoints.iter_mut() {
                if overlap(&candidate, existing) > self.params.max_overlap {
                    overlapped = true;
                    if candidate.response > existing.response {
                        *existing = candidate;
                        break;
                    }
                }
            }
            if !overlapped {
                keypoints.push(candidate);
            }
        }
        keypoints
    }

    fn name(&self) -> &str {
        "Harris"
    }
}
