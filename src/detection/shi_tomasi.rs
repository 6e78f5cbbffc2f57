//! Shi-Tomasi "good features to track".
//!
//! The response is the smaller eigenvalue of the structure tensor. Output is
//! sorted by descending response, which is what lets the keypoint limiter
//! keep the first N without looking at responses.

use image::GrayImage;

use super::KeypointDetector;
use super::filters::{Plane, PlaneExt, is_local_max, structure_tensor, zip_map};
use crate::models::Keypoint;

/// Parameters of the [`ShiTomasiDetector`]
#[derive(Debug, Clone)]
pub struct ShiTomasiParams {
    /// Side of the structure tensor window, also the keypoint size
    pub block_size: usize,
    /// Largest tolerated overlap between neighbouring corners, in [0, 1]
    pub max_overlap: f32,
    /// Minimum accepted response as a fraction of the strongest one
    pub quality_level: f32,
}

impl Default for ShiTomasiParams {
    fn default() -> Self {
        Self {
            block_size: 4,
            max_overlap: 0.0,
            quality_level: 0.01,
        }
    }
}

impl ShiTomasiParams {
    pub fn min_distance(&self) -> f32 {
        (1.0 - self.max_overlap) * self.block_size as f32
    }
}

#[derive(Debug, Default)]
pub struct ShiTomasiDetector {
    pub params: ShiTomasiParams,
}

impl ShiTomasiDetector {
    pub fn new(params: ShiTomasiParams) -> Self {
        Self { params }
    }

    /// Minimum eigenvalue of the structure tensor for every pixel
    pub fn min_eigenvalues(&self, image: &GrayImage) -> Plane {
        let (sxx, syy, sxy) = structure_tensor(image, self.params.block_size, 1.0 / 255.0);
        let half_trace = zip_map(&sxx, &syy, |a, b| (a + b) * 0.5);
        let half_diff = zip_map(&sxx, &syy, |a, b| (a - b) * 0.5);
        let radius = zip_map(&half_diff, &sxy, |d, c| (d * d + c * c).sqrt());
        zip_map(&half_trace, &radius, |t, r| t - r)
    }
}

impl KeypointDetector for ShiTomasiDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Vec::new();
        }

        let response = self.min_eigenvalues(image);
        let best = match response.min_max() {
            Some((_, best)) if best > 0.0 => best,
            _ => return Vec::new(),
        };
        let threshold = best * self.params.quality_level;

        let mut candidates: Vec<(usize, usize, f32)> = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let r = response.at(x, y);
                if r > threshold && is_local_max(&response, x, y, 1) {
                    candidates.push((x, y, r));
                }
            }
        }
        // Stable sort keeps raster order among equal responses
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let min_distance = self.params.min_distance();
        let max_corners = (w * h) / (min_distance.max(1.0) as usize);
        let size = self.params.block_size as f32;

        // Grid of accepted corners, cell side = min distance
        let cell = min_distance.max(1.0);
        let grid_w = (w as f32 / cell).ceil() as usize;
        let grid_h = (h as f32 / cell).ceil() as usize;
        let mut grid: Vec<Vec<(f32, f32)>> = vec![Vec::new(); grid_w * grid_h];

        let mut keypoints = Vec::new();
        for (x, y, r) in candidates {
            if keypoints.len() >= max_corners {
                break;
            }
            let (fx, fy) = (x as f32, y as f32);
            let gx = (fx / cell) as isize;
            let gy = (fy / cell) as isize;

            let too_close = min_distance > 0.0
                && (gy - 1..=gy + 1).any(|cy| {
                    (gx - 1..=gx + 1).any(|cx| {
                        if cx < 0 || cy < 0 || cx >= grid_w as isize || cy >= grid_h as isize {
                            return false;
                        }
                        grid[cy as usize * grid_w + cx as usize].iter().any(|&(ax, ay)| {
                            (ax - fx).powi(2) + (ay - fy).powi(2) < min_distance * min_distance
                        })
                    })
                });
            if too_close {
                continue;
            }

            grid[gy as usize * grid_w + gx as usize].push((fx, fy));
            keypoints.push(Keypoint::new(fx, fy, size).with_response(r));
        }
        keypoints
    }

    fn name(&self) -> &str {
        "Shi-Tomasi"
    }
}
