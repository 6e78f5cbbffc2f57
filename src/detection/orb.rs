//! ORB keypoints: oriented FAST on a scale pyramid, ranked by Harris response.

use image::GrayImage;

use super::KeypointDetector;
use super::fast::fast_corners;
use super::filters::{Plane, PlaneExt, shrink, structure_tensor, to_plane};
use crate::models::Keypoint;

/// Parameters of the [`OrbDetector`]
#[derive(Debug, Clone)]
pub struct OrbParams {
    /// Keypoints kept over all levels
    pub max_features: usize,
    pub scale_factor: f32,
    pub levels: usize,
    /// Border in which no keypoints are reported, per level
    pub edge_threshold: u32,
    pub fast_threshold: u8,
    /// Size of the patch used for orientation, also the base keypoint size
    pub patch_size: u32,
    pub harris_block: usize,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            max_features: 500,
            scale_factor: 1.2,
            levels: 8,
            edge_threshold: 31,
            fast_threshold: 20,
            patch_size: 31,
            harris_block: 7,
        }
    }
}

impl OrbParams {
    /// Share of `max_features` per level, decreasing geometrically with scale
    pub fn features_per_level(&self) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor;
        let levels = self.levels.max(1);
        let mut desired = self.max_features as f32 * (1.0 - factor)
            / (1.0 - factor.powi(levels as i32));

        let mut counts = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels - 1 {
            let n = (desired.round() as usize).min(self.max_features - assigned);
            counts.push(n);
            assigned += n;
            desired *= factor;
        }
        counts.push(self.max_features - assigned);
        counts
    }
}

#[derive(Debug, Default)]
pub struct OrbDetector {
    pub params: OrbParams,
}

impl OrbDetector {
    pub fn new(params: OrbParams) -> Self {
        Self { params }
    }
}

/// Orientation (degrees in [0, 360)) of the intensity centroid in a disc
fn intensity_centroid_angle(image: &Plane, x: usize, y: usize, radius: isize) -> f32 {
    let (mut m01, mut m10) = (0.0f32, 0.0f32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let v = image.clamped(x as isize + dx, y as isize + dy);
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    let angle = m01.atan2(m10).to_degrees();
    if angle < 0.0 { angle + 360.0 } else { angle }
}

impl KeypointDetector for OrbDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let params = &self.params;
        let per_level = params.features_per_level();
        let border = params.edge_threshold;
        let radius = (params.patch_size / 2) as isize;

        let mut keypoints = Vec::new();
        for (level, &wanted) in per_level.iter().enumerate() {
            let scale = params.scale_factor.powi(level as i32);
            let img = shrink(image, scale);
            if img.width() <= 2 * border || img.height() <= 2 * border {
                break;
            }

            let plane = to_plane(&img, 1.0 / 255.0);
            let (sxx, syy, sxy) = structure_tensor(&img, params.harris_block, 1.0 / 255.0);

            let mut ranked: Vec<(u32, u32, f32)> = fast_corners(&img, params.fast_threshold, true)
                .into_iter()
                .filter(|c| {
                    c.x >= border
                        && c.y >= border
                        && c.x < img.width() - border
                        && c.y < img.height() - border
                })
                .map(|c| {
                    let (x, y) = (c.x as usize, c.y as usize);
                    let (a, b, d) = (sxx.at(x, y), syy.at(x, y), sxy.at(x, y));
                    let response = a * b - d * d - 0.04 * (a + b) * (a + b);
                    (c.x, c.y, response)
                })
                .collect();
            ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
            ranked.truncate(wanted);

            for (x, y, response) in ranked {
                let angle = intensity_centroid_angle(&plane, x as usize, y as usize, radius);
                keypoints.push(
                    Keypoint::new(x as f32 * scale, y as f32 * scale, params.patch_size as f32 * scale)
                        .with_response(response)
                        .with_angle(angle)
                        .with_octave(level as i32),
                );
            }
        }
        keypoints
    }

    fn name(&self) -> &str {
        "ORB"
    }
}
