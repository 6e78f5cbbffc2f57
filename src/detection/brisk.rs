//! BRISK-style multi-scale FAST detection.
//!
//! FAST-9 runs on each octave of a half-resolution pyramid. A corner is kept
//! when it beats the scores of the neighbouring octaves at the same location,
//! which approximates BRISK's scale-space maximum search.

use image::{GrayImage, Luma};

use super::KeypointDetector;
use super::fast::fast_corners;
use super::filters::{Plane, PlaneExt, shrink};
use crate::models::Keypoint;

/// Keypoint diameter on the base octave
const BRISK_BASE_SIZE: f32 = 12.0;

/// Parameters of the [`BriskDetector`]
#[derive(Debug, Clone)]
pub struct BriskParams {
    pub threshold: u8,
    pub octaves: usize,
}

impl Default for BriskParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            octaves: 4,
        }
    }
}

#[derive(Debug, Default)]
pub struct BriskDetector {
    pub params: BriskParams,
}

impl BriskDetector {
    pub fn new(params: BriskParams) -> Self {
        Self { params }
    }
}

struct Octave {
    scale: f32,
    corners: Vec<(u32, u32, f32)>,
    scores: Plane,
}

impl Octave {
    /// Best score within one octave pixel of a base-image location
    fn score_near(&self, x: f32, y: f32) -> f32 {
        let cx = (x / self.scale).round() as isize;
        let cy = (y / self.scale).round() as isize;
        let mut best = 0.0f32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx >= 0
                    && ny >= 0
                    && (nx as u32) < self.scores.width()
                    && (ny as u32) < self.scores.height()
                {
                    best = best.max(self.scores.at(nx as usize, ny as usize));
                }
            }
        }
        best
    }
}

impl KeypointDetector for BriskDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let mut octaves: Vec<Octave> = Vec::new();
        let mut level = image.clone();
        for o in 0..self.params.octaves {
            if o > 0 {
                if level.width() < 16 || level.height() < 16 {
                    break;
                }
                level = shrink(&level, 2.0);
            }
            let corners: Vec<(u32, u32, f32)> = fast_corners(&level, self.params.threshold, true)
                .into_iter()
                .map(|c| (c.x, c.y, c.score))
                .collect();
            let mut scores = Plane::new(level.width(), level.height());
            for &(x, y, s) in &corners {
                scores.put_pixel(x, y, Luma([s]));
            }
            octaves.push(Octave {
                scale: 2f32.powi(o as i32),
                corners,
                scores,
            });
        }

        let mut keypoints = Vec::new();
        for (o, octave) in octaves.iter().enumerate() {
            for &(x, y, score) in &octave.corners {
                let bx = x as f32 * octave.scale;
                let by = y as f32 * octave.scale;

                let beaten = [o.checked_sub(1), Some(o + 1)]
                    .into_iter()
                    .flatten()
                    .filter_map(|n| octaves.get(n))
                    .any(|neighbour| neighbour.score_near(bx, by) > score);
                if beaten {
                    continue;
                }

                keypoints.push(
                    Keypoint::new(bx, by, BRISK_BASE_SIZE * octave.scale)
                        .with_response(score)
                        .with_octave(o as i32),
                );
            }
        }
        keypoints
    }

    fn name(&self) -> &str {
        "BRISK"
    }
}
