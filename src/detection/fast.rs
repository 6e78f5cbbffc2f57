//! FAST segment-test corners.
//! See <https://en.wikipedia.org/wiki/Features_from_accelerated_segment_test>

use image::GrayImage;
use imageproc::corners::{Corner, corners_fast9};
use imageproc::suppress::local_maxima;

use super::KeypointDetector;
use crate::models::Keypoint;

/// Diameter reported for FAST keypoints (the Bresenham circle of radius 3)
pub const FAST_KEYPOINT_SIZE: f32 = 7.0;

/// Parameters of the [`FastDetector`]
#[derive(Debug, Clone)]
pub struct FastParams {
    /// Intensity difference between the centre and the circle pixels
    pub threshold: u8,
    pub nonmax_suppression: bool,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            nonmax_suppression: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct FastDetector {
    pub params: FastParams,
}

impl FastDetector {
    pub fn new(params: FastParams) -> Self {
        Self { params }
    }
}

/// FAST-9 corners in raster order, optionally reduced to 3x3 score maxima
pub fn fast_corners(image: &GrayImage, threshold: u8, nonmax_suppression: bool) -> Vec<Corner> {
    let corners = corners_fast9(image, threshold);
    if nonmax_suppression {
        local_maxima(&corners, 1)
    } else {
        corners
    }
}

impl KeypointDetector for FastDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        fast_corners(image, self.params.threshold, self.params.nonmax_suppression)
            .into_iter()
            .map(|c| Keypoint::new(c.x as f32, c.y as f32, FAST_KEYPOINT_SIZE).with_response(c.score))
            .collect()
    }

    fn name(&self) -> &str {
        "FAST"
    }
}
