use image::GrayImage;
use serde::{Deserialize, Serialize};

/// A detected salient image location.
///
/// Only `x`, `y` and `size` are required by the benchmark. The remaining
/// attributes are filled in by detectors that compute them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood, in pixels
    pub size: f32,
    /// Detector response (strength). Higher is better.
    pub response: f32,
    /// Orientation in degrees, -1 when not computed
    pub angle: f32,
    /// Scale-space octave the keypoint was found in
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            response: 0.0,
            angle: -1.0,
            octave: 0,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_octave(mut self, octave: i32) -> Self {
        self.octave = octave;
        self
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Axis-aligned rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl RegionOfInterest {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// `x + width`, saturating at `i32::MAX`
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// `y + height`, saturating at `i32::MAX`
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the far edges can be computed without overflowing `i32`
    pub fn fits_i32(&self) -> bool {
        self.x.checked_add(self.width).is_some() && self.y.checked_add(self.height).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Closed containment: points on any edge are inside, including the far
    /// edges at `right()` and `bottom()`.
    ///
    /// This differs from a half-open rectangle (as in OpenCV's
    /// `Rect::contains`), which would reject points lying exactly on the
    /// right or bottom edge.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        !self.is_empty()
            && x >= self.x as f32
            && x <= self.right() as f32
            && y >= self.y as f32
            && y <= self.bottom() as f32
    }
}

/// One decoded grayscale frame and the keypoints annotated onto it
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: GrayImage,
    pub keypoints: Vec<Keypoint>,
    /// Position within the run, starting at 0
    pub index: usize,
    /// Number embedded in the file name
    pub file_index: usize,
}

impl Frame {
    pub fn new(image: GrayImage, index: usize, file_index: usize) -> Self {
        Self {
            image,
            keypoints: Vec::new(),
            index,
            file_index,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
