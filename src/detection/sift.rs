//! SIFT keypoints: difference-of-Gaussian extrema.
//!
//! Lowe, "Distinctive Image Features from Scale-Invariant Keypoints" (2004).
//! Extrema are taken over 3x3x3 neighbourhoods, then filtered by contrast and
//! by the principal curvature ratio to drop edge responses. No sub-pixel
//! refinement is done.

use image::GrayImage;

use super::KeypointDetector;
use super::filters::{Plane, PlaneExt, downsample, gaussian_blur, to_plane, zip_map};
use crate::models::Keypoint;

/// Parameters of the [`SiftDetector`]
#[derive(Debug, Clone)]
pub struct SiftParams {
    /// Scales sampled per octave
    pub intervals: usize,
    pub sigma: f32,
    /// Blur already present in the input image
    pub assumed_blur: f32,
    pub contrast_threshold: f32,
    pub edge_threshold: f32,
    /// Pixels next to the border that are never reported
    pub border: usize,
}

impl Default for SiftParams {
    fn default() -> Self {
        Self {
            intervals: 3,
            sigma: 1.6,
            assumed_blur: 0.5,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            border: 5,
        }
    }
}

#[derive(Debug, Default)]
pub struct SiftDetector {
    pub params: SiftParams,
}

impl SiftDetector {
    pub fn new(params: SiftParams) -> Self {
        Self { params }
    }

    fn octave_count(&self, width: usize, height: usize) -> usize {
        let smallest = width.min(height) as f32;
        ((smallest.log2() - 3.0).floor() as isize).max(1) as usize
    }

    /// Scales sampled per octave, at least one
    pub fn intervals(&self) -> usize {
        self.params.intervals.max(1)
    }

    /// Gaussian images of one octave, `s + 3` of them
    fn gaussian_octave(&self, base: &Plane, s: usize) -> Vec<Plane> {
        let k = 2f32.powf(1.0 / s as f32);
        let mut images = vec![base.clone()];
        for i in 1..s + 3 {
            let previous = self.params.sigma * k.powi(i as i32 - 1);
            let total = previous * k;
            let sigma = (total * total - previous * previous).sqrt();
            let next = gaussian_blur(&images[i - 1], sigma);
            images.push(next);
        }
        images
    }

    /// Principal curvature test on a DoG layer
    fn passes_edge_test(&self, dog: &Plane, x: usize, y: usize) -> bool {
        let p = |dx: isize, dy: isize| dog.clamped(x as isize + dx, y as isize + dy);
        let c = p(0, 0);
        let dxx = p(1, 0) + p(-1, 0) - 2.0 * c;
        let dyy = p(0, 1) + p(0, -1) - 2.0 * c;
        let dxy = (p(1, 1) - p(1, -1) - p(-1, 1) + p(-1, -1)) * 0.25;
        let trace = dxx + dyy;
        let det = dxx * dyy - dxy * dxy;
        let r = self.params.edge_threshold;
        det > 0.0 && trace * trace * r < (r + 1.0) * (r + 1.0) * det
    }
}

/// Whether `v` is strictly the largest or strictly the smallest value of
/// its 3x3x3 neighbourhood
fn is_extremum(layers: [&Plane; 3], x: usize, y: usize, v: f32) -> bool {
    let (mut is_max, mut is_min) = (true, true);
    for (l, layer) in layers.iter().enumerate() {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if l == 1 && dx == 0 && dy == 0 {
                    continue;
                }
                let n = layer.at((x as isize + dx) as usize, (y as isize + dy) as usize);
                is_max &= v > n;
                is_min &= v < n;
                if !is_max && !is_min {
                    return false;
                }
            }
        }
    }
    true
}

impl KeypointDetector for SiftDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let params = &self.params;
        let border = params.border.max(1);
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w <= 2 * border || h <= 2 * border {
            return Vec::new();
        }

        let s = self.intervals();
        let prefilter = 0.5 * params.contrast_threshold / s as f32;
        let contrast = params.contrast_threshold / s as f32;

        let initial = (params.sigma.powi(2) - params.assumed_blur.powi(2)).max(0.01).sqrt();
        let mut base = gaussian_blur(&to_plane(image, 1.0 / 255.0), initial);

        let mut keypoints = Vec::new();
        for octave in 0..self.octave_count(w, h) {
            let (bw, bh) = (base.width() as usize, base.height() as usize);
            if bw <= 2 * border || bh <= 2 * border {
                break;
            }
            let gaussians = self.gaussian_octave(&base, s);
            let dogs: Vec<Plane> = gaussians
                .windows(2)
                .map(|pair| zip_map(&pair[1], &pair[0], |a, b| a - b))
                .collect();
            let step = 2f32.powi(octave as i32);

            for layer in 1..=s {
                let stack = [&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]];
                let dog = &dogs[layer];
                for y in border..bh - border {
                    for x in border..bw - border {
                        let v = dog.at(x, y);
                        if v.abs() <= prefilter || !is_extremum(stack, x, y, v) {
                            continue;
                        }
                        if v.abs() < contrast || !self.passes_edge_test(dog, x, y) {
                            continue;
                        }
                        let sigma = params.sigma * 2f32.powf(layer as f32 / s as f32);
                        keypoints.push(
                            Keypoint::new(x as f32 * step, y as f32 * step, 2.0 * sigma * step)
                                .with_response(v.abs())
                                .with_octave(octave as i32),
                        );
                    }
                }
            }

            // Next octave starts from the image with twice the base sigma
            base = downsample(&gaussians[s]);
        }
        keypoints
    }

    fn name(&self) -> &str {
        "SIFT"
    }
}
