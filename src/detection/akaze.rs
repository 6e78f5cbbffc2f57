//! AKAZE-style blob detection.
//!
//! Scale-normalised Hessian determinant maxima over an octave/sublevel scale
//! space. The nonlinear diffusion of the original detector is replaced by
//! Gaussian smoothing; responses and thresholds are on [0, 1] intensities.

use image::GrayImage;

use super::KeypointDetector;
use super::filters::{
    Plane, PlaneExt, downsample, gaussian_blur, hessian_determinant, is_local_max, to_plane,
};
use crate::models::Keypoint;

/// Parameters of the [`AkazeDetector`]
#[derive(Debug, Clone)]
pub struct AkazeParams {
    pub octaves: usize,
    pub sublevels: usize,
    /// Minimum Hessian determinant response
    pub threshold: f32,
    /// Scale of the first sublevel, in pixels
    pub base_sigma: f32,
    /// Ratio between keypoint size and sigma
    pub size_factor: f32,
}

impl Default for AkazeParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            sublevels: 4,
            threshold: 0.001,
            base_sigma: 1.6,
            size_factor: 3.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct AkazeDetector {
    pub params: AkazeParams,
}

impl AkazeDetector {
    pub fn new(params: AkazeParams) -> Self {
        Self { params }
    }
}

/// Response maps of one octave, with the sigma each was computed at
struct Evolution {
    responses: Vec<Plane>,
    sigmas: Vec<f32>,
}

impl KeypointDetector for AkazeDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let params = &self.params;
        let sublevels = params.sublevels.max(1);
        let mut keypoints = Vec::new();
        let mut base = to_plane(image, 1.0 / 255.0);

        for octave in 0..params.octaves {
            if octave > 0 {
                if base.width() < 16 || base.height() < 16 {
                    break;
                }
                base = downsample(&base);
            }
            let step = 2f32.powi(octave as i32);

            let mut evolution = Evolution {
                responses: Vec::with_capacity(sublevels),
                sigmas: Vec::with_capacity(sublevels),
            };
            for s in 0..sublevels {
                // Sigma relative to this octave's pixel grid
                let sigma = params.base_sigma * 2f32.powf(s as f32 / sublevels as f32);
                let smoothed = gaussian_blur(&base, sigma);
                evolution.responses.push(hessian_determinant(&smoothed, sigma));
                evolution.sigmas.push(sigma);
            }

            for (s, response) in evolution.responses.iter().enumerate() {
                let (w, h) = (response.width() as usize, response.height() as usize);
                for y in 1..h.saturating_sub(1) {
                    for x in 1..w.saturating_sub(1) {
                        let r = response.at(x, y);
                        if r <= params.threshold || !is_local_max(response, x, y, 1) {
                            continue;
                        }
                        let beaten = [s.checked_sub(1), Some(s + 1)]
                            .into_iter()
                            .flatten()
                            .filter_map(|n| evolution.responses.get(n))
                            .any(|neighbour| {
                                (-1isize..=1).any(|dy| {
                                    (-1isize..=1).any(|dx| {
                                        neighbour.clamped(x as isize + dx, y as isize + dy) >= r
                                    })
                                })
                            });
                        if beaten {
                            continue;
                        }

                        let sigma = evolution.sigmas[s] * step;
                        keypoints.push(
                            Keypoint::new(x as f32 * step, y as f32 * step, params.size_factor * sigma)
                                .with_response(r)
                                .with_octave(octave as i32),
                        );
                    }
                }
            }
        }
        keypoints
    }

    fn name(&self) -> &str {
        "AKAZE"
    }
}
