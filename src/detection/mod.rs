pub mod akaze;
pub mod brisk;
pub mod fast;
pub mod filters;
pub mod harris;
pub mod orb;
pub mod shi_tomasi;
pub mod sift;

use image::GrayImage;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BenchError, Result};
use crate::models::Keypoint;

pub use akaze::{AkazeDetector, AkazeParams};
pub use brisk::{BriskDetector, BriskParams};
pub use fast::{FastDetector, FastParams};
pub use harris::{HarrisDetector, HarrisParams};
pub use orb::{OrbDetector, OrbParams};
pub use shi_tomasi::{ShiTomasiDetector, ShiTomasiParams};
pub use sift::{SiftDetector, SiftParams};

/// Closed set of detector variants the benchmark knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    ShiTomasi,
    Harris,
    Fast,
    Brisk,
    Orb,
    Akaze,
    Sift,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 7] = [
        DetectorKind::ShiTomasi,
        DetectorKind::Harris,
        DetectorKind::Fast,
        DetectorKind::Brisk,
        DetectorKind::Orb,
        DetectorKind::Akaze,
        DetectorKind::Sift,
    ];

    /// Name used in configuration files and the exported table
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::ShiTomasi => "SHITOMASI",
            DetectorKind::Harris => "HARRIS",
            DetectorKind::Fast => "FAST",
            DetectorKind::Brisk => "BRISK",
            DetectorKind::Orb => "ORB",
            DetectorKind::Akaze => "AKAZE",
            DetectorKind::Sift => "SIFT",
        }
    }

    /// Whether the built-in detector returns keypoints best first, so that
    /// truncation keeps the strongest ones. Only Shi-Tomasi guarantees this.
    pub fn sorted_by_quality(&self) -> bool {
        matches!(self, DetectorKind::ShiTomasi)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectorKind {
    type Err = BenchError;

    /// Case-insensitive match against [`DetectorKind::name`]
    fn from_str(s: &str) -> Result<Self> {
        DetectorKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BenchError::UnsupportedDetector(s.to_string()))
    }
}

/// Uniform contract every detection algorithm satisfies.
///
/// Given a grayscale image, return keypoints with at least position and
/// size populated. The order is detector-defined and downstream stages keep
/// it as is.
pub trait KeypointDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;
}

/// Built-in implementation for each variant, with default parameters
pub fn default_detector(kind: DetectorKind) -> Arc<dyn KeypointDetector> {
    match kind {
        DetectorKind::ShiTomasi => Arc::new(ShiTomasiDetector::default()),
        DetectorKind::Harris => Arc::new(HarrisDetector::default()),
        DetectorKind::Fast => Arc::new(FastDetector::default()),
        DetectorKind::Brisk => Arc::new(BriskDetector::default()),
        DetectorKind::Orb => Arc::new(OrbDetector::default()),
        DetectorKind::Akaze => Arc::new(AkazeDetector::default()),
        DetectorKind::Sift => Arc::new(SiftDetector::default()),
    }
}

/// Maps detector identifiers to their implementations.
///
/// Selection is a table lookup; a kind without an entry is reported as
/// unsupported rather than skipped.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: HashMap<DetectorKind, Arc<dyn KeypointDetector>>,
}

impl DetectorRegistry {
    /// Registry without any detectors
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in implementation of every variant
    pub fn with_defaults() -> Self {
        DetectorKind::ALL
            .into_iter()
            .fold(Self::new(), |registry, kind| {
                registry.register(kind, default_detector(kind))
            })
    }

    /// Add or replace the implementation for `kind`
    pub fn register(mut self, kind: DetectorKind, detector: Arc<dyn KeypointDetector>) -> Self {
        self.insert(kind, detector);
        self
    }

    pub fn insert(&mut self, kind: DetectorKind, detector: Arc<dyn KeypointDetector>) {
        self.detectors.insert(kind, detector);
    }

    pub fn supports(&self, kind: DetectorKind) -> bool {
        self.detectors.contains_key(&kind)
    }

    pub fn get(&self, kind: DetectorKind) -> Result<&Arc<dyn KeypointDetector>> {
        self.detectors
            .get(&kind)
            .ok_or_else(|| BenchError::UnsupportedDetector(kind.name().to_string()))
    }

    pub fn detect(&self, kind: DetectorKind, image: &GrayImage) -> Result<Vec<Keypoint>> {
        let detector = self.get(kind)?;
        let keypoints = detector.detect(image);
        log::trace!("{} returned {} keypoints", detector.name(), keypoints.len());
        Ok(keypoints)
    }

    /// Parse `identifier` and dispatch to the matching detector
    pub fn detect_by_name(&self, identifier: &str, image: &GrayImage) -> Result<Vec<Keypoint>> {
        let kind: DetectorKind = identifier.parse()?;
        self.detect(kind, image)
    }
}
