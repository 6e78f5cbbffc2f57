use std::path::PathBuf;

use crate::buffer::FrameBuffer;
use crate::config::BenchConfig;
use crate::detection::{DetectorKind, DetectorRegistry};
use crate::error::{BenchError, Result};
use crate::models::RegionOfInterest;
use crate::region::{filter_keypoints, limit_keypoints};
use crate::results::{self, ResultMatrix};
use crate::source::FrameSource;

/// Progress of a benchmark run.
///
/// Detectors are visited in configuration order and, for each of them, every
/// frame in ascending index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// About to start the detector at position `next`
    ForEachDetector { next: usize },
    /// About to process `frame` with the detector at position `detector`
    ForEachFrame { detector: usize, frame: usize },
    /// Every cell of the result matrix has been written
    Done,
}

/// Runs every configured detector over every frame and counts the keypoints
/// that fall inside the region of interest.
pub struct Harness {
    config: BenchConfig,
    detectors: Vec<DetectorKind>,
    source: FrameSource,
    registry: DetectorRegistry,
    buffer: FrameBuffer,
    matrix: ResultMatrix,
    state: HarnessState,
}

impl Harness {
    /// Harness using the built-in detector implementations
    pub fn new(config: BenchConfig) -> Result<Self> {
        Self::with_registry(config, DetectorRegistry::with_defaults())
    }

    /// Harness dispatching to the implementations in `registry`.
    ///
    /// Fails before any frame is processed if the configuration is invalid
    /// or names a detector the registry has no implementation for.
    pub fn with_registry(config: BenchConfig, registry: DetectorRegistry) -> Result<Self> {
        config.validate()?;
        let detectors = config.detector_kinds()?;
        if let Some(missing) = detectors.iter().find(|kind| !registry.supports(**kind)) {
            return Err(BenchError::UnsupportedDetector(missing.name().to_string()));
        }

        let source = FrameSource::from_config(&config);
        let matrix = ResultMatrix::new(detectors.clone(), source.len());
        let buffer = FrameBuffer::new(config.buffer_capacity);

        Ok(Self {
            config,
            detectors,
            source,
            registry,
            buffer,
            matrix,
            state: HarnessState::ForEachDetector { next: 0 },
        })
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn matrix(&self) -> &ResultMatrix {
        &self.matrix
    }

    fn roi(&self) -> Option<RegionOfInterest> {
        self.config.focus_on_roi.then_some(self.config.roi)
    }

    /// Advance by one transition and return the new state
    pub fn step(&mut self) -> Result<HarnessState> {
        let state = self.state;
        self.state = match state {
            HarnessState::Done => HarnessState::Done,
            HarnessState::ForEachDetector { next } if next >= self.detectors.len() => {
                log::info!("All {} detectors done", self.detectors.len());
                HarnessState::Done
            }
            HarnessState::ForEachDetector { next } => {
                log::info!(
                    "Detector {} ({}/{})",
                    self.detectors[next],
                    next + 1,
                    self.detectors.len()
                );
                // Each detector pass restarts the sequence from the first frame
                self.buffer.clear();
                if self.source.is_empty() {
                    HarnessState::ForEachDetector { next: next + 1 }
                } else {
                    HarnessState::ForEachFrame {
                        detector: next,
                        frame: 0,
                    }
                }
            }
            HarnessState::ForEachFrame { detector, frame } => {
                self.process_frame(detector, frame)?;
                if frame + 1 < self.source.len() {
                    HarnessState::ForEachFrame {
                        detector,
                        frame: frame + 1,
                    }
                } else {
                    HarnessState::ForEachDetector { next: detector + 1 }
                }
            }
        };
        Ok(self.state)
    }

    /// Load, buffer, detect, filter, count and annotate a single frame
    fn process_frame(&mut self, detector: usize, frame: usize) -> Result<()> {
        let kind = self.detectors[detector];
        let roi = self.roi();

        let loaded = self.source.load(frame)?;
        let current = self.buffer.push(loaded);

        let detected = self.registry.detect(kind, &current.image)?;
        let total = detected.len();
        let keypoints = match roi {
            Some(roi) => filter_keypoints(&detected, &roi),
            None => detected,
        };

        self.matrix.record(detector, frame, keypoints.len())?;
        match keypoints.first() {
            Some(first) => log::debug!(
                "{} frame{}: {} keypoints ({} detected), first size {:.2}",
                kind,
                frame,
                keypoints.len(),
                total,
                first.size
            ),
            None => log::debug!("{} frame{}: 0 keypoints ({} detected)", kind, frame, total),
        }

        current.keypoints = match self.config.max_keypoints {
            Some(max) if keypoints.len() > max => {
                log::warn!(
                    "{} frame{}: keypoints limited from {} to {}",
                    kind,
                    frame,
                    keypoints.len(),
                    max
                );
                limit_keypoints(&keypoints, max, kind.sorted_by_quality())
            }
            _ => keypoints,
        };
        Ok(())
    }

    /// Drive the state machine to completion and hand out the full matrix
    pub fn run(mut self) -> Result<ResultMatrix> {
        while self.step()? != HarnessState::Done {}

        if !self.matrix.is_complete() {
            return Err(BenchError::Matrix(format!(
                "{} of {} cells written",
                self.matrix.populated(),
                self.detectors.len() * self.source.len()
            )));
        }
        Ok(self.matrix)
    }

    /// Run, then write the table to the configured output path
    pub fn run_and_export(self) -> Result<(ResultMatrix, PathBuf)> {
        let output = self.config.output_path.clone();
        let matrix = self.run()?;
        let path = results::export(&matrix, &output)?;
        Ok((matrix, path))
    }
}
