//! Benchmark configuration, loadable from a JSON file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::DetectorKind;
use crate::error::{BenchError, ConfigFileError, Result};
use crate::models::RegionOfInterest;

/// Everything a harness run needs, passed in at construction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Root directory the image files are resolved against
    pub data_path: PathBuf,
    /// File name prefix, may contain sub-directories
    pub img_prefix: String,
    /// File name suffix including the extension
    pub img_file_type: String,
    /// Number of digits in the zero-padded frame number
    pub img_fill_width: usize,
    pub img_start_index: usize,
    pub img_end_index: usize,

    /// Frames held in memory at the same time
    pub buffer_capacity: usize,
    /// Detector names, processed in this order
    pub detectors: Vec<String>,

    pub roi: RegionOfInterest,
    /// Count only keypoints inside `roi`
    pub focus_on_roi: bool,
    /// Limit the keypoints annotated onto each frame
    pub max_keypoints: Option<usize>,

    pub output_path: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("."),
            img_prefix: "images/KITTI/2011_09_26/image_00/data/000000".to_string(),
            img_file_type: ".png".to_string(),
            img_fill_width: 4,
            img_start_index: 0,
            img_end_index: 9,

            buffer_capacity: 2,
            detectors: DetectorKind::ALL.iter().map(|k| k.name().to_string()).collect(),

            roi: RegionOfInterest::new(535, 180, 180, 150),
            focus_on_roi: true,
            max_keypoints: None,

            output_path: PathBuf::from("performance_results/KeyPoints_In_Frames.csv"),
        }
    }
}

fn config_file_error(path: &Path, source: impl Into<ConfigFileError>) -> BenchError {
    BenchError::ConfigFile {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

impl BenchConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| config_file_error(path, e))?;
        let config: Self = serde_json::from_str(&json).map_err(|e| config_file_error(path, e))?;
        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| config_file_error(path, e))?;
        fs::write(path, json).map_err(|e| config_file_error(path, e))?;
        log::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Resolve the detector names into identifiers, in configuration order
    pub fn detector_kinds(&self) -> Result<Vec<DetectorKind>> {
        self.detectors.iter().map(|name| name.parse()).collect()
    }

    pub fn frame_count(&self) -> usize {
        self.img_end_index
            .saturating_sub(self.img_start_index)
            .saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(BenchError::Config("buffer_capacity must be at least 1".into()));
        }
        if self.img_end_index < self.img_start_index {
            return Err(BenchError::Config(format!(
                "img_end_index {} is before img_start_index {}",
                self.img_end_index, self.img_start_index
            )));
        }
        if self.detectors.is_empty() {
            return Err(BenchError::Config("detector list is empty".into()));
        }
        let cells = (self.img_end_index - self.img_start_index)
            .checked_add(1)
            .and_then(|frames| frames.checked_mul(self.detectors.len()));
        if cells.is_none() {
            return Err(BenchError::Config(format!(
                "frame range {}..={} is too large",
                self.img_start_index, self.img_end_index
            )));
        }
        if !self.roi.fits_i32() {
            return Err(BenchError::Config(format!(
                "region of interest ({}, {}) {}x{} overflows the coordinate range",
                self.roi.x, self.roi.y, self.roi.width, self.roi.height
            )));
        }
        if self.focus_on_roi && self.roi.is_empty() {
            return Err(BenchError::Config(format!(
                "region of interest {}x{} has no area",
                self.roi.width, self.roi.height
            )));
        }
        if self.max_keypoints == Some(0) {
            return Err(BenchError::Config("max_keypoints must be at least 1".into()));
        }
        self.detector_kinds()?;
        Ok(())
    }

    /// Print the settings that shape the result table
    pub fn log_summary(&self) {
        log::info!(
            "Frames {}..={} from {}",
            self.img_start_index,
            self.img_end_index,
            self.data_path.join(&self.img_prefix).display()
        );
        log::info!("Detectors: {}", self.detectors.join(", "));
        if self.focus_on_roi {
            log::info!(
                "Region of interest: ({}, {}) {}x{}",
                self.roi.x,
                self.roi.y,
                self.roi.width,
                self.roi.height
            );
        }
        log::info!("Buffer capacity: {}", self.buffer_capacity);
    }
}
