use image::{GrayImage, Luma};
use kpbench::{BenchConfig, Keypoint, KeypointDetector, RegionOfInterest};
use std::collections::HashMap;
use std::path::Path;

/// Region used by the scenario tests
pub const TEST_ROI: RegionOfInterest = RegionOfInterest::new(535, 180, 180, 150);

/// Bright squares on a dark background: plenty of corners and blobs
pub fn squares_image(width: u32, height: u32) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([20u8]));
    let side = (width.min(height) / 5).max(4);
    let origins = [
        (width / 8, height / 8),
        (width / 2, height / 8),
        (width / 8, height / 2),
        (width / 2, height / 2),
    ];
    for (ox, oy) in origins {
        for y in oy..(oy + side).min(height) {
            for x in ox..(ox + side).min(width) {
                img.put_pixel(x, y, Luma([220u8]));
            }
        }
    }
    img
}

/// Write `count` frames named `frame_0000.png`, `frame_0001.png`, ...
/// Each frame is filled with its own index so stub detectors can tell them
/// apart.
pub fn write_uniform_sequence(dir: &Path, count: usize) {
    for i in 0..count {
        let img = GrayImage::from_pixel(16, 16, Luma([i as u8]));
        img.save(dir.join(format!("frame_{:04}.png", i)))
            .expect("Failed to save test frame");
    }
}

/// Write `count` copies of [`squares_image`] with the same naming scheme
pub fn write_squares_sequence(dir: &Path, count: usize, width: u32, height: u32) {
    let img = squares_image(width, height);
    for i in 0..count {
        img.save(dir.join(format!("frame_{:04}.png", i)))
            .expect("Failed to save test frame");
    }
}

/// Configuration reading `frame_NNNN.png` from `dir`
pub fn test_config(dir: &Path, frames: usize, detectors: &[&str]) -> BenchConfig {
    BenchConfig {
        data_path: dir.to_path_buf(),
        img_prefix: "frame_".to_string(),
        img_file_type: ".png".to_string(),
        img_fill_width: 4,
        img_start_index: 0,
        img_end_index: frames - 1,
        buffer_capacity: 2,
        detectors: detectors.iter().map(|d| d.to_string()).collect(),
        roi: TEST_ROI,
        focus_on_roi: true,
        max_keypoints: None,
        output_path: dir.join("out").join("results.csv"),
    }
}

pub fn kp(x: f32, y: f32) -> Keypoint {
    Keypoint::new(x, y, 7.0)
}

/// Returns a fixed keypoint list chosen by the intensity of pixel (0, 0)
pub struct ScriptedDetector {
    pub by_intensity: HashMap<u8, Vec<Keypoint>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<(u8, Vec<Keypoint>)>) -> Self {
        Self {
            by_intensity: script.into_iter().collect(),
        }
    }
}

impl KeypointDetector for ScriptedDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let key = image.get_pixel(0, 0)[0];
        self.by_intensity.get(&key).cloned().unwrap_or_default()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Split a comma-delimited file into rows of fields
pub fn read_table(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .expect("Failed to read exported table")
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}
