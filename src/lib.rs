pub mod buffer;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod region;
pub mod results;
pub mod source;

pub use buffer::FrameBuffer;
pub use config::BenchConfig;
pub use detection::{DetectorKind, DetectorRegistry, KeypointDetector};
pub use error::{BenchError, ConfigFileError, Result};
pub use models::{Frame, Keypoint, RegionOfInterest};
pub use pipeline::{Harness, HarnessState};
pub use region::{filter_keypoints, limit_keypoints};
pub use results::{ResultMatrix, TableWriter, export};
pub use source::FrameSource;
