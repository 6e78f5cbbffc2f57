#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from kpbench for tests
pub use kpbench::{
    BenchConfig, BenchError, DetectorKind, DetectorRegistry, Frame, FrameBuffer, Harness,
    HarnessState, Keypoint, RegionOfInterest, ResultMatrix,
};
