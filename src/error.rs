use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a benchmark run.
///
/// None of these are recovered locally: a partially filled result matrix
/// cannot be exported, so every variant ends the run.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("failed to load frame {}: {source}", path.display())]
    FrameLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{0} is not a supported detector type")]
    UnsupportedDetector(String),

    #[error("failed to export results to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: ConfigFileError,
    },

    #[error("result matrix defect: {0}")]
    Matrix(String),
}

/// Why a configuration file could not be read or written
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
