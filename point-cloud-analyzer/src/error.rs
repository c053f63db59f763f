/// Error types for point cloud analysis
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Fatal conditions of an analysis run.
///
/// Stages that receive too little data to produce a result (a sparse floor
/// band, an undersized cluster) skip that unit locally and never return one
/// of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Point cloud contains no valid points")]
    EmptyPointCloud,

    #[error("Invalid point cloud header: {0}")]
    InvalidHeader(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LAS error: {0}")]
    Las(#[from] las::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
