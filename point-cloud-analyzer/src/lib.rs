//! Offline analysis of scene point clouds into bounds metadata for physics
//! collision and navigation: classified voxel regions, density clusters,
//! floor planes, stair steps and an optional walkability grid.

pub mod analyzer;
pub mod bounds;
pub mod classify;
pub mod cluster;
pub mod collision;
pub mod config;
pub mod error;
pub mod floor;
pub mod manifest;
pub mod merge;
pub mod point;
pub mod reader;
pub mod stairs;
pub mod voxel;

pub use analyzer::SceneAnalyzer;
pub use bounds::PointCloudBounds;
pub use classify::{ClassifiedRegion, RegionLabel};
pub use config::{AnalysisConfig, CollisionConfig};
pub use error::{AnalysisError, Result};
pub use manifest::{BoundsManifest, ManifestGenerator};
pub use point::Point;
