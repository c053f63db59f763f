/// Bounds manifest assembly and output for downstream physics and navigation consumers.
use crate::bounds::{PointCloudBounds, Vector3};
use crate::classify::{ClassifiedRegion, RegionLabel};
use crate::cluster::Cluster;
use crate::collision::CollisionMap;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::floor::FloorPlane;
use crate::stairs::StairRegion;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run parameters recorded alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub source: String,
    pub point_count: usize,
    pub voxel_size: f64,
    pub min_points_per_voxel: usize,
    pub cluster_count: usize,
    pub min_cluster_points: usize,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
}

impl RunMetadata {
    pub fn new(source: &str, point_count: usize, config: &AnalysisConfig) -> Self {
        Self {
            source: source.to_string(),
            point_count,
            voxel_size: config.voxel_size,
            min_points_per_voxel: config.min_points_per_voxel,
            cluster_count: config.cluster_count,
            min_cluster_points: config.min_cluster_points,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Complete output record of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsManifest {
    pub metadata: RunMetadata,
    pub bounds: PointCloudBounds,
    pub center: Vector3,
    pub dimensions: Vector3,
    pub voxels: Vec<ClassifiedRegion>,
    pub clusters: Vec<Cluster>,
    pub floors: Vec<FloorPlane>,
    pub stairs: Vec<StairRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collision: Option<CollisionMap>,
}

impl BoundsManifest {
    pub fn count_label(&self, label: RegionLabel) -> usize {
        self.voxels.iter().filter(|r| r.label == label).count()
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

/// Writes manifests to disk.
pub struct ManifestGenerator {
    output_path: PathBuf,
    pretty: bool,
}

impl ManifestGenerator {
    pub fn new(output_path: &Path, pretty: bool) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            pretty,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Serialise the manifest and write it, creating parent directories.
    pub fn write(&self, manifest: &BoundsManifest) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.output_path, manifest.to_json(self.pretty)?)?;

        info!("Generated bounds manifest: {}", self.output_path.display());
        self.log_manifest_summary(manifest);
        Ok(())
    }

    fn log_manifest_summary(&self, manifest: &BoundsManifest) {
        info!(
            "Points: {}, bounds: ({:.2}, {:.2}, {:.2}) to ({:.2}, {:.2}, {:.2})",
            manifest.metadata.point_count,
            manifest.bounds.min_x,
            manifest.bounds.min_y,
            manifest.bounds.min_z,
            manifest.bounds.max_x,
            manifest.bounds.max_y,
            manifest.bounds.max_z
        );
        info!(
            "Regions: {} ({} floor, {} wall, {} object), clusters: {}, floors: {}, stairs: {}",
            manifest.voxels.len(),
            manifest.count_label(RegionLabel::Floor),
            manifest.count_label(RegionLabel::Wall),
            manifest.count_label(RegionLabel::Object),
            manifest.clusters.len(),
            manifest.floors.len(),
            manifest.stairs.len()
        );
        if let Some(collision) = &manifest.collision {
            info!(
                "Collision grid: {}x{} with {} cells",
                collision.metadata.cols,
                collision.metadata.rows,
                collision.cells.len()
            );
        }
    }
}
