/// Scene analyzer orchestrating the point cloud analysis pipeline.
use crate::bounds::{PointCloudBounds, Vector3};
use crate::classify::classify_regions;
use crate::cluster::cluster_points;
use crate::collision::build_collision_map;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::floor::detect_floor_planes;
use crate::manifest::{BoundsManifest, RunMetadata};
use crate::merge::merge_regions;
use crate::point::Point;
use crate::reader::{read_points, read_points_from_path};
use crate::stairs::detect_stairs;
use crate::voxel::build_voxel_grid;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

/// Pipeline stages reported on the progress bar.
const STAGES: u64 = 7;

/// Runs every analysis stage in order over one point cloud.
/// Each stage consumes the complete output of the previous one.
pub struct SceneAnalyzer {
    config: AnalysisConfig,
    show_progress: bool,
}

impl SceneAnalyzer {
    /// Create an analyzer after validating its configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    /// Display a stage progress bar on stderr.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Read and analyse a point cloud file.
    pub fn analyze_file(&self, path: &Path) -> Result<BoundsManifest> {
        info!("Analysing {}", path.display());
        let points = read_points_from_path(path)?;
        self.analyze_points(&points, &path.display().to_string())
    }

    /// Analyse an in-memory point cloud file.
    pub fn analyze_bytes(&self, bytes: &[u8], source: &str) -> Result<BoundsManifest> {
        let points = read_points(bytes)?;
        self.analyze_points(&points, source)
    }

    /// Run all stages over already parsed points.
    pub fn analyze_points(&self, points: &[Point], source: &str) -> Result<BoundsManifest> {
        let bounds = PointCloudBounds::from_points(points).ok_or(AnalysisError::EmptyPointCloud)?;
        self.log_bounds(points.len(), &bounds);

        let pb = self.progress_bar();
        let config = &self.config;

        pb.set_message("Building voxel grid");
        let cells = build_voxel_grid(
            points,
            config.voxel_size,
            config.min_points_per_voxel,
            &bounds,
        );
        pb.inc(1);

        pb.set_message("Merging regions");
        let regions = merge_regions(&cells);
        pb.inc(1);

        pb.set_message("Classifying regions");
        let voxels = classify_regions(&regions);
        pb.inc(1);

        pb.set_message("Clustering");
        let clusters = cluster_points(
            points,
            config.cluster_count,
            config.min_cluster_points,
            config.cluster_seed,
        );
        pb.inc(1);

        pb.set_message("Detecting floor planes");
        let floors = detect_floor_planes(points, &bounds);
        pb.inc(1);

        pb.set_message("Detecting stairs");
        let stairs = detect_stairs(&voxels);
        pb.inc(1);

        let collision = if config.collision.enabled {
            pb.set_message("Building collision grid");
            Some(build_collision_map(points, &bounds, &config.collision))
        } else {
            None
        };
        pb.inc(1);
        pb.finish_with_message("Analysis complete");

        let (width, height, depth) = bounds.dimensions();
        Ok(BoundsManifest {
            metadata: RunMetadata::new(source, points.len(), config),
            bounds,
            center: Vector3(bounds.center()),
            dimensions: Vector3(Point::new(width, height, depth)),
            voxels,
            clusters,
            floors,
            stairs,
            collision,
        })
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(STAGES);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} stages ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
        }
        pb
    }

    /// Log coordinate bounds for validation.
    fn log_bounds(&self, point_count: usize, bounds: &PointCloudBounds) {
        let (width, height, depth) = bounds.dimensions();
        info!("Loaded {} points", point_count);
        info!("  X: {:.2} to {:.2}", bounds.min_x, bounds.max_x);
        info!("  Y: {:.2} to {:.2} (elevation)", bounds.min_y, bounds.max_y);
        info!("  Z: {:.2} to {:.2}", bounds.min_z, bounds.max_z);
        info!("  Size: {:.2} x {:.2} x {:.2} m", width, height, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let config = AnalysisConfig {
            voxel_size: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            SceneAnalyzer::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_points_are_fatal() {
        let analyzer = SceneAnalyzer::new(AnalysisConfig::default()).unwrap();
        assert!(matches!(
            analyzer.analyze_points(&[], "empty"),
            Err(AnalysisError::EmptyPointCloud)
        ));
    }

    #[test]
    fn small_scene_end_to_end() {
        let config = AnalysisConfig {
            voxel_size: 1.0,
            min_points_per_voxel: 2,
            cluster_count: 2,
            min_cluster_points: 1,
            ..Default::default()
        };
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.1, 0.0, 0.0),
            Point::new(0.0, 0.0, 0.1),
            Point::new(5.0, 0.0, 5.0),
        ];
        let manifest = SceneAnalyzer::new(config)
            .unwrap()
            .analyze_points(&points, "scene.ply")
            .unwrap();

        assert_eq!(manifest.metadata.point_count, 4);
        assert_eq!(manifest.voxels.len(), 1);
        let region = &manifest.voxels[0];
        assert_eq!(region.point_count, 3);
        assert_eq!(region.voxel_count, 1);
        assert_eq!(
            region.bounds,
            PointCloudBounds::from_min_max(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0))
        );
        assert!(manifest.floors.is_empty());
        assert!(manifest.stairs.is_empty());
        assert!(manifest.collision.is_none());
        assert_eq!(manifest.center, Vector3(Point::new(2.5, 0.0, 2.5)));
    }
}
