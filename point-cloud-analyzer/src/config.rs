/// Analysis parameters, loadable from TOML and overridable from the CLI
use crate::error::{AnalysisError, Result};
use constants::analysis::{
    COLLISION_ANKLE_HEIGHT, COLLISION_GRID_SIZE, COLLISION_PLAYER_HEIGHT, DEFAULT_CLUSTER_COUNT,
    DEFAULT_CLUSTER_SEED, DEFAULT_MIN_CLUSTER_POINTS, DEFAULT_MIN_POINTS_PER_VOXEL,
    DEFAULT_VOXEL_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters consumed by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Voxel edge length in metres.
    pub voxel_size: f64,
    /// Minimum points for a voxel cell to be retained.
    pub min_points_per_voxel: usize,
    /// Number of k-means partitions.
    pub cluster_count: usize,
    /// Partitions with fewer members are dropped.
    pub min_cluster_points: usize,
    /// Seed for k-means++ initialisation.
    pub cluster_seed: u64,
    pub collision: CollisionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            voxel_size: DEFAULT_VOXEL_SIZE,
            min_points_per_voxel: DEFAULT_MIN_POINTS_PER_VOXEL,
            cluster_count: DEFAULT_CLUSTER_COUNT,
            min_cluster_points: DEFAULT_MIN_CLUSTER_POINTS,
            cluster_seed: DEFAULT_CLUSTER_SEED,
            collision: CollisionConfig::default(),
        }
    }
}

/// Walkability grid parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub enabled: bool,
    pub grid_size: f64,
    pub player_height: f64,
    pub ankle_height: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            grid_size: COLLISION_GRID_SIZE,
            player_height: COLLISION_PLAYER_HEIGHT,
            ankle_height: COLLISION_ANKLE_HEIGHT,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::InputNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check parameter ranges before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "voxel_size must be positive, got {}",
                self.voxel_size
            )));
        }
        if self.min_points_per_voxel == 0 {
            return Err(AnalysisError::InvalidConfig(
                "min_points_per_voxel must be at least 1".into(),
            ));
        }
        if self.cluster_count == 0 {
            return Err(AnalysisError::InvalidConfig(
                "cluster_count must be at least 1".into(),
            ));
        }
        if self.collision.enabled {
            let c = &self.collision;
            if !(c.grid_size.is_finite() && c.grid_size > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "collision grid_size must be positive, got {}",
                    c.grid_size
                )));
            }
            if c.ankle_height < 0.0 || c.player_height <= c.ankle_height {
                return Err(AnalysisError::InvalidConfig(format!(
                    "collision heights must satisfy 0 <= ankle ({}) < player ({})",
                    c.ankle_height, c.player_height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_surface() {
        let config = AnalysisConfig::default();
        assert_eq!(config.voxel_size, 0.25);
        assert_eq!(config.min_points_per_voxel, 200);
        assert_eq!(config.cluster_count, 8);
        assert!(!config.collision.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            "voxel_size = 0.5\n\n[collision]\nenabled = true\n",
        )
        .unwrap();
        assert_eq!(config.voxel_size, 0.5);
        assert_eq!(config.min_points_per_voxel, 200);
        assert!(config.collision.enabled);
        assert_eq!(config.collision.grid_size, 0.10);
    }

    #[test]
    fn rejects_non_positive_voxel_size() {
        let config = AnalysisConfig {
            voxel_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_clusters_and_min_points() {
        let config = AnalysisConfig {
            cluster_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            min_points_per_voxel: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_input_not_found() {
        let err = AnalysisConfig::from_toml_file(Path::new("/definitely/not/here.toml"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InputNotFound(_)));
    }
}
