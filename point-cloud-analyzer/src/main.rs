/// Point cloud bounds analyzer entry point
use anyhow::{Context, Result};
use clap::Parser;
use constants::analysis::DEFAULT_OUTPUT_PATH;
use point_cloud_analyzer::{AnalysisConfig, ManifestGenerator, SceneAnalyzer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset or unparsable
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(
    name = "point-cloud-analyzer",
    version,
    about = "Extract collision and navigation bounds from a scene point cloud"
)]
struct Cli {
    /// Input point cloud (.ply ASCII/binary, .las or .laz)
    input: PathBuf,

    /// Output manifest path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// TOML file with analysis parameters; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Voxel edge length in metres
    #[arg(long)]
    voxel_size: Option<f64>,

    /// Minimum points for a voxel to be retained
    #[arg(long)]
    min_points: Option<usize>,

    /// Number of k-means clusters
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Minimum points for a cluster to be reported
    #[arg(long)]
    min_cluster_points: Option<usize>,

    /// Seed for k-means++ initialisation
    #[arg(long)]
    seed: Option<u64>,

    /// Also build the walkability collision grid
    #[arg(long)]
    collision_map: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.voxel_size {
            config.voxel_size = v;
        }
        if let Some(v) = self.min_points {
            config.min_points_per_voxel = v;
        }
        if let Some(v) = self.clusters {
            config.cluster_count = v;
        }
        if let Some(v) = self.min_cluster_points {
            config.min_cluster_points = v;
        }
        if let Some(v) = self.seed {
            config.cluster_seed = v;
        }
        if self.collision_map {
            config.collision.enabled = true;
        }
        Ok(config)
    }
}

/// Build the log filter from a `RUST_LOG`-style directive string.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.analysis_config()?;

    let analyzer = SceneAnalyzer::new(config)
        .context("Invalid analysis parameters")?
        .with_progress(!cli.quiet);
    let manifest = analyzer
        .analyze_file(&cli.input)
        .with_context(|| format!("Failed to analyse {}", cli.input.display()))?;

    ManifestGenerator::new(&cli.output, cli.pretty)
        .write(&manifest)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "point-cloud-analyzer",
            "scan.ply",
            "--voxel-size",
            "0.5",
            "-k",
            "3",
            "--collision-map",
        ]);
        let config = cli.analysis_config().unwrap();
        assert_eq!(cli.output, PathBuf::from("./bounds.json"));
        assert_eq!(config.voxel_size, 0.5);
        assert_eq!(config.cluster_count, 3);
        assert_eq!(config.min_points_per_voxel, 200);
        assert!(config.collision.enabled);
    }

    #[test]
    fn rust_log_level_is_not_overridden() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(
            log_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
