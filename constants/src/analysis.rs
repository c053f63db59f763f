/// Default voxel edge length in metres
pub const DEFAULT_VOXEL_SIZE: f64 = 0.25;

/// Default minimum number of points for a voxel cell to be retained
pub const DEFAULT_MIN_POINTS_PER_VOXEL: usize = 200;

/// Default number of k-means partitions
pub const DEFAULT_CLUSTER_COUNT: usize = 8;

/// Default minimum member count for a cluster to be emitted
pub const DEFAULT_MIN_CLUSTER_POINTS: usize = 50;

/// Default seed for k-means++ initialisation
pub const DEFAULT_CLUSTER_SEED: u64 = 0x5EED_B0C5;

/// Default manifest output path
pub const DEFAULT_OUTPUT_PATH: &str = "./bounds.json";

/// Points above this count are subsampled before clustering
pub const CLUSTER_SAMPLE_CAP: usize = 10_000;

/// Iteration cap for k-means refinement
pub const KMEANS_MAX_ITERATIONS: usize = 100;

/// Regions flatter than this (metres) may be floors
pub const FLOOR_MAX_HEIGHT: f64 = 0.3;

/// Minimum horizontal extent (metres) of a floor region
pub const FLOOR_MIN_EXTENT: f64 = 1.0;

/// Horizontal aspect ratio above which a tall region is a wall
pub const WALL_MIN_ASPECT: f64 = 3.0;

/// Height to horizontal extent ratio above which an elongated region is a wall
pub const WALL_MIN_HEIGHT_RATIO: f64 = 2.0;

/// Pillar-like walls: taller than this...
pub const PILLAR_MIN_HEIGHT: f64 = 1.5;

/// ...and narrower than this
pub const PILLAR_MAX_EXTENT: f64 = 0.8;

/// Lower bound on the horizontal slab height (metres)
pub const FLOOR_BAND_MIN_HEIGHT: f64 = 0.1;

/// Slab height as a fraction of the vertical range
pub const FLOOR_BAND_FRACTION: f64 = 0.05;

/// Slabs with fewer points are skipped
pub const FLOOR_BAND_MIN_POINTS: usize = 100;

/// Maximum y variance for a slab to count as planar
pub const FLOOR_MAX_VARIANCE: f64 = 0.01;

/// Minimum (x, z) footprint area in square metres
pub const FLOOR_MIN_AREA: f64 = 1.0;

/// Half thickness of an emitted floor plane box
pub const FLOOR_HALF_THICKNESS: f64 = 0.05;

/// Point count that maps to full floor confidence
pub const FLOOR_FULL_CONFIDENCE_POINTS: f64 = 1000.0;

/// Open interval for the rise between consecutive floor regions
pub const STAIR_RISE_RANGE: (f64, f64) = (0.1, 0.3);

/// Open interval for the planar distance between consecutive floor regions
pub const STAIR_RUN_RANGE: (f64, f64) = (0.2, 1.5);

/// Open interval for an acceptable rise/run slope
pub const STAIR_SLOPE_RANGE: (f64, f64) = (0.1, 1.0);

/// Collision grid cell size (metres)
pub const COLLISION_GRID_SIZE: f64 = 0.10;

/// Height of the navigating character (metres)
pub const COLLISION_PLAYER_HEIGHT: f64 = 1.5;

/// Points this far above the local floor start blocking movement
pub const COLLISION_ANKLE_HEIGHT: f64 = 0.2;
