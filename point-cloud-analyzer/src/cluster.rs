/// Density clustering with k-means++ seeding
use crate::bounds::{PointCloudBounds, Vector3};
use crate::point::Point;
use constants::analysis::{CLUSTER_SAMPLE_CAP, KMEANS_MAX_ITERATIONS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info};

/// One dense spatial group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub bounds: PointCloudBounds,
    /// Midpoint of `bounds`, not the mean of the members.
    pub centroid: Vector3,
    pub point_count: usize,
}

/// Every Nth point (N = total / cap) once the cloud exceeds the cap.
pub fn subsample(points: &[Point], cap: usize) -> Cow<'_, [Point]> {
    if points.len() <= cap {
        return Cow::Borrowed(points);
    }
    let step = points.len() / cap;
    Cow::Owned(points.iter().step_by(step).copied().collect())
}

fn nearest(point: &Point, centroids: &[Point]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, point.squared_distance(c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(i, _)| i)
}

/// k-means++: each new centroid is drawn with probability proportional to
/// its squared distance from the nearest chosen centroid.
fn initialize_centroids(data: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.random_range(0..data.len())]);

    while centroids.len() < k {
        let distances: Vec<f64> = data
            .par_iter()
            .map(|p| p.squared_distance(&centroids[nearest(p, &centroids)]))
            .collect();
        let total: f64 = distances.iter().sum();

        let chosen = if total <= 0.0 {
            // All points coincide with existing centroids.
            rng.random_range(0..data.len())
        } else {
            let threshold = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            distances
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative >= threshold
                })
                .unwrap_or(data.len() - 1)
        };
        centroids.push(data[chosen]);
    }

    centroids
}

/// Partition `data` into `k` groups; returns one group index per point.
pub fn kmeans(data: &[Point], k: usize, seed: u64) -> Vec<usize> {
    if data.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(data.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = initialize_centroids(data, k, &mut rng);
    let mut assignments: Vec<usize> = Vec::new();

    for iteration in 0..KMEANS_MAX_ITERATIONS {
        let next: Vec<usize> = data.par_iter().map(|p| nearest(p, &centroids)).collect();
        if next == assignments {
            debug!("k-means converged after {} iterations", iteration);
            break;
        }
        assignments = next;

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (p, &group) in data.iter().zip(&assignments) {
            sums[group][0] += p.x;
            sums[group][1] += p.y;
            sums[group][2] += p.z;
            counts[group] += 1;
        }
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            // Empty groups keep their previous centroid.
            if count > 0 {
                let n = count as f64;
                *centroid = Point::new(sum[0] / n, sum[1] / n, sum[2] / n);
            }
        }
    }

    assignments
}

/// Cluster a (subsampled) cloud and keep groups with at least `min_points`.
pub fn cluster_points(points: &[Point], k: usize, min_points: usize, seed: u64) -> Vec<Cluster> {
    let sample = subsample(points, CLUSTER_SAMPLE_CAP);
    let assignments = kmeans(&sample, k, seed);
    let groups = assignments.iter().copied().max().map_or(0, |m| m + 1);

    let mut bounds = vec![PointCloudBounds::new(); groups];
    let mut counts = vec![0usize; groups];
    for (p, &group) in sample.iter().zip(&assignments) {
        bounds[group].update(p.x, p.y, p.z);
        counts[group] += 1;
    }

    let clusters: Vec<Cluster> = bounds
        .into_iter()
        .zip(counts)
        .filter(|&(_, count)| {
            let keep = count >= min_points;
            if !keep && count > 0 {
                debug!("Dropping cluster with {} points", count);
            }
            keep && count > 0
        })
        .map(|(bounds, point_count)| Cluster {
            bounds,
            centroid: Vector3(bounds.center()),
            point_count,
        })
        .collect();

    info!(
        "Clustered {} sampled points into {} clusters (k = {})",
        sample.len(),
        clusters.len(),
        k
    );
    clusters
}
