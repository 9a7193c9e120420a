//! Behavioral clustering: standardize the (merchant code, amount) features and
//! partition them with seeded k-means.

use std::collections::HashSet;

use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::encoder::encode_features;
use crate::error::{Result, SpyError};
use crate::models::TransactionTable;

/// Per-column zero-mean, unit-variance scaling on top of linfa's standard
/// scaler. Columns whose spread is only float noise scale to all zeros.
pub struct StandardScaler {
    inner: Option<LinearScaler<f64>>,
    constant: Vec<bool>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() < 2 {
            return Ok(Self {
                inner: None,
                constant: vec![true; x.ncols()],
            });
        }
        let inner = LinearScaler::<f64>::standard()
            .fit(&DatasetBase::from(x.clone()))
            .map_err(|e| SpyError::Cluster(e.to_string()))?;
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let std = x.std_axis(Axis(0), 0.0);
        let constant = mean
            .iter()
            .zip(std.iter())
            .map(|(&m, &s)| is_constant(m, s))
            .collect();
        Ok(Self {
            inner: Some(inner),
            constant,
        })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = match &self.inner {
            Some(scaler) => scaler.transform(x.clone()),
            None => x.clone(),
        };
        for (mut column, &constant) in out.axis_iter_mut(Axis(1)).zip(&self.constant) {
            if constant {
                column.fill(0.0);
            }
        }
        out
    }
}

fn is_constant(mean: f64, std: f64) -> bool {
    std <= 10.0 * f64::EPSILON * mean.abs().max(1.0)
}

#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub n_runs: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

/// Result of one clustering pass.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    pub requested_clusters: usize,
    /// Clusters actually formed; below `requested_clusters` when the batch has
    /// fewer distinct feature vectors than requested.
    pub n_clusters: usize,
    pub labels: Vec<usize>,
    /// Centroids in standardized space, one row per cluster.
    pub centroids: Array2<f64>,
    pub inertia: f64,
}

impl ClusterModel {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    pub fn is_reduced(&self) -> bool {
        self.n_clusters < self.requested_clusters
    }
}

fn count_distinct_rows(x: &Array2<f64>) -> usize {
    // +0.0 folds -0.0 into 0.0 so equal values hash equal
    x.outer_iter()
        .map(|row| row.iter().map(|v| (v + 0.0).to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

fn compute_inertia(x: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c < centroids.nrows())
        .map(|(i, &c)| {
            x.row(i)
                .iter()
                .zip(centroids.row(c).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}

/// Partition already-standardized rows into at most `params.n_clusters` groups.
///
/// Policy for small batches: an empty matrix yields no labels; when there are
/// fewer distinct rows than requested clusters, the cluster count drops to the
/// number of distinct rows; a single distinct row puts everything in cluster 0.
pub fn fit_kmeans(x: &Array2<f64>, params: &ClusterParams) -> Result<ClusterModel> {
    if params.n_clusters == 0 {
        return Err(SpyError::InvalidClusterCount(0));
    }

    let n_samples = x.nrows();
    if n_samples == 0 {
        return Ok(ClusterModel {
            requested_clusters: params.n_clusters,
            n_clusters: 0,
            labels: Vec::new(),
            centroids: Array2::zeros((0, x.ncols())),
            inertia: 0.0,
        });
    }

    let distinct = count_distinct_rows(x);
    let k = params.n_clusters.min(distinct);
    if k < params.n_clusters {
        warn!(
            requested = params.n_clusters,
            effective = k,
            distinct,
            "fewer distinct transactions than clusters; reducing cluster count"
        );
    }

    if k == 1 {
        let labels = vec![0; n_samples];
        let centroid = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let centroids = centroid.insert_axis(Axis(0));
        let inertia = compute_inertia(x, &labels, &centroids);
        return Ok(ClusterModel {
            requested_clusters: params.n_clusters,
            n_clusters: 1,
            labels,
            centroids,
            inertia,
        });
    }

    let dataset = DatasetBase::from(x.clone());
    let rng = StdRng::seed_from_u64(params.seed);
    let model = KMeans::params_with(k, rng, L2Dist)
        .max_n_iterations(params.max_iterations)
        .tolerance(params.tolerance)
        .n_runs(params.n_runs)
        .fit(&dataset)
        .map_err(|e| SpyError::Cluster(e.to_string()))?;

    let labels: Array1<usize> = model.predict(x);
    let labels = labels.to_vec();
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(x, &labels, &centroids);

    Ok(ClusterModel {
        requested_clusters: params.n_clusters,
        n_clusters: k,
        labels,
        centroids,
        inertia,
    })
}

/// Encode, standardize and cluster the table, writing a cluster id onto every
/// row. Row order is untouched.
pub fn cluster_transactions(
    table: &mut TransactionTable,
    params: &ClusterParams,
) -> Result<ClusterModel> {
    let features = encode_features(&table.rows)?;
    let scaler = StandardScaler::fit(&features)?;
    let scaled = scaler.transform(&features);

    let model = fit_kmeans(&scaled, params)?;
    for (row, &label) in table.rows.iter_mut().zip(&model.labels) {
        row.cluster = Some(label);
    }

    info!(
        rows = table.len(),
        clusters = model.n_clusters,
        inertia = model.inertia,
        sizes = ?model.cluster_sizes(),
        "clustered transactions"
    );
    Ok(model)
}
