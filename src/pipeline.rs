use crate::error::Result;
use crate::interpret::{interpret_all, ClusterProfile};
use crate::params::ClusteringParams;
use crate::summary::{aggregate, ClusterAggregateStats};
use crate::types::{CustomerId, CustomerRecord, DataPoint};
use crate::KMeans;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// One segmented cluster: its statistics and their interpretation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentReport {
    pub stats: ClusterAggregateStats,
    pub profile: ClusterProfile,
}

/// Outcome of [`segment`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentationReport {
    /// Cluster index of every customer
    pub labels: BTreeMap<CustomerId, usize>,
    /// Refinement iterations that were run
    pub iterations: usize,
    pub converged: bool,
    /// Non-empty clusters, by cluster index
    pub clusters: BTreeMap<usize, SegmentReport>,
}

/// Segment **records** into `params.k` clusters, aggregate every cluster and interpret it.
///
/// ## Errors
/// Any validation error of the parameters or the input data; see [`crate::Error`].
///
/// ## Example
/// ```rust
/// use segment_kmeans::*;
///
/// let records: Vec<CustomerRecord> = serde_json::from_str(r#"[
///     {"customer_id": 1, "age": 25, "income": 20000, "purchase_amount": 500},
///     {"customer_id": 2, "age": 26, "income": 21000, "purchase_amount": 520},
///     {"customer_id": 3, "age": 55, "income": 90000, "purchase_amount": 4000},
///     {"customer_id": 4, "age": 57, "income": 95000, "purchase_amount": 4200}
/// ]"#).unwrap();
/// let report = segment(&records, &ClusteringParams { k: 2, ..Default::default() }).unwrap();
/// assert_eq!(report.labels[&1], report.labels[&2]);
/// for (idx, cluster) in report.clusters.iter() {
///     println!("{}: {}", idx, cluster.profile.name);
/// }
/// ```
pub fn segment(records: &[CustomerRecord], params: &ClusteringParams) -> Result<SegmentationReport> {
    params.validate()?;
    let points: Vec<DataPoint<f64>> = records.iter().map(DataPoint::from).collect();
    let kmean = KMeans::new(&points)?;
    let conf = params.to_config()?;
    let state = kmean.kmeans_lloyd(params.k, params.max_iterations, KMeans::init_kmeanplusplus, &conf)?;

    let labels = kmean.labels(&state);
    let stats = aggregate(records, &labels, params.k);
    let mut profiles = interpret_all(&stats);
    let clusters: BTreeMap<usize, SegmentReport> = stats.into_iter()
        .filter_map(|(idx, stats)| profiles.remove(&idx).map(|profile| (idx, SegmentReport { stats, profile })))
        .collect();
    info!(customers = records.len(), k = params.k, segments = clusters.len(), "segmentation finished");

    Ok(SegmentationReport {
        labels,
        iterations: state.iterations,
        converged: state.converged(),
        clusters,
    })
}
