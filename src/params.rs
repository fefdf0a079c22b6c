use crate::api::DEFAULT_RANDOM_SEED;
use crate::error::{Error, Result};
use crate::types::Primitive;
use crate::{AbortStrategy, EmptyClusterPolicy, KMeansConfig};
use serde::{Deserialize, Serialize};

/// Caller-facing clustering parameters, as they would be read from a job configuration.
/// Every missing field takes its default.
///
/// ```rust
/// use segment_kmeans::*;
///
/// let params: ClusteringParams = serde_json::from_str(r#"{ "k": 3 }"#).unwrap();
/// assert_eq!(params.k, 3);
/// assert_eq!(params.max_iterations, 300);
/// assert_eq!(params.random_seed, 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringParams {
    /// Amount of clusters to build
    pub k: usize,
    /// Upper bound of refinement iterations
    pub max_iterations: usize,
    /// Maximum centroid movement (in normalized units) that still counts as converged
    pub convergence_threshold: f64,
    pub random_seed: u64,
    pub empty_cluster_policy: EmptyClusterPolicy,
}
impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            k: 5,
            max_iterations: 300,
            convergence_threshold: 1e-4,
            random_seed: DEFAULT_RANDOM_SEED,
            empty_cluster_policy: EmptyClusterPolicy::Freeze,
        }
    }
}
impl ClusteringParams {
    /// Check the parameters that can be checked without looking at the data.
    /// Whether `k` fits the data is checked when the calculation starts.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidParameter { name: "k", message: "must be at least 1".to_string() });
        }
        if !(self.convergence_threshold >= 0.0) || !self.convergence_threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "convergence_threshold",
                message: format!("must be a finite, non-negative number, got {}", self.convergence_threshold),
            });
        }
        Ok(())
    }

    /// Build the run configuration for a calculation with these parameters.
    pub fn to_config<'a, T: Primitive>(&self) -> Result<KMeansConfig<'a, T>> {
        let threshold = T::from(self.convergence_threshold).ok_or_else(|| Error::InvalidParameter {
            name: "convergence_threshold",
            message: format!("{} is not representable", self.convergence_threshold),
        })?;
        Ok(KMeansConfig::build()
            .random_seed(self.random_seed)
            .abort_strategy(AbortStrategy::CentroidShift { threshold })
            .empty_cluster_policy(self.empty_cluster_policy)
            .build())
    }
}
