use crate::error::{Error, Result};
use crate::normalize::NormalizationStats;
use crate::types::*;
use crate::variants::lloyd;
use crate::{AbortStrategy, DistanceFunction, EmptyClusterPolicy, EuclideanDistance};
use rand::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub type InitDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>);
pub type IterationDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>, usize, T);

/// Seed used when none is configured, so that runs are reproducible by default.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// This is a structure holding various configuration options for the a k-means calculations, such as
/// the seed of the random number generator, or a couple of callbacks, that can be set to get status information from
/// a running k-means calculation.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
pub struct KMeansConfig<'a, T: Primitive> {
    /// Callback that is called, when the initialization phase finished
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the initialization
    pub(crate) init_done: InitDoneCallbackFn<'a, T>,
    /// Callback that is called after each iteration
    /// ## Arguments
    /// - **state**: Current[`KMeansState`] after the iteration
    /// - **iteration_id**: Number of the current iteration
    /// - **distsum**: New distance sum (**state** contains the distsum from the previous iteration)
    pub(crate) iteration_done: IterationDoneCallbackFn<'a, T>,
    /// Seed for the random number generator. Every calculation creates its own generator from it.
    pub(crate) random_seed: u64,
    /// The abort-strategy to use for the running calculation
    pub(crate) abort_strategy: AbortStrategy<T>,
    /// What to do with centroids that lost all of their samples
    pub(crate) empty_cluster_policy: EmptyClusterPolicy,
}
impl<'a, T: Primitive> Default for KMeansConfig<'a, T> {
    fn default() -> Self {
        Self {
            init_done: &|_| {},
            iteration_done: &|_,_,_| {},
            random_seed: DEFAULT_RANDOM_SEED,
            abort_strategy: AbortStrategy::default(),
            empty_cluster_policy: EmptyClusterPolicy::default(),
        }
    }
}
impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }

    pub fn random_seed(&self) -> u64 { self.random_seed }
    pub fn abort_strategy(&self) -> AbortStrategy<T> { self.abort_strategy }
    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy { self.empty_cluster_policy }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig")
            .field("random_seed", &self.random_seed)
            .field("abort_strategy", &self.abort_strategy)
            .field("empty_cluster_policy", &self.empty_cluster_policy)
            .finish()
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the callback that should be called after the centroid initialization, before the iteration starts.
    pub fn init_done(mut self, init_done: InitDoneCallbackFn<'a, T>) -> Self {
        self.config.init_done = init_done; self
    }
    /// Set the callback that should be called after each iteration during a running k-means calculation.
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a, T>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Set the seed of the random number generator used by the k-means calculation.
    /// ## Default
    /// [`DEFAULT_RANDOM_SEED`]
    pub fn random_seed(mut self, random_seed: u64) -> Self {
        self.config.random_seed = random_seed; self
    }
    /// Set the abort-strategy to use during a running k-means calculation. For more information,
    /// see documentation of [`AbortStrategy`].
    /// ## Default
    /// [`AbortStrategy::CentroidShift`] `{ threshold: 1e-4 }`
    pub fn abort_strategy(mut self, abort_strategy: AbortStrategy<T>) -> Self {
        self.config.abort_strategy = abort_strategy; self
    }
    /// Set the policy for clusters that end up without samples during an iteration.
    /// ## Default
    /// [`EmptyClusterPolicy::Freeze`]
    pub fn empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.config.empty_cluster_policy = policy; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> { self.config }
}


/// Phases of a k-means calculation. A finished calculation is in one of the two terminal phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Seeding,
    Refining,
    Converged,
    MaxIterationsReached,
}

/// This is the internally used data-structure, storing the current state during calculation, as
/// well as the final result, as returned by the API.
/// All mutations are done in this structure, making [`KMeans`] immutable, and therefore allowing
/// it to be used in parallel, without having to duplicate the input-data.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters that were requested when calculating this k-means result
/// - **phase**: Where the calculation currently is (or how it ended)
/// - **iterations**: The amount of refinement iterations that were run
/// - **distsum**: The total sum of (squared) distances from all samples to their respective centroids
/// - **centroids**: Calculated cluster centers, in normalized feature space
/// - **centroid_frequency**: Amount of samples in each centroid
/// - **assignments**: Vector mapping each sample to its respective nearest cluster
/// - **centroid_distances**: Vector containing each sample's (squared) distance to its centroid
#[derive(Clone, Debug, Serialize)]
#[serde(bound = "T: Primitive")]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub phase: Phase,
    pub iterations: usize,
    pub distsum: T,
    pub centroids: Vec<FeatureVector<T>>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_cnt: usize, k: usize) -> Self {
        Self {
            k,
            phase: Phase::Seeding,
            iterations: 0,
            distsum: T::zero(),
            centroids: vec![[T::zero(); FEATURE_CNT]; k],
            centroid_frequency: vec![0usize;k],
            assignments: vec![0usize;sample_cnt],
            centroid_distances: vec![T::infinity();sample_cnt]
        }
    }

    pub(crate) fn set_centroid(&mut self, idx: usize, src: &FeatureVector<T>) {
        self.centroids[idx] = *src;
    }

    /// Whether the calculation stopped because the abort strategy was satisfied.
    pub fn converged(&self) -> bool {
        self.phase == Phase::Converged
    }

    /// Sample indices grouped by cluster; index `i` holds the samples assigned to centroid `i` (possibly none).
    pub fn buckets(&self) -> Vec<Vec<usize>> {
        let mut buckets = vec![Vec::new(); self.k];
        self.assignments.iter().cloned().enumerate()
            .for_each(|(sample_idx, centroid_id)| buckets[centroid_id].push(sample_idx));
        buckets
    }
}




/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the customers you want to segment. On construction, the
/// features are z-score normalized (see [`NormalizationStats`]); all calculations run in normalized space.
/// The primitive type of the passed data points will be the type used internaly for all calculations,
/// as well as the result as stored in the returned [`KMeansState`] structure.
///
/// ## Supported variants
/// - k-Means clustering (Lloyd) [`KMeans::kmeans_lloyd`]
///
/// ## Supported initialization methods
/// - K-Mean++ [`KMeans::init_kmeanplusplus`]
/// - Precomputed centroids [`KMeans::init_precomputed`]
pub struct KMeans<T: Primitive, D: DistanceFunction<T> = EuclideanDistance> {
    pub(crate) ids: Vec<CustomerId>,
    pub(crate) samples: Vec<FeatureVector<T>>,
    pub(crate) stats: NormalizationStats<T>,
    pub(crate) distance: D,
}
impl<T: Primitive> KMeans<T, EuclideanDistance> {
    /// Create a new instance of the [`KMeans`] structure, using the euclidean distance.
    ///
    /// ## Errors
    /// Fails with [`crate::Error::EmptyInput`] or [`crate::Error::NonFiniteFeature`], see [`NormalizationStats::fit`],
    /// and with [`crate::Error::InvalidParameter`] if two points share an id.
    pub fn new(points: &[DataPoint<T>]) -> Result<Self> {
        Self::with_distance(points, EuclideanDistance)
    }
}
impl<T: Primitive, D: DistanceFunction<T>> KMeans<T, D> {
    /// Create a new instance of the [`KMeans`] structure, using a custom distance function.
    /// Point ids have to be unique, since results are reported per id.
    pub fn with_distance(points: &[DataPoint<T>], distance: D) -> Result<Self> {
        let stats = NormalizationStats::fit(points)?;
        let mut seen = BTreeSet::new();
        if let Some(dup) = points.iter().find(|p| !seen.insert(p.id)) {
            return Err(Error::InvalidParameter {
                name: "points",
                message: format!("customer id {} occurs more than once", dup.id),
            });
        }
        Ok(Self {
            ids: points.iter().map(|p| p.id).collect(),
            samples: points.iter().map(|p| stats.normalize(&p.features)).collect(),
            stats,
            distance,
        })
    }

    pub fn sample_cnt(&self) -> usize { self.samples.len() }
    pub fn ids(&self) -> &[CustomerId] { &self.ids }
    /// The normalized samples, in input order.
    pub fn samples(&self) -> &[FeatureVector<T>] { &self.samples }
    pub fn stats(&self) -> &NormalizationStats<T> { &self.stats }
    pub fn distance(&self) -> &D { &self.distance }


    /// Nearest centroid (and the distance to it) for every sample.
    pub(crate) fn nearest_centroids(&self, centroids: &[FeatureVector<T>]) -> Vec<(usize, T)> {
        // manually calculate work-packet size, because rayon does not do static scheduling (which is more apropriate here)
        let work_packet_size = (self.samples.len() / rayon::current_num_threads()).max(1);
        self.samples.par_iter()
            .with_min_len(work_packet_size)
            .map(|s| lloyd::nearest_centroid(s, centroids, &self.distance))
            .collect()
    }

    pub(crate) fn update_cluster_assignments(&self, state: &mut KMeansState<T>, limit_k: Option<usize>) {
        let k = limit_k.unwrap_or(state.k);
        let nearest = self.nearest_centroids(&state.centroids[..k]);

        state.assignments.iter_mut()
            .zip(state.centroid_distances.iter_mut())
            .zip(nearest.into_iter())
            .for_each(|((assignment, centroid_dist), (best_idx, best_dist))| {
                *assignment = best_idx;
                *centroid_dist = best_dist * best_dist;
            });
        self.update_cluster_frequencies(&state.assignments, &mut state.centroid_frequency);
    }

    pub(crate) fn update_cluster_frequencies(&self, assignments: &[usize], centroid_frequency: &mut[usize]) {
        centroid_frequency.iter_mut().for_each(|v| *v = 0);
        assignments.iter().cloned()
            .for_each(|centroid_id| centroid_frequency[centroid_id] += 1);
    }

    /// Assign every (normalized) sample to its nearest centroid out of **centroids**.
    /// Ties are resolved in favor of the centroid with the lower index.
    pub fn assign_samples(&self, centroids: &[FeatureVector<T>]) -> Vec<usize> {
        self.nearest_centroids(centroids).into_iter().map(|(idx, _)| idx).collect()
    }

    /// Cluster index a new, raw **point** would be assigned to, given the result of a calculation.
    /// The point is normalized with the statistics of the data this instance was created from.
    pub fn predict(&self, state: &KMeansState<T>, point: &DataPoint<T>) -> usize {
        let normalized = self.stats.normalize(&point.features);
        lloyd::nearest_centroid(&normalized, &state.centroids, &self.distance).0
    }

    /// Map every customer to its cluster index.
    pub fn labels(&self, state: &KMeansState<T>) -> BTreeMap<CustomerId, usize> {
        self.ids.iter().cloned().zip(state.assignments.iter().cloned()).collect()
    }

    /// Centroids of **state**, mapped back into raw feature units.
    pub fn raw_centroids(&self, state: &KMeansState<T>) -> Vec<FeatureVector<T>> {
        state.centroids.iter().map(|c| self.stats.denormalize(c)).collect()
    }



    /// Normal K-Means algorithm implementation (Lloyd).
    ///
    /// Seeds the centroids with **init**, then alternates between assigning every sample to its nearest centroid
    /// and moving every centroid into the mean of its samples, until the configured abort strategy is satisfied,
    /// or **max_iter** iterations ran. Either way, the final assignment is recomputed from the final centroids.
    ///
    /// ## Arguments
    /// - **k**: Amount of clusters to search for
    /// - **max_iter**: Limit the maximum amount of iterations
    /// - **init**: Initialization-Method to use for the initialization of the **k** centroids
    /// - **config**: [`KMeansConfig`] instance, containing several configuration options for the calculation.
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final state (result).
    ///
    /// ## Errors
    /// - [`crate::Error::InvalidClusterCount`] if `k == 0` or `k` is bigger than the amount of samples
    /// - [`crate::Error::InvalidParameter`] if the abort strategy's threshold is negative or NaN
    ///
    /// ## Example
    /// ```rust
    /// use segment_kmeans::*;
    ///
    /// let points = vec![
    ///     DataPoint::new(1, 25.0, 20000.0, 500.0),
    ///     DataPoint::new(2, 26.0, 21000.0, 520.0),
    ///     DataPoint::new(3, 55.0, 90000.0, 4000.0),
    ///     DataPoint::new(4, 57.0, 95000.0, 4200.0),
    /// ];
    /// let kmean = KMeans::new(&points).unwrap();
    /// let result = kmean.kmeans_lloyd(2, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();
    ///
    /// println!("Centroids: {:?}", kmean.raw_centroids(&result));
    /// println!("Labels: {:?}", kmean.labels(&result));
    /// println!("Error: {}", result.distsum);
    /// ```
    pub fn kmeans_lloyd<'a, F>(&self, k: usize, max_iter: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where F: FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &mut dyn RngCore) -> Result<()> {
        lloyd::calculate(self, k, max_iter, init, config)
    }

    /// K-Means++ initialization method
    ///
    /// ## Description
    /// This initialization method starts by selecting one sample, uniformly at random, as first centroid.
    /// Proceeding from there, the method iteratively selects one new centroid (per iteration). Each sample's
    /// weight of "being the next centroid" is its squared distance to the nearest already chosen centroid,
    /// so samples far away from all current centroids are preferred.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to an instance-method of [`KMeans`].
    pub fn init_kmeanplusplus(kmean: &KMeans<T, D>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) -> Result<()> {
        crate::inits::kmeanplusplus::calculate(kmean, state, rnd);
        Ok(())
    }

    /// Precomputed initialization method
    ///
    /// ## Description
    /// Uses the given centroids (in normalized feature space) as initial centroids. Exactly `k` of them have to be given,
    /// otherwise the calculation fails with [`crate::Error::InvalidParameter`].
    pub fn init_precomputed(centroids: Vec<FeatureVector<T>>)
            -> impl FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &mut dyn RngCore) -> Result<()> {
        move |kmean, state, _rnd| crate::inits::precomputed::calculate(kmean, state, centroids)
    }
}
