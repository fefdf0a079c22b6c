use crate::abort_strategy::max_centroid_shift;
use crate::error::{Error, Result};
use crate::types::*;
use crate::{DistanceFunction, EmptyClusterPolicy, KMeans, KMeansConfig, KMeansState, Phase};
use rand::prelude::*;
use tracing::{debug, info, warn};

/// Assignment step for a single sample: index of, and distance to, the nearest of **centroids**.
/// The first centroid wins on ties.
#[inline(always)]
pub(crate) fn nearest_centroid<T: Primitive, D: DistanceFunction<T>>(
    sample: &FeatureVector<T>, centroids: &[FeatureVector<T>], distance: &D,
) -> (usize, T) {
    let mut best = (0, T::infinity());
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = distance.distance(sample, centroid);
        if dist < best.1 {
            best = (idx, dist);
        }
    }
    best
}

/// Update step: move every centroid into the mean of the samples assigned to it.
/// Clusters without samples are handled according to **policy**; for [`EmptyClusterPolicy::ReseedFarthest`]
/// this also re-assigns the moved samples within **state**.
pub(crate) fn update_centroids<T: Primitive>(
    samples: &[FeatureVector<T>], state: &mut KMeansState<T>, policy: EmptyClusterPolicy,
) -> Vec<FeatureVector<T>> {
    // Sum all samples in a cluster together into new_centroids
    let mut new_centroids = vec![[T::zero(); FEATURE_CNT]; state.k];
    samples.iter()
        .zip(state.assignments.iter().cloned())
        .for_each(|(s, centroid_id)| {
            new_centroids[centroid_id].iter_mut()
                .zip(s.iter().cloned())
                .for_each(|(cv, sv)| *cv += sv);
        });

    let empty_clusters: Vec<usize> = (0..state.k).filter(|&i| state.centroid_frequency[i] == 0).collect();
    if !empty_clusters.is_empty() {
        match policy {
            EmptyClusterPolicy::Freeze => {
                for &i in empty_clusters.iter() {
                    warn!(cluster = i, "cluster has no samples, keeping its previous centroid");
                }
            }
            EmptyClusterPolicy::ReseedFarthest => reseed_empty_clusters(samples, state, &mut new_centroids, &empty_clusters),
        }
    }

    // Calculate new centroids from the per-cluster sums
    new_centroids.iter_mut()
        .zip(state.centroids.iter())
        .zip(state.centroid_frequency.iter().cloned())
        .for_each(|((nc, prev), cfreq)| {
            if cfreq == 0 {
                *nc = *prev; // Only left empty by the freeze policy
            } else {
                let cfreq = T::from(cfreq).unwrap_or_else(T::nan);
                nc.iter_mut().for_each(|v| *v = *v / cfreq);
            }
        });
    new_centroids
}

fn reseed_empty_clusters<T: Primitive>(
    samples: &[FeatureVector<T>], state: &mut KMeansState<T>,
    new_centroids: &mut [FeatureVector<T>], empty_clusters: &[usize],
) {
    let mut distance_sorted_samples: Vec<usize> = (0..samples.len()).collect();
    distance_sorted_samples.sort_by(
        |&i1, &i2| state.centroid_distances[i1].partial_cmp(&state.centroid_distances[i2]).unwrap_or(std::cmp::Ordering::Equal));

    for &i in empty_clusters {
        // Find the sample with the highest distance to its centroid, that is not alone in its cluster
        let candidate = distance_sorted_samples.iter().rev().cloned()
            .find(|&s| state.centroid_frequency[state.assignments[s]] > 1);
        let sample_id = match candidate {
            Some(sample_id) => sample_id,
            None => {
                warn!(cluster = i, "cluster has no samples and none can be moved into it, keeping its previous centroid");
                continue;
            }
        };
        let prev_centroid_id = state.assignments[sample_id];
        warn!(cluster = i, sample = sample_id, from = prev_centroid_id, "cluster has no samples, reseeding it with the farthest sample");

        // Re-Assign found sample to centroid without any samples
        state.centroid_frequency[prev_centroid_id] -= 1;
        state.centroid_frequency[i] += 1;
        // Centroid is moved into the chosen point -> the points centroid distance is 0
        state.centroid_distances[sample_id] = T::zero();
        // new_centroids is a sum of all points within a centroid here.
        // Subtract chosen sample from its previous centroid
        new_centroids[prev_centroid_id].iter_mut()
            .zip(samples[sample_id].iter().cloned())
            .for_each(|(cv, sv)| *cv -= sv);
        // Chosen sample is single point in cluster -> set cluster's sum to chosen point
        new_centroids[i] = samples[sample_id];
        state.assignments[sample_id] = i;
    }
}

/// Sum of squared distances from every sample to the centroid it is assigned to.
pub(crate) fn distsum<T: Primitive, D: DistanceFunction<T>>(
    samples: &[FeatureVector<T>], assignments: &[usize], centroids: &[FeatureVector<T>], distance: &D,
) -> T {
    samples.iter().zip(assignments.iter().cloned())
        .map(|(s, a)| distance.distance(s, &centroids[a]))
        .map(|d| d * d)
        .sum()
}

fn validate<T: Primitive>(k: usize, sample_cnt: usize, config: &KMeansConfig<'_, T>) -> Result<()> {
    if k == 0 || k > sample_cnt {
        return Err(Error::InvalidClusterCount { requested: k, n_items: sample_cnt });
    }
    let threshold = config.abort_strategy.threshold();
    if !(threshold >= T::zero()) {
        return Err(Error::InvalidParameter {
            name: "threshold",
            message: format!("must be a non-negative number, got {}", threshold),
        });
    }
    Ok(())
}

#[inline(always)] pub fn calculate<'a, T, D, F>(data: &KMeans<T, D>, k: usize, max_iter: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
            where T: Primitive, D: DistanceFunction<T>,
                  F: FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &mut dyn RngCore) -> Result<()> {
    validate(k, data.sample_cnt(), config)?;

    let mut state = KMeansState::new(data.sample_cnt(), k);
    state.distsum = T::infinity();

    // Every calculation owns its generator, so that runs can neither see nor disturb each other
    let mut rnd = StdRng::seed_from_u64(config.random_seed);

    // Initialize clusters and notify subscriber
    init(data, &mut state, &mut rnd)?;
    (config.init_done)(&state);
    state.phase = Phase::Refining;
    let mut abort_strategy = config.abort_strategy.create_logic(&data.distance);

    for i in 1..=max_iter {
        state.iterations = i;
        data.update_cluster_assignments(&mut state, None);
        let new_centroids = update_centroids(&data.samples, &mut state, config.empty_cluster_policy);
        let new_distsum = distsum(&data.samples, &state.assignments, &new_centroids, &data.distance);
        debug!(iteration = i, distsum = %new_distsum,
            shift = %max_centroid_shift(&state.centroids, &new_centroids, &data.distance), "k-means iteration finished");

        let proceed = abort_strategy.next(&state.centroids, &new_centroids, new_distsum);
        state.centroids = new_centroids;

        // Notify subscriber about finished iteration
        (config.iteration_done)(&state, i, new_distsum);
        state.distsum = new_distsum;
        if !proceed {
            state.phase = Phase::Converged;
            break;
        }
    }
    if state.phase != Phase::Converged {
        state.phase = Phase::MaxIterationsReached;
    }

    // Final assignment, consistent with the final centroids
    data.update_cluster_assignments(&mut state, None);
    state.distsum = state.centroid_distances.iter().cloned().sum();
    info!(k, phase = ?state.phase, iterations = state.iterations, distsum = %state.distsum, "k-means finished");
    Ok(state)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing::assert_same_partition;
    use crate::{AbortStrategy, DataPoint, EuclideanDistance};
    use std::cell::RefCell;

    fn scenario() -> Vec<DataPoint<f64>> {
        vec![
            DataPoint::new(1, 25.0, 20000.0, 500.0),
            DataPoint::new(2, 26.0, 21000.0, 520.0),
            DataPoint::new(3, 55.0, 90000.0, 4000.0),
            DataPoint::new(4, 57.0, 95000.0, 4200.0),
        ]
    }

    fn blobs<T: Primitive>(per_blob: usize) -> Vec<DataPoint<T>> {
        let mut rnd = StdRng::seed_from_u64(1);
        let centers = [(25.0, 25000.0, 800.0), (45.0, 60000.0, 2500.0), (65.0, 90000.0, 4500.0)];
        let v = |x: f64| T::from(x).unwrap();
        let mut points = Vec::new();
        for (ci, c) in centers.iter().enumerate() {
            for i in 0..per_blob {
                let jitter: f64 = rnd.gen_range(-1.0, 1.0);
                points.push(DataPoint::new((ci * per_blob + i) as u64,
                    v(c.0 + jitter), v(c.1 + jitter * 1000.0), v(c.2 + jitter * 50.0)));
            }
        }
        points
    }

    #[test]
    fn separated_customers_f64() {
        let kmean = KMeans::new(&scenario()).unwrap();
        let res = kmean.kmeans_lloyd(2, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();

        assert_same_partition(&[0, 0, 1, 1], &res.assignments);
        assert!(res.converged());
        assert!(res.iterations <= 5, "took {} iterations", res.iterations);
        assert_eq!(res.centroid_frequency, vec![2, 2]);
        let labels = kmean.labels(&res);
        assert_eq!(labels[&1], labels[&2]);
        assert_eq!(labels[&3], labels[&4]);
        assert_ne!(labels[&1], labels[&3]);
    }

    #[test] fn blobs_f32() { blobs_are_recovered::<f32>(); }
    #[test] fn blobs_f64() { blobs_are_recovered::<f64>(); }

    fn blobs_are_recovered<T: Primitive>() {
        let kmean = KMeans::new(&blobs::<T>(30)).unwrap();
        let res = kmean.kmeans_lloyd(3, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();
        let should: Vec<usize> = (0..90).map(|i| i / 30).collect();
        assert_same_partition(&should, &res.assignments);
        assert_eq!(res.phase, Phase::Converged);
    }

    #[test]
    fn identical_points_converge_in_first_iteration() {
        let points: Vec<_> = (0..6u64).map(|i| DataPoint::new(i, 33.0, 41000.0, 1700.0)).collect();
        let kmean = KMeans::new(&points).unwrap();
        for k in 1..=6 {
            let res = kmean.kmeans_lloyd(k, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();
            assert_eq!(res.iterations, 1);
            assert!(res.converged());
            assert!(res.assignments.iter().all(|&a| a < k));
            assert_eq!(res.distsum, 0.0);
        }
    }

    #[test]
    fn runs_are_reproducible() {
        let points = blobs::<f64>(20);
        let kmean = KMeans::new(&points).unwrap();
        let conf = KMeansConfig::build().random_seed(9).build();
        let a = kmean.kmeans_lloyd(4, 300, KMeans::init_kmeanplusplus, &conf).unwrap();
        let b = kmean.kmeans_lloyd(4, 300, KMeans::init_kmeanplusplus, &conf).unwrap();
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn iteration_cap_is_a_normal_termination() {
        let kmean = KMeans::new(&blobs::<f64>(20)).unwrap();
        let conf = KMeansConfig::build()
            .abort_strategy(AbortStrategy::CentroidShift { threshold: 0.0 })
            .build();
        let res = kmean.kmeans_lloyd(5, 1, KMeans::init_kmeanplusplus, &conf).unwrap();
        assert_eq!(res.iterations, 1);
        assert_eq!(res.phase, Phase::MaxIterationsReached);
        // final assignment matches the final centroids
        assert_eq!(kmean.assign_samples(&res.centroids), res.assignments);
    }

    #[test]
    fn zero_iterations_keep_the_seeds() {
        let kmean = KMeans::new(&scenario()).unwrap();
        let res = kmean.kmeans_lloyd(2, 0, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();
        assert_eq!(res.iterations, 0);
        assert_eq!(res.phase, Phase::MaxIterationsReached);
        for c in res.centroids.iter() {
            assert!(kmean.samples().contains(c));
        }
    }

    #[test]
    fn invalid_cluster_counts_are_rejected() {
        let kmean = KMeans::new(&scenario()).unwrap();
        for k in [0usize, 5].iter().cloned() {
            let err = kmean.kmeans_lloyd(k, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap_err();
            assert_eq!(err, Error::InvalidClusterCount { requested: k, n_items: 4 });
        }
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let kmean = KMeans::new(&scenario()).unwrap();
        let conf = KMeansConfig::build().abort_strategy(AbortStrategy::CentroidShift { threshold: -1.0 }).build();
        let err = kmean.kmeans_lloyd(2, 300, KMeans::init_kmeanplusplus, &conf).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "threshold", .. }));
    }

    #[test]
    fn distsum_never_increases() {
        let kmean = KMeans::new(&blobs::<f64>(25)).unwrap();
        let history = RefCell::new(Vec::new());
        let record = |_: &KMeansState<f64>, _: usize, distsum: f64| history.borrow_mut().push(distsum);
        let conf = KMeansConfig::build().random_seed(5).iteration_done(&record).build();
        let res = kmean.kmeans_lloyd(6, 300, KMeans::init_kmeanplusplus, &conf).unwrap();

        let history = history.into_inner();
        assert_eq!(history.len(), res.iterations);
        for w in history.windows(2) {
            assert!(w[1] <= w[0] + 1e-9, "distsum increased: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn callbacks_see_the_running_state() {
        let kmean = KMeans::new(&scenario()).unwrap();
        let init_phase = RefCell::new(None);
        let iterations = RefCell::new(Vec::new());
        let on_init = |s: &KMeansState<f64>| *init_phase.borrow_mut() = Some(s.phase);
        let on_iteration = |s: &KMeansState<f64>, nr: usize, _: f64| iterations.borrow_mut().push((nr, s.phase));
        let conf = KMeansConfig::build().init_done(&on_init).iteration_done(&on_iteration).build();
        let res = kmean.kmeans_lloyd(2, 300, KMeans::init_kmeanplusplus, &conf).unwrap();

        assert_eq!(init_phase.into_inner(), Some(Phase::Seeding));
        let iterations = iterations.into_inner();
        assert_eq!(iterations.len(), res.iterations);
        assert!(iterations.iter().enumerate().all(|(i, (nr, phase))| *nr == i + 1 && *phase == Phase::Refining));
    }

    #[test]
    fn assignment_ties_go_to_lowest_index() {
        let centroids = [[1.0f64, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(nearest_centroid(&[0.0, 0.0, 0.0], &centroids, &EuclideanDistance), (0, 1.0));
        assert_eq!(nearest_centroid(&[-0.5, 0.0, 0.0], &centroids, &EuclideanDistance), (1, 0.5));
    }

    fn state_with(assignments: Vec<usize>, centroids: Vec<FeatureVector<f64>>, samples: &[FeatureVector<f64>]) -> KMeansState<f64> {
        let mut state = KMeansState::new(assignments.len(), centroids.len());
        state.centroids = centroids;
        state.assignments = assignments;
        state.centroid_frequency = vec![0; state.k];
        state.assignments.iter().for_each(|&a| state.centroid_frequency[a] += 1);
        state.centroid_distances = samples.iter().zip(state.assignments.iter())
            .map(|(s, &a)| {
                let d: f64 = EuclideanDistance.distance(s, &state.centroids[a]);
                d * d
            })
            .collect();
        state
    }

    #[test]
    fn update_moves_centroids_to_means() {
        let samples = [[1.0, 0.0, 0.0], [3.0, 0.0, 0.0], [10.0, 2.0, 4.0]];
        let mut state = state_with(vec![0, 0, 1], vec![[0.0; 3], [9.0, 0.0, 0.0]], &samples);
        let updated = update_centroids(&samples, &mut state, EmptyClusterPolicy::Freeze);
        assert_eq!(updated, vec![[2.0, 0.0, 0.0], [10.0, 2.0, 4.0]]);
    }

    #[test]
    fn empty_cluster_is_frozen() {
        let samples = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let mut state = state_with(vec![0, 0, 0], vec![[2.0, 0.0, 0.0], [1337.0, 0.0, 0.0]], &samples);
        let updated = update_centroids(&samples, &mut state, EmptyClusterPolicy::Freeze);
        assert_eq!(updated, vec![[2.0, 0.0, 0.0], [1337.0, 0.0, 0.0]]);
        assert_eq!(state.assignments, vec![0, 0, 0]);
    }

    #[test]
    fn empty_cluster_is_reseeded_with_farthest_sample() {
        let samples = [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let mut state = state_with(vec![0, 0, 0], vec![[1.5, 0.0, 0.0], [1337.0, 0.0, 0.0]], &samples);
        let updated = update_centroids(&samples, &mut state, EmptyClusterPolicy::ReseedFarthest);
        assert_eq!(updated, vec![[1.5, 0.0, 0.0], [3.0, 0.0, 0.0]]);
        assert_eq!(state.assignments, vec![0, 0, 1]);
        assert_eq!(state.centroid_frequency, vec![2, 1]);
        assert_eq!(state.centroid_distances[2], 0.0);
    }

    #[test]
    fn reseeding_never_empties_a_singleton_cluster() {
        let samples = [[1.0, 0.0, 0.0], [5.0, 0.0, 0.0]];
        let mut state = state_with(vec![0, 1], vec![[1.0, 0.0, 0.0], [5.0, 0.0, 0.0], [99.0, 0.0, 0.0]], &samples);
        let updated = update_centroids(&samples, &mut state, EmptyClusterPolicy::ReseedFarthest);
        assert_eq!(updated[2], [99.0, 0.0, 0.0]);
        assert_eq!(state.assignments, vec![0, 1]);
    }

    #[test]
    fn distsum_sums_squared_distances() {
        let samples = [[0.0f64, 0.0, 0.0], [0.0, 3.0, 4.0]];
        let centroids = [[0.0, 0.0, 1.0]];
        assert_approx_eq!(distsum(&samples, &[0, 0], &centroids, &EuclideanDistance), 19.0, 1e-9);
    }
}
