use crate::{DistanceFunction, KMeans, KMeansState, Primitive};
use rand::prelude::*;

#[inline(always)]
pub fn calculate<T, D>(kmean: &KMeans<T, D>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore)
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    {
        // Randomly select first centroid
        let first_idx = rnd.gen_range(0, kmean.sample_cnt());
        state.set_centroid(0, &kmean.samples[first_idx]);
    }
    for k in 1..state.k {
        // For each following centroid...
        // Calculate (squared) distances to the nearest already chosen centroid
        kmean.update_cluster_assignments(state, Some(k));

        // The squared distances are the (unnormalized) weights of each sample to become the next centroid
        let distsum: T = state.centroid_distances.iter().cloned().sum();
        let draw = rnd.gen_range(T::zero(), T::one()) * distsum;
        let sampled_centroid_id = pick_weighted(&state.centroid_distances, draw);
        state.set_centroid(k, &kmean.samples[sampled_centroid_id]);
    }
}

/// Walk the cumulative sum of **weights** and return the first index whose cumulative weight reaches **draw**.
/// When all weights are zero, this picks the first index.
pub(crate) fn pick_weighted<T: Primitive>(weights: &[T], draw: T) -> usize {
    let mut cumulative = T::zero();
    for (idx, weight) in weights.iter().cloned().enumerate() {
        cumulative += weight;
        if cumulative >= draw {
            return idx;
        }
    }
    // rounding pushed the draw past the accumulated total
    weights.iter().rposition(|w| *w > T::zero()).unwrap_or(weights.len().saturating_sub(1))
}
