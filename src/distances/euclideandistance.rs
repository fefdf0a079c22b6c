use crate::{DistanceFunction, Primitive};

/// Euclidean distance: square root of the summed squared per-feature differences.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

impl<T: Primitive> DistanceFunction<T> for EuclideanDistance {
    #[inline(always)]
    fn distance(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), b.len());
        a.iter().cloned()
            .zip(b.iter().cloned())
            .map(|(av, bv)| av - bv)    // <a> - <b>
            .map(|v| v * v)             // <vec_components> ^2
            .sum::<T>()                 // sum(<vec_components>^2)
            .sqrt()
    }
}
