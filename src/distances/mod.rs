mod euclideandistance;

use crate::types::Primitive;

pub use euclideandistance::EuclideanDistance;

/// A metric over feature vectors. Used by the seeding, the assignment step and the convergence check.
pub trait DistanceFunction<T: Primitive>: Sync + Send {
    fn distance(&self, a: &[T], b: &[T]) -> T;
}
