use crate::distances::DistanceFunction;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Enum with possible abort strategies.
/// These strategies specify when a running iteration (with the k-means calculation) is aborted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Primitive")]
pub enum AbortStrategy<T: Primitive> {
	/// This strategy aborts the calculation as soon as no centroid moved farther than `threshold` during one iteration.
	/// ## Fields:
	/// - **threshold**: Maximum distance (`distance <= threshold`) a centroid may move, to be considered as settled
	CentroidShift { threshold: T },
	/// This strategy aborts the calculation directly after an iteration produced no improvement of the distance-sum,
	/// where `improvement > threshold`, for the first time.
	/// ## Fields:
	/// - **threshold**: Threshold, used to detect an improvement (`improvement > threshold`)
	NoImprovement { threshold: T },
}
impl<T: Primitive> Default for AbortStrategy<T> {
	fn default() -> Self {
		AbortStrategy::CentroidShift { threshold: T::from(1e-4).unwrap_or_else(T::epsilon) }
	}
}
impl<T: Primitive> AbortStrategy<T> {
	pub(crate) fn threshold(&self) -> T {
		match *self {
			AbortStrategy::CentroidShift { threshold } | AbortStrategy::NoImprovement { threshold } => threshold,
		}
	}

	pub(crate) fn create_logic<'d, D: DistanceFunction<T>>(&self, distance: &'d D) -> Box<dyn AbortStrategyLogic<T> + 'd> {
		match *self {
			AbortStrategy::CentroidShift { threshold } => Box::new(CentroidShiftLogic { threshold, distance }),
			AbortStrategy::NoImprovement { threshold } => Box::new(NoImprovementLogic {
				threshold,
				prev_error: T::infinity()
			})
		}
	}
}

pub(crate) trait AbortStrategyLogic<T: Primitive> {
	/// Function that has to be called once an iteration of the calculation ended and new centroids were calculated.
	/// ## Arguments
	/// - **previous**: Centroids the iteration started with
	/// - **current**: Centroids the iteration produced
	/// - **error**: The new error (distsum), after the iteration
	/// ## Returns
	/// - **true** if the calculation should continue
	/// - **false** if the calculation should abort
	fn next(&mut self, previous: &[FeatureVector<T>], current: &[FeatureVector<T>], error: T) -> bool;
}

/// Largest distance any centroid moved between **previous** and **current** (paired by index).
pub fn max_centroid_shift<T: Primitive, D: DistanceFunction<T>>(
	previous: &[FeatureVector<T>], current: &[FeatureVector<T>], distance: &D,
) -> T {
	debug_assert_eq!(previous.len(), current.len());
	previous.iter().zip(current.iter())
		.map(|(p, c)| distance.distance(p, c))
		.fold(T::zero(), |acc, d| if d > acc { d } else { acc })
}

/// Convergence check: `true` iff every centroid moved by at most **threshold**.
pub fn has_converged<T: Primitive, D: DistanceFunction<T>>(
	previous: &[FeatureVector<T>], current: &[FeatureVector<T>], threshold: T, distance: &D,
) -> bool {
	previous.iter().zip(current.iter())
		.all(|(p, c)| distance.distance(p, c) <= threshold)
}


pub(crate) struct CentroidShiftLogic<'d, T: Primitive, D: DistanceFunction<T>> {
	threshold: T,
	distance: &'d D
}
impl<'d, T: Primitive, D: DistanceFunction<T>> AbortStrategyLogic<T> for CentroidShiftLogic<'d, T, D> {
	fn next(&mut self, previous: &[FeatureVector<T>], current: &[FeatureVector<T>], _error: T) -> bool {
		!has_converged(previous, current, self.threshold, self.distance)
	}
}


pub(crate) struct NoImprovementLogic<T: Primitive> {
	threshold: T,
	prev_error: T
}
impl<T: Primitive> AbortStrategyLogic<T> for NoImprovementLogic<T> {
	fn next(&mut self, _previous: &[FeatureVector<T>], _current: &[FeatureVector<T>], error: T) -> bool {
		let improvement = self.prev_error - error;
		self.prev_error = error;
		improvement > self.threshold
	}
}
