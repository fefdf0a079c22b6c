use crate::error::{Error, Result};
use crate::{DistanceFunction, FeatureVector, KMeans, KMeansState, Primitive};

#[inline(always)]
pub fn calculate<T, D>(
    _kmean: &KMeans<T, D>, state: &mut KMeansState<T>, computed: Vec<FeatureVector<T>>,
) -> Result<()> where
    T: Primitive,
    D: DistanceFunction<T>,
{
    if computed.len() != state.k {
        return Err(Error::InvalidParameter {
            name: "centroids",
            message: format!("{} precomputed centroids given, but k is {}", computed.len(), state.k),
        });
    }
    computed.iter().enumerate().for_each(|(ci, c)| state.set_centroid(ci, c));
    Ok(())
}
