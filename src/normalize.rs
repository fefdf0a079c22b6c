use crate::error::{Error, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean and standard deviation of one feature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Primitive")]
pub struct FeatureStats<T: Primitive> {
    pub mean: T,
    /// Population standard deviation. Is `1` for a feature without variance, so that it can always be divided by.
    pub std_dev: T,
}

/// Per-feature statistics used for z-score normalization, computed once from the full input set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Primitive")]
pub struct NormalizationStats<T: Primitive> {
    pub features: [FeatureStats<T>; FEATURE_CNT],
}
impl<T: Primitive> NormalizationStats<T> {
    /// Calculate the statistics over all given points.
    ///
    /// ## Errors
    /// - [`Error::EmptyInput`] if **points** is empty
    /// - [`Error::NonFiniteFeature`] if any feature value is NaN or infinite
    pub fn fit(points: &[DataPoint<T>]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }
        for p in points {
            if let Some(f) = Feature::ALL.iter().find(|f| !p.feature(**f).is_finite()) {
                return Err(Error::NonFiniteFeature { id: p.id, feature: *f });
            }
        }

        let cnt = T::from(points.len()).unwrap_or_else(T::nan);
        let mut features = [FeatureStats { mean: T::zero(), std_dev: T::one() }; FEATURE_CNT];
        for feature in Feature::ALL.iter().cloned() {
            let mean = points.iter().map(|p| p.feature(feature)).sum::<T>() / cnt;
            let variance = points.iter()
                .map(|p| p.feature(feature) - mean)
                .map(|d| d * d)
                .sum::<T>() / cnt;
            let mut std_dev = variance.sqrt();
            if std_dev == T::zero() {
                warn!(%feature, %mean, "feature has no variance, scaling it by 1");
                std_dev = T::one();
            }
            features[feature.index()] = FeatureStats { mean, std_dev };
        }
        Ok(Self { features })
    }

    pub fn feature(&self, feature: Feature) -> FeatureStats<T> {
        self.features[feature.index()]
    }

    /// Map a raw feature vector to z-scores.
    pub fn normalize(&self, raw: &FeatureVector<T>) -> FeatureVector<T> {
        let mut out = *raw;
        out.iter_mut().zip(self.features.iter())
            .for_each(|(v, s)| *v = (*v - s.mean) / s.std_dev);
        out
    }

    /// Map a normalized feature vector (e.g. a centroid) back to raw units.
    pub fn denormalize(&self, normalized: &FeatureVector<T>) -> FeatureVector<T> {
        let mut out = *normalized;
        out.iter_mut().zip(self.features.iter())
            .for_each(|(v, s)| *v = *v * s.std_dev + s.mean);
        out
    }

    /// Produce normalized copies of **points**, keeping their identifiers and order.
    pub fn transform(&self, points: &[DataPoint<T>]) -> Vec<DataPoint<T>> {
        points.iter()
            .map(|p| DataPoint { id: p.id, features: self.normalize(&p.features) })
            .collect()
    }
}

/// Compute the [`NormalizationStats`] of **points** and return them along with the normalized points.
pub fn normalize<T: Primitive>(points: &[DataPoint<T>]) -> Result<(NormalizationStats<T>, Vec<DataPoint<T>>)> {
    let stats = NormalizationStats::fit(points)?;
    let normalized = stats.transform(points);
    Ok((stats, normalized))
}
