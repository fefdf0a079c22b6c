use num::{Float, NumCast, Zero};
use rand::distributions::uniform::SampleUniform;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, LowerExp},
    iter::Sum,
    ops::{AddAssign, SubAssign},
};

pub trait Primitive: AddAssign + SubAssign + Sum + Zero + Float + NumCast + SampleUniform
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp
                + Serialize + DeserializeOwned + 'static {}
impl Primitive for f32 {}
impl Primitive for f64 {}

/// Identifier of a customer row, as handed in by the data source.
pub type CustomerId = u64;

/// Amount of features every [`DataPoint`] carries.
pub const FEATURE_CNT: usize = 3;

/// One (raw or normalized) position in feature space: `[age, income, purchase_amount]`.
pub type FeatureVector<T> = [T; FEATURE_CNT];

/// The features used for clustering, in the order they are stored within a [`FeatureVector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    Income,
    PurchaseAmount,
}
impl Feature {
    pub const ALL: [Feature; FEATURE_CNT] = [Feature::Age, Feature::Income, Feature::PurchaseAmount];

    pub fn index(self) -> usize {
        match self {
            Feature::Age => 0,
            Feature::Income => 1,
            Feature::PurchaseAmount => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Income => "income",
            Feature::PurchaseAmount => "purchase_amount",
        }
    }
}
impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A customer, reduced to its identifier and the clustered features.
///
/// Data points are never mutated once built; normalization produces new instances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Primitive")]
pub struct DataPoint<T: Primitive> {
    pub id: CustomerId,
    pub features: FeatureVector<T>,
}
impl<T: Primitive> DataPoint<T> {
    pub fn new(id: CustomerId, age: T, income: T, purchase_amount: T) -> Self {
        Self { id, features: [age, income, purchase_amount] }
    }

    pub fn feature(&self, feature: Feature) -> T {
        self.features[feature.index()]
    }
}

/// A full customer row as delivered by the data source. Besides the clustered
/// features, it carries the categorical attributes used for the per-cluster statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub age: f64,
    pub income: f64,
    pub purchase_amount: f64,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}
impl From<&CustomerRecord> for DataPoint<f64> {
    fn from(record: &CustomerRecord) -> Self {
        DataPoint::new(record.customer_id, record.age, record.income, record.purchase_amount)
    }
}
