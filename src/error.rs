use crate::types::{CustomerId, Feature};
use thiserror::Error;

/// Errors returned by this crate. All of them are raised while validating the input,
/// before any calculation starts; a running fit never fails.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// No data points were given.
    #[error("empty input")]
    EmptyInput,

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of data points in the dataset.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// A feature value is NaN or infinite.
    #[error("customer {id} has a non-finite {feature} value")]
    NonFiniteFeature {
        /// Offending customer.
        id: CustomerId,
        /// Offending feature.
        feature: Feature,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
