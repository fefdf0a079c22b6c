//! # segment-kmeans - API documentation
//!
//! segment-kmeans is a small rust library that segments customers into groups with k-means clustering,
//! and turns every group into a human readable profile.
//!
//! ## Design target
//! Customers are described by exactly three numeric features (age, income and purchase amount), so
//! the crate works on fixed-size feature vectors instead of any matrix crate. Features are z-score
//! normalized before clustering, so that income does not dominate the distance.
//! Every calculation is deterministic: it owns a random number generator, seeded from its configuration.
//!
//! ## Supported variants
//! For a list of supported variants, have a look at the documentation of [`KMeans`].
//!
//! ## Supported centroid initializations
//! The outcome of each K-Means run depends on the initialization of its clusters. For a list of implemented
//! initialization methods, see [`KMeans`].
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! Here is an example showing the full k-Means implementation, using K-Mean++ initialization:
//!
//! ```rust
//! use segment_kmeans::*;
//!
//! fn main() {
//!     let points: Vec<DataPoint<f64>> = (0..200u64)
//!         .map(|i| {
//!             let group = (i % 4) as f64;
//!             DataPoint::new(i, 25.0 + group * 12.0, 25000.0 + group * 20000.0, 800.0 + group * 1000.0)
//!         })
//!         .collect();
//!
//!     // Calculate kmeans, using kmean++ as initialization-method
//!     let kmean = KMeans::new(&points).unwrap();
//!     let result = kmean.kmeans_lloyd(4, 300, KMeans::init_kmeanplusplus, &KMeansConfig::default()).unwrap();
//!
//!     println!("Centroids: {:?}", kmean.raw_centroids(&result));
//!     println!("Cluster-Assignments: {:?}", result.assignments);
//!     println!("Converged after {} iterations: {}", result.iterations, result.converged());
//! }
//! ```
//!
//! ## Example (using the status event callbacks)
//! ```rust
//! use segment_kmeans::*;
//!
//! fn main() {
//!     let points: Vec<DataPoint<f64>> = (0..200u64)
//!         .map(|i| DataPoint::new(i, 20.0 + (i % 50) as f64, 20000.0 + (i * 397 % 80000) as f64, 300.0 + (i * 31 % 4000) as f64))
//!         .collect();
//!
//!     let conf = KMeansConfig::build()
//!         .random_seed(7)
//!         .init_done(&|_| println!("Initialization completed."))
//!         .iteration_done(&|s, nr, new_distsum|
//!             println!("Iteration {} - Error: {:.2} -> {:.2} | Improvement: {:.2}",
//!                 nr, s.distsum, new_distsum, s.distsum - new_distsum))
//!         .build();
//!
//!     let kmean = KMeans::new(&points).unwrap();
//!     let result = kmean.kmeans_lloyd(5, 300, KMeans::init_kmeanplusplus, &conf).unwrap();
//!
//!     println!("Cluster-Assignments: {:?}", result.assignments);
//!     println!("Error: {}", result.distsum);
//! }
//! ```
//!
//! ## Example (segmenting customer records)
//! [`segment`] runs the whole flow on raw customer rows: cluster, aggregate every cluster
//! ([`aggregate`]), and interpret it ([`interpret`]).
//!
//! ```rust
//! use segment_kmeans::*;
//!
//! let records: Vec<CustomerRecord> = (0..40u64)
//!     .map(|i| CustomerRecord {
//!         customer_id: i,
//!         age: (if i % 2 == 0 { 24.0 } else { 61.0 }) + (i % 5) as f64,
//!         income: if i % 2 == 0 { 26000.0 } else { 88000.0 },
//!         purchase_amount: if i % 2 == 0 { 700.0 } else { 3900.0 },
//!         gender: None,
//!         region: Some("North".to_string()),
//!     })
//!     .collect();
//! let report = segment(&records, &ClusteringParams { k: 2, ..Default::default() }).unwrap();
//! for cluster in report.clusters.values() {
//!     println!("{}: {}", cluster.profile.name, cluster.profile.recommendations);
//! }
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the clustering is the [`KMeans`] struct. This struct is generic over the underlying primitive
//! type, that should be used for the calculations. To use KMeans, an instance of this struct is created from the
//! data points, normalizing their features (see [`NormalizationStats`]).
//!
//! The [`KMeans`] struct's instance-methods represent the supported k-Means variants & implementations.
//! Calling such a method (e.g. [`KMeans::kmeans_lloyd`]) on the struct does not mutate it, so multiple runs can be
//! done in parallel (the assignment step itself is already parallellized though). Internally, a new instance of
//! [`KMeansState`] is used to store the state (and finally the result) of a K-Means calculation.
//!
//! All of the instance-methods take multiple arguments. One of which is the chosen centroid initialization method. These
//! initialization-method implementations are static methods within the [`KMeans`] struct, which are simply passed in as reference.
//!
//! Logging is done through [`tracing`]; install any subscriber to see per-iteration progress (`debug`),
//! summaries (`info`) and degenerate data such as features without variance or empty clusters (`warn`).

#[macro_use] mod helpers;
mod types;
mod error;
mod normalize;
mod distances;
mod api;
mod variants;
mod inits;
mod abort_strategy;
mod empty_cluster;
mod params;
mod summary;
mod interpret;
mod pipeline;

pub use abort_strategy::{has_converged, max_centroid_shift, AbortStrategy};
pub use api::{KMeans, KMeansConfig, KMeansConfigBuilder, KMeansState, Phase, DEFAULT_RANDOM_SEED};
pub use distances::{DistanceFunction, EuclideanDistance};
pub use empty_cluster::EmptyClusterPolicy;
pub use error::{Error, Result};
pub use interpret::{
    cluster_name, describe, interpret, interpret_all, matching_rule, recommend, AgeCategory, ClusterProfile,
    IncomeCategory, RecommendationRule, SpendingCategory, RECOMMENDATION_RULES,
};
pub use normalize::{normalize, FeatureStats, NormalizationStats};
pub use params::ClusteringParams;
pub use pipeline::{segment, SegmentReport, SegmentationReport};
pub use summary::{aggregate, ClusterAggregateStats, UNKNOWN};
pub use types::{CustomerId, CustomerRecord, DataPoint, Feature, FeatureVector, Primitive, FEATURE_CNT};
