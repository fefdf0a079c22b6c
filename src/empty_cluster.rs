use serde::{Deserialize, Serialize};

/// What the update step does with a centroid that did not get any samples assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyClusterPolicy {
    /// Keep the centroid where it was. The cluster only recovers members if other centroids move away
    /// from points that are then closer to the frozen one.
    Freeze,
    /// Move the sample with the largest distance to its centroid (taken from a cluster that keeps at
    /// least one other member) into the empty cluster, and use it as the cluster's centroid.
    ReseedFarthest,
}
impl Default for EmptyClusterPolicy {
    fn default() -> Self { EmptyClusterPolicy::Freeze }
}
