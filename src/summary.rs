use crate::helpers::round_to;
use crate::types::{CustomerId, CustomerRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Rendering of a dominant categorical attribute when the records do not carry it.
pub const UNKNOWN: &str = "Unknown";

/// Per-cluster statistics over the raw customer rows, the input of the cluster interpretation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterAggregateStats {
    pub cluster_id: usize,
    pub customer_count: usize,
    pub avg_age: f64,
    pub age_min: f64,
    pub age_max: f64,
    pub avg_income: f64,
    pub income_min: f64,
    pub income_max: f64,
    pub avg_purchase_amount: f64,
    pub purchase_min: f64,
    pub purchase_max: f64,
    pub dominant_gender: String,
    pub dominant_region: String,
}

/// Most frequent value. Ties go to the smallest value; missing values form a group of their own,
/// sorting before every present one.
fn dominant<'r>(values: impl Iterator<Item = Option<&'r str>>) -> String {
    let mut counts: BTreeMap<Option<&str>, usize> = BTreeMap::new();
    values.for_each(|v| *counts.entry(v).or_insert(0) += 1);
    let mut best: Option<(Option<&str>, usize)> = None;
    for (value, cnt) in counts {
        // BTreeMap iterates in ascending order, so only a strictly higher count replaces the best
        if best.map_or(true, |(_, best_cnt)| cnt > best_cnt) {
            best = Some((value, cnt));
        }
    }
    match best {
        Some((Some(value), _)) => value.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Aggregate **records** per cluster, as labeled by **labels**.
///
/// Returns one entry per cluster index below **k** that has at least one member. Records without a label,
/// or with a label outside of `0..k`, are skipped with a warning.
pub fn aggregate(records: &[CustomerRecord], labels: &BTreeMap<CustomerId, usize>, k: usize) -> BTreeMap<usize, ClusterAggregateStats> {
    let mut members: Vec<Vec<&CustomerRecord>> = vec![Vec::new(); k];
    for record in records {
        match labels.get(&record.customer_id) {
            Some(&cluster) if cluster < k => members[cluster].push(record),
            label => warn!(customer = record.customer_id, ?label, "skipping customer without a valid cluster label"),
        }
    }

    members.into_iter().enumerate()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(cluster_id, rows)| {
            let cnt = rows.len() as f64;
            let avg = |f: fn(&CustomerRecord) -> f64| round_to(rows.iter().map(|r| f(r)).sum::<f64>() / cnt, 2);
            let (age_min, age_max) = min_max(rows.iter().map(|r| r.age));
            let (income_min, income_max) = min_max(rows.iter().map(|r| r.income));
            let (purchase_min, purchase_max) = min_max(rows.iter().map(|r| r.purchase_amount));
            let stats = ClusterAggregateStats {
                cluster_id,
                customer_count: rows.len(),
                avg_age: avg(|r| r.age),
                age_min,
                age_max,
                avg_income: avg(|r| r.income),
                income_min: round_to(income_min, 2),
                income_max: round_to(income_max, 2),
                avg_purchase_amount: avg(|r| r.purchase_amount),
                purchase_min: round_to(purchase_min, 2),
                purchase_max: round_to(purchase_max, 2),
                dominant_gender: dominant(rows.iter().map(|r| r.gender.as_deref())),
                dominant_region: dominant(rows.iter().map(|r| r.region.as_deref())),
            };
            (cluster_id, stats)
        })
        .collect()
}
