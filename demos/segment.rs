use rand::prelude::*;
use segment_kmeans::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Generate some customers around a couple of typical profiles
    let profiles = [(24.0, 24000.0, 900.0), (38.0, 46000.0, 2100.0), (52.0, 64000.0, 2900.0), (67.0, 88000.0, 4300.0)];
    let regions = ["North", "South", "East", "West"];
    let mut rnd = StdRng::seed_from_u64(1337);
    let records: Vec<CustomerRecord> = (0..2000u64)
        .map(|i| {
            let (age, income, purchase) = profiles[rnd.gen_range(0, profiles.len())];
            CustomerRecord {
                customer_id: i,
                age: (age + rnd.gen_range(-6.0f64, 6.0)).round(),
                income: income + rnd.gen_range(-8000.0f64, 8000.0),
                purchase_amount: purchase + rnd.gen_range(-400.0f64, 400.0),
                gender: Some(if rnd.gen::<bool>() { "Female" } else { "Male" }.to_string()),
                region: Some(regions[rnd.gen_range(0, regions.len())].to_string()),
            }
        })
        .collect();

    let params = ClusteringParams { k: 4, ..Default::default() };
    let report = match segment(&records, &params) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Segmentation failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("Converged: {} after {} iterations", report.converged, report.iterations);
    for (idx, cluster) in report.clusters.iter() {
        println!("\nCluster {}: {}", idx, cluster.profile.name);
        println!("  {}", cluster.profile.description);
        println!("  Dominant gender: {}, dominant region: {}", cluster.stats.dominant_gender, cluster.stats.dominant_region);
        println!("  Recommendations: {}", cluster.profile.recommendations);
    }
}
