use rand::prelude::*;
use segment_kmeans::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    // Generate some random data
    let mut rnd = StdRng::seed_from_u64(42);
    let points: Vec<DataPoint<f64>> = (0..20000u64)
        .map(|i| DataPoint::new(i, rnd.gen_range(18.0, 80.0), rnd.gen_range(15000.0, 120000.0), rnd.gen_range(100.0, 5000.0)))
        .collect();

    let conf = KMeansConfig::build()
        .init_done(&|_| println!("Initialization completed."))
        .iteration_done(&|s, nr, new_distsum|
            println!("Iteration {} - Error: {:.2} -> {:.2} | Improvement: {:.2}",
                nr, s.distsum, new_distsum, s.distsum - new_distsum))
        .empty_cluster_policy(EmptyClusterPolicy::ReseedFarthest)
        .build();

    // Calculate kmeans, using kmean++ as initialization-method
    let kmean = KMeans::new(&points).expect("generated points are finite");
    let result = kmean.kmeans_lloyd(8, 300, KMeans::init_kmeanplusplus, &conf).expect("k is smaller than the sample count");

    println!("Phase: {:?} after {} iterations", result.phase, result.iterations);
    println!("Centroids: {:?}", kmean.raw_centroids(&result));
    println!("Cluster sizes: {:?}", result.centroid_frequency);
    println!("Error: {}", result.distsum);
}
