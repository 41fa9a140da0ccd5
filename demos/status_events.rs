use pkmeans::*;
use rand::prelude::*;

fn main() {
    let (sample_cnt, k, workers) = (4000, 9, 4);

    // Generate some random data
    let mut rnd = StdRng::seed_from_u64(0);
    let samples: Vec<Point<f32>> = (0..sample_cnt).map(|_| Point::new(rnd.gen_range(0.0, 100.0), rnd.gen_range(0.0, 100.0))).collect();

    let conf = KMeansConfig::build()
        .init_done(&|s: &KMeansState<f32>| println!("Initialization completed: {:?}", s.centroids))
        .round_done(&|nr, changed, centroids: &[Point<f32>]|
            println!("Round {} - changed: {} | first centroid: ({:.2}, {:.2})",
                nr, changed, centroids[0].x, centroids[0].y))
        .abort_strategy(AbortStrategy::MaxRounds { rounds: 200 })
        .random_generator(rnd)
        .build();

    // Calculate kmeans, using a random sample of the points as initial centroids
    let kmean = KMeans::new(samples, EuclideanDistance);
    let result = match kmean.kmeans_lloyd(k, workers, KMeans::init_random_sample, &conf) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("clustering failed: {}", err);
            return;
        }
    };

    println!("Centroids: {:?}", result.centroids);
    println!("Cluster sizes: {:?}", result.centroid_frequency);
    println!("Rounds: {} ({:?})", result.rounds, result.termination);
}
