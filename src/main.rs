use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use pkmeans::*;
use rand::prelude::*;

/// Cluster the 2-D points of a data file with k-means on a fixed pool of worker threads.
///
/// The result listing (`x y cluster` per point, in input order) goes to stdout unless an
/// output file is given.
#[derive(Parser, Debug)]
#[command(name = "pkmeans", version)]
struct Args {
    /// File with whitespace separated `x y` pairs
    #[arg(value_name = "DATA_FILE")]
    data: PathBuf,

    /// Amount of clusters
    #[arg(short, long = "clusters", default_value_t = 9)]
    k: usize,

    /// Amount of worker threads
    #[arg(short, long, default_value_t = available_workers())]
    workers: usize,

    /// Seed of the random number generator that picks the initial centroids
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop after this many rounds even if points are still moving
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Write the result listing to this file instead of stdout
    #[arg(short, long, value_name = "RESULT_FILE")]
    output: Option<PathBuf>
}

fn available_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn run(args: &Args) -> pkmeans::Result<KMeansState<f32>> {
    let points: Vec<Point<f32>> = pkmeans::io::read_points(BufReader::new(File::open(&args.data)?))?;
    info!("read {} points from {}", points.len(), args.data.display());

    let abort_strategy = match args.max_rounds {
        Some(rounds) => AbortStrategy::MaxRounds { rounds },
        None => AbortStrategy::UntilStable
    };
    let conf = KMeansConfig::build()
        .random_generator(StdRng::seed_from_u64(args.seed))
        .abort_strategy(abort_strategy)
        .build();

    let kmean = KMeans::new(points, EuclideanDistance);
    let result = kmean.kmeans_lloyd(args.k, args.workers, KMeans::init_random_sample, &conf)?;
    info!("number of rounds taken = {}", result.rounds);

    match &args.output {
        Some(path) => pkmeans::io::write_results(BufWriter::new(File::create(path)?), kmean.samples(), &result.assignments)?,
        None => pkmeans::io::write_results(std::io::stdout().lock(), kmean.samples(), &result.assignments)?
    }
    Ok(result)
}

fn main() -> ExitCode {
    // Usage errors exit with code 2 from within clap
    let args = Args::parse();
    env_logger::init_from_env(Env::default().filter_or("RUST_LOG", "info"));

    match run(&args) {
        Ok(result) => {
            if let Some(Termination::RoundLimit) = result.termination {
                info!("result is the assignment after the round limit, not a fixed point");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let mut msg = err.to_string();
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                msg.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}
