use thiserror::Error;

/// Errors produced while preparing or running a clustering.
#[derive(Debug, Error)]
pub enum KMeansError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("could not staff a worker pool of {workers} threads")]
    ThreadCreation {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError
    },
    #[error("malformed dataset at line {line}: {reason}")]
    Dataset { line: usize, reason: String },
    #[error("a worker left the round loop before the calculation finished")]
    WorkerAborted,
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// Rejected run parameters. All of these are detected before any worker thread is started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the dataset contains no points")]
    EmptyDataset,
    #[error("{sample_cnt} points exceed the maximum of {max}")]
    TooManyPoints { sample_cnt: usize, max: usize },
    #[error("point {index} has a coordinate that is not a finite number")]
    NonFiniteCoordinate { index: usize },
    #[error("at least one cluster is required")]
    NoClusters,
    #[error("{k} clusters exceed the maximum of {max}")]
    TooManyClusters { k: usize, max: usize },
    #[error("cannot sample {k} distinct initial centroids from {sample_cnt} points")]
    MoreClustersThanPoints { k: usize, sample_cnt: usize },
    #[error("at least one worker is required")]
    NoWorkers,
    #[error("{workers} workers exceed the maximum of {max}")]
    TooManyWorkers { workers: usize, max: usize },
    #[error("expected {expected} initial centroids, got {actual}")]
    CentroidCountMismatch { expected: usize, actual: usize },
    #[error("initial centroid {index} has a coordinate that is not a finite number")]
    NonFiniteCentroid { index: usize }
}

pub type Result<T> = std::result::Result<T, KMeansError>;
