use crate::{error::{ConfigError, Result}, memory::*, AbortStrategy, Termination};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use rand::prelude::*;

pub type InitDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>);
pub type RoundDoneCallbackFn<'a, T> = &'a (dyn Fn(usize, bool, &[Point<T>]) + Sync);

/// Upper bounds for the size of a k-means calculation. Runs exceeding one of these are
/// rejected with a [`ConfigError`] before any worker thread is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_points: usize,
    pub max_clusters: usize,
    pub max_workers: usize
}
impl Default for Limits {
    fn default() -> Self {
        Self { max_points: 4096, max_clusters: 32, max_workers: 32 }
    }
}

/// This is a structure holding various configuration options for the a k-means calculations, such as
/// the random number generator to use, or a couple of callbacks, that can be set to get status information from
/// a running k-means calculation.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
pub struct KMeansConfig<'a, T: Primitive> {
    /// Callback that is called, when the initialization phase finished
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the initialization
    pub(crate) init_done: InitDoneCallbackFn<'a, T>,
    /// Callback that is called on the leading worker after each round's centroid update, while
    /// all other workers are parked at the barrier.
    /// ## Arguments
    /// - **round**: Number of the current round (starting at 1)
    /// - **changed**: Whether any point changed its cluster during this round
    /// - **centroids**: The centroids after the update
    pub(crate) round_done: RoundDoneCallbackFn<'a, T>,
    /// Random number generator to use
    pub(crate) rnd: Box<RefCell<dyn RngCore>>,
    /// The abort-strategy to use for the running calculation
    pub(crate) abort_strategy: AbortStrategy,
    /// Size bounds, validated before the calculation starts
    pub(crate) limits: Limits
}
impl<'a, T: Primitive> Default for KMeansConfig<'a, T> {
    fn default() -> Self {
        Self {
            init_done: &|_| {},
            round_done: &|_,_,_| {},
            rnd: Box::new(RefCell::new(rand::thread_rng())),
            abort_strategy: AbortStrategy::UntilStable,
            limits: Limits::default()
        }
    }
}
impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig")
            .field("abort_strategy", &self.abort_strategy)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the callback that should be called after the centroid initialization, before the first round starts.
    pub fn init_done(mut self, init_done: InitDoneCallbackFn<'a, T>) -> Self {
        self.config.init_done = init_done; self
    }
    /// Set the callback that should be called after each round during a running k-means calculation.
    pub fn round_done(mut self, round_done: RoundDoneCallbackFn<'a, T>) -> Self {
        self.config.round_done = round_done; self
    }
    /// Set the random number generator that should be used in the k-means calculation.
    /// Use a seeded generator for deterministically repeatable results.
    pub fn random_generator<R: RngCore + 'static>(mut self, rnd: R) -> Self {
        self.config.rnd = Box::new(RefCell::new(rnd)); self
    }
    /// Set the abort-strategy to use during a running k-means calculation. For more information,
    /// see documentation of [`AbortStrategy`].
    /// ## Default
    /// [`AbortStrategy::UntilStable`]
    pub fn abort_strategy(mut self, abort_strategy: AbortStrategy) -> Self {
        self.config.abort_strategy = abort_strategy; self
    }
    /// Set the size bounds a calculation has to stay within.
    /// ## Default
    /// 4096 points, 32 clusters, 32 workers
    pub fn limits(mut self, limits: Limits) -> Self {
        self.config.limits = limits; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> { self.config }
}


/// This is the internally used data-structure, storing the current state during calculation, as
/// well as the final result, as returned by the API.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters that were requested when calculating this k-means result
/// - **rounds**: Amount of completed rounds (assignment + centroid update)
/// - **termination**: How the calculation ended (`None` until it did)
/// - **centroids**: Calculated cluster centers
/// - **centroid_frequency**: Amount of samples in each centroid
/// - **assignments**: Vector mapping each sample to its respective nearest cluster ([`UNASSIGNED`] before the first round)
#[derive(Clone, Debug)]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub rounds: usize,
    pub termination: Option<Termination>,
    pub centroids: Vec<Point<T>>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_cnt: usize, k: usize) -> Self {
        Self {
            k,
            rounds: 0,
            termination: None,
            centroids: vec![Point::default();k],
            centroid_frequency: vec![0usize;k],
            assignments: vec![UNASSIGNED;sample_cnt]
        }
    }

    /// Whether the last round left every assignment untouched.
    pub fn converged(&self) -> bool {
        self.termination == Some(Termination::Converged)
    }
}


/// Distance metric used to find a sample's nearest centroid.
pub trait DistanceFunction<T: Primitive>: Sync {
    fn distance(&self, a: &Point<T>, b: &Point<T>) -> T;
}


/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the points you want to operate on. The primitive type
/// of the passed points will be the type used internaly for all calculations, as well as the result
/// as stored in the returned [`KMeansState`] structure.
///
/// ## Supported variants
/// - Barrier-synchronized parallel k-Means (Lloyd) [`KMeans::kmeans_lloyd`]
///
/// ## Supported initialization methods
/// - Random-Sample [`KMeans::init_random_sample`]
/// - Precomputed [`KMeans::init_precomputed`]
pub struct KMeans<T: Primitive, D: DistanceFunction<T>> {
    pub(crate) samples: Vec<Point<T>>,
    pub(crate) distance: D
}
impl<T: Primitive, D: DistanceFunction<T>> KMeans<T, D> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: The points to cluster. Their order is kept in every result.
    /// - **distance**: The metric used to find the nearest centroid
    pub fn new(samples: Vec<Point<T>>, distance: D) -> Self {
        Self { samples, distance }
    }

    pub fn samples(&self) -> &[Point<T>] { &self.samples }

    pub fn sample_cnt(&self) -> usize { self.samples.len() }

    pub(crate) fn validate(&self, k: usize, workers: usize, limits: &Limits) -> std::result::Result<(), ConfigError> {
        let sample_cnt = self.sample_cnt();
        if sample_cnt == 0 {
            return Err(ConfigError::EmptyDataset);
        }
        if sample_cnt > limits.max_points {
            return Err(ConfigError::TooManyPoints { sample_cnt, max: limits.max_points });
        }
        if let Some(index) = self.samples.iter().position(|s| !s.x.is_finite() || !s.y.is_finite()) {
            return Err(ConfigError::NonFiniteCoordinate { index });
        }
        if k == 0 {
            return Err(ConfigError::NoClusters);
        }
        if k > limits.max_clusters {
            return Err(ConfigError::TooManyClusters { k, max: limits.max_clusters });
        }
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if workers > limits.max_workers {
            return Err(ConfigError::TooManyWorkers { workers, max: limits.max_workers });
        }
        Ok(())
    }

    /// Index of the centroid nearest to **sample**. Centroids are scanned in increasing index order
    /// and a candidate wins whenever it is at least as close as the best so far, so exact ties
    /// resolve to the highest index. Any non-empty **centroids** yields a valid index, even when
    /// distances are not comparable.
    pub(crate) fn nearest_centroid(&self, sample: &Point<T>, centroids: &[Point<T>]) -> usize {
        let mut distances = centroids.iter()
            .map(|c| self.distance.distance(sample, c))
            .enumerate();
        match distances.next() {
            Some(first) => distances.fold(first, |best, cur| if cur.1 <= best.1 { cur } else { best }).0,
            None => UNASSIGNED
        }
    }

    /// Assignment phase of one worker: move every sample in **range** to its nearest centroid.
    /// ## Arguments
    /// - **range**: Sample indices owned by the worker
    /// - **slots**: The assignment slots of exactly these samples
    /// ## Returns
    /// Whether at least one sample changed its cluster
    pub(crate) fn update_cluster_assignments(&self, range: Range<usize>, slots: &[AtomicUsize], centroids: &[Point<T>]) -> bool {
        debug_assert_eq!(range.len(), slots.len());
        self.samples[range].iter()
            .zip(slots)
            .fold(false, |changed, (s, slot)| {
                let new_centroid = self.nearest_centroid(s, centroids);
                let prev_centroid = slot.load(Ordering::Relaxed);
                slot.store(new_centroid, Ordering::Relaxed);
                changed | (prev_centroid != new_centroid)
            })
    }

    /// Parallel k-Means (Lloyd) on a fixed pool of **workers** threads.
    ///
    /// Every round, each worker reassigns the points of its static partition to their nearest centroid.
    /// After a first barrier, worker 0 recomputes all centroids from the new assignments, while the others
    /// wait on a second barrier. The calculation ends after the first round in which no worker changed
    /// any assignment (or when the configured [`AbortStrategy`] gives up).
    ///
    /// ## Arguments
    /// - **k**: Amount of clusters to search for
    /// - **workers**: Amount of worker threads to use (at least 1)
    /// - **init**: Initialization-Method to use for the initialization of the **k** centroids
    /// - **config**: [`KMeansConfig`] instance, containing several configuration options for the calculation.
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final state (result), or the reason the run was rejected.
    ///
    /// ## Panics
    /// Re-raises a panic of the **config** callbacks or of the distance function, after every worker left
    /// its round loop.
    ///
    /// ## Example
    /// ```rust
    /// use pkmeans::*;
    /// use rand::prelude::*;
    ///
    /// let points = vec![Point::new(0.0f32, 0.0), Point::new(0.0, 1.0), Point::new(10.0, 0.0), Point::new(10.0, 1.0)];
    /// let conf = KMeansConfig::build().random_generator(StdRng::seed_from_u64(0)).build();
    ///
    /// let kmean = KMeans::new(points, EuclideanDistance);
    /// let result = kmean.kmeans_lloyd(2, 2, KMeans::init_random_sample, &conf).unwrap();
    ///
    /// println!("Centroids: {:?}", result.centroids);
    /// println!("Cluster-Assignments: {:?}", result.assignments);
    /// println!("Rounds: {}", result.rounds);
    /// ```
    pub fn kmeans_lloyd<'a, F>(&self, k: usize, workers: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where for<'c> F: FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &KMeansConfig<'c, T>) -> Result<()> {
        crate::variants::Lloyd::calculate(self, k, workers, init, config)
    }

    /// Random sample initialization method (a.k.a. Forgy)
    ///
    /// ## Description
    /// This initialization method randomly selects k distinct samples as initial centroids, using
    /// the configured random number generator.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to an instance-method of [`KMeans`].
    pub fn init_random_sample<'a>(kmean: &KMeans<T, D>, state: &mut KMeansState<T>, config: &KMeansConfig<'a, T>) -> Result<()> {
        crate::inits::randomsample::calculate(kmean, state, config)
    }

    /// Precomputed initialization method
    ///
    /// ## Description
    /// Uses the given **centroids** as initial centroids. Their amount has to match the requested k.
    pub fn init_precomputed(centroids: Vec<Point<T>>) -> impl FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &KMeansConfig<'_, T>) -> Result<()> {
        move |kmean, state, config| crate::inits::precomputed::calculate(kmean, state, config, centroids)
    }
}
