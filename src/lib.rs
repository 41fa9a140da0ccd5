//! # pkmeans - API documentation
//!
//! pkmeans is a small rust library for k-means clustering of 2-D point sets on a fixed pool of
//! worker threads.
//!
//! ## Design target
//! The point set is split statically across the workers. Every round, each worker assigns the points of
//! its own partition to their nearest centroid, then all workers meet at a barrier. One designated worker
//! recomputes the centroids while the others wait at a second barrier. Whether any worker moved any point
//! is combined at the first barrier, so all workers agree on when to stop. Apart from these two barriers
//! there is no locking and no scheduling involved.
//!
//! Results are deterministic: for the same input and initial centroids, the outcome does not depend on the
//! amount of workers. When a point is exactly as far from several centroids, it binds to the one with the
//! highest index.
//!
//! ## Supported centroid initializations
//! - Random-Sample, using the configured (seedable) random number generator [`KMeans::init_random_sample`]
//! - Precomputed centroids [`KMeans::init_precomputed`]
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use pkmeans::*;
//!
//! let points = vec![Point::new(0.0f32, 0.0), Point::new(0.0, 1.0), Point::new(10.0, 0.0), Point::new(10.0, 1.0)];
//! let kmean = KMeans::new(points, EuclideanDistance);
//! let init = KMeans::init_precomputed(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
//! let result = kmean.kmeans_lloyd(2, 2, init, &KMeansConfig::default()).unwrap();
//!
//! assert_eq!(result.assignments, vec![0, 0, 1, 1]);
//! assert_eq!(result.rounds, 2);
//! assert!(result.converged());
//! ```
//!
//! ## Example (using the status event callbacks)
//! ```rust
//! use pkmeans::*;
//! use rand::prelude::*;
//!
//! let mut rnd = StdRng::seed_from_u64(0);
//! let points: Vec<Point<f32>> = (0..2000).map(|_| Point::new(rnd.gen(), rnd.gen())).collect();
//!
//! let conf = KMeansConfig::build()
//!     .init_done(&|s: &KMeansState<f32>| println!("Initialization completed: {:?}", s.centroids))
//!     .round_done(&|nr, changed, _: &[Point<f32>]| println!("Round {} - changed: {}", nr, changed))
//!     .abort_strategy(AbortStrategy::MaxRounds { rounds: 100 })
//!     .random_generator(rnd)
//!     .build();
//!
//! let kmean = KMeans::new(points, EuclideanDistance);
//! let result = kmean.kmeans_lloyd(9, 4, KMeans::init_random_sample, &conf).unwrap();
//! println!("Rounds: {} ({:?})", result.rounds, result.termination);
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`KMeans`] struct, which takes over the points into its ownership.
//! Calling [`KMeans::kmeans_lloyd`] does not mutate it. Internally, a new instance of [`KMeansState`] stores
//! the state (and finally the result) of a calculation. Size bounds, callbacks, the random number generator
//! and the round cap are set through [`KMeansConfig::build`].
//!
//! All checks on the run parameters happen before any worker thread is started; a rejected run returns a
//! [`KMeansError`] and produces no partial result. The [`io`] module reads datasets and writes the flat
//! result listing.

#[macro_use] mod helpers;
mod memory;
mod api;
mod error;
mod partition;
mod barrier;
mod variants;
mod inits;
mod distances;
mod abort_strategy;
pub mod io;

pub use abort_strategy::{AbortStrategy, Termination};
pub use api::{DistanceFunction, KMeans, KMeansConfig, KMeansConfigBuilder, KMeansState, Limits};
pub use distances::EuclideanDistance;
pub use error::{ConfigError, KMeansError, Result};
pub use memory::{Point, Primitive, UNASSIGNED};
