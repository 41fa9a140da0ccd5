use crate::{
    barrier::{AbortOnUnwind, RoundBarrier}, error::{KMeansError, Result}, memory::*, partition::Partition,
    abort_strategy::Verdict, AbortStrategy, DistanceFunction, KMeans, KMeansConfig, KMeansState, Termination
};
use crate::api::RoundDoneCallbackFn;
use log::{debug, info, warn};

/// Worker that recomputes the centroids between the two barriers of every round.
const LEADER: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RoundOutcome {
    rounds: usize,
    termination: Termination
}

/// Everything a worker needs to take part in the rounds of one calculation.
struct Round<'r, T: Primitive, D: DistanceFunction<T>> {
    kmean: &'r KMeans<T, D>,
    partition: &'r Partition,
    arena: &'r RoundArena<T>,
    barrier: &'r RoundBarrier,
    abort_strategy: AbortStrategy,
    round_done: RoundDoneCallbackFn<'r, T>
}

pub(crate) struct Lloyd<T, D> {
    _p: std::marker::PhantomData<(T, D)>
}
impl<T: Primitive, D: DistanceFunction<T>> Lloyd<T, D> {
    /// Recompute every centroid as the mean of the samples currently assigned to it.
    /// Centroids without any sample keep their previous position.
    /// ## Returns
    /// The amount of samples assigned to each centroid
    fn update_centroids(samples: &[Point<T>], assignments: impl Iterator<Item = usize>, centroids: &mut [Point<T>]) -> Vec<usize> {
        let mut sums = vec![Point::<T>::default(); centroids.len()];
        let mut centroid_frequency = vec![0usize; centroids.len()];
        samples.iter()
            .zip(assignments)
            .for_each(|(s, centroid_id)| {
                sums[centroid_id].x += s.x;
                sums[centroid_id].y += s.y;
                centroid_frequency[centroid_id] += 1;
            });

        centroids.iter_mut()
            .zip(sums)
            .zip(centroid_frequency.iter().cloned())
            .filter(|(_, cfreq)| *cfreq > 0)
            .for_each(|((c, sum), cfreq)| {
                let cfreq = T::from(cfreq).unwrap();
                c.x = sum.x / cfreq;
                c.y = sum.y / cfreq;
            });
        centroid_frequency
    }

    /// Round loop of a single worker. All workers run this in lockstep.
    /// ## Returns
    /// How the loop ended, plus the final cluster sizes on the leader. `None` when another worker
    /// unwound out of its loop and the barrier was aborted.
    fn run_worker(worker_id: usize, round: &Round<'_, T, D>) -> Option<(RoundOutcome, Vec<usize>)> {
        // A panicking worker must not leave its peers parked at a barrier
        let _abort_guard = AbortOnUnwind(round.barrier);

        let range = round.partition.range(worker_id);
        let slots = round.arena.partition(range.clone());
        let mut abort_strategy = round.abort_strategy.create_logic();
        let mut centroid_frequency = Vec::new();

        let mut nr = 0;
        loop {
            nr += 1;

            // Assignment: only this worker's slots are written, centroids are only read
            let changed = {
                let centroids = round.arena.centroids();
                round.kmean.update_cluster_assignments(range.clone(), slots, &centroids)
            };
            // Every slot is written and every worker knows whether anybody changed anything
            let changed = round.barrier.wait(changed)?;

            if worker_id == LEADER {
                let mut centroids = round.arena.centroids_mut();
                centroid_frequency = Self::update_centroids(&round.kmean.samples, round.arena.assignments(), &mut centroids);
                let empty = centroid_frequency.iter().filter(|&&cfreq| cfreq == 0).count();
                debug!("round {}: changed={}, empty clusters={}", nr, changed, empty);
                (round.round_done)(nr, changed, &centroids);
            }
            // Updated centroids are visible to everybody
            round.barrier.wait(false)?;

            if let Verdict::Stop(termination) = abort_strategy.next(changed) {
                break Some((RoundOutcome { rounds: nr, termination }, centroid_frequency));
            }
        }
    }

    pub fn calculate<'a, F>(kmean: &KMeans<T, D>, k: usize, workers: usize, init: F, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>>
                where for<'c> F: FnOnce(&KMeans<T, D>, &mut KMeansState<T>, &KMeansConfig<'c, T>) -> Result<()> {
        kmean.validate(k, workers, &config.limits)?;

        let mut state = KMeansState::new(kmean.sample_cnt(), k);

        // Initialize clusters and notify subscriber
        init(kmean, &mut state, config)?;
        (config.init_done)(&state);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pkmeans-worker-{}", i))
            .build()
            .map_err(|source| KMeansError::ThreadCreation { workers, source })?;

        let partition = Partition::new(kmean.sample_cnt(), workers);
        let arena = RoundArena::new(&state.assignments, std::mem::take(&mut state.centroids));
        let barrier = RoundBarrier::new(workers);
        let round = Round {
            kmean,
            partition: &partition,
            arena: &arena,
            barrier: &barrier,
            abort_strategy: config.abort_strategy,
            round_done: config.round_done
        };
        debug!("starting {} workers on {} points, k={}", workers, kmean.sample_cnt(), k);

        // Every pool thread runs the round loop exactly once, with its pool index as worker id.
        // A panic on any worker is re-raised here once all of them returned.
        let mut outcomes = pool.broadcast(|ctx| Self::run_worker(ctx.index(), &round));
        debug_assert!(outcomes.windows(2).all(|o| o[0].as_ref().map(|o| o.0) == o[1].as_ref().map(|o| o.0)));
        let (RoundOutcome { rounds, termination }, centroid_frequency) = outcomes.swap_remove(LEADER)
            .ok_or(KMeansError::WorkerAborted)?;

        let (assignments, centroids) = arena.into_parts();
        state.assignments = assignments;
        state.centroids = centroids;
        state.centroid_frequency = centroid_frequency;
        state.rounds = rounds;
        state.termination = Some(termination);

        let used_centroids_cnt = state.centroid_frequency.iter().filter(|&&cfreq| cfreq > 0).count();
        match termination {
            Termination::Converged => info!("converged after {} rounds ({} of {} clusters in use)", rounds, used_centroids_cnt, k),
            Termination::RoundLimit => warn!("stopped after {} rounds without converging", rounds)
        }
        Ok(state)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{helpers::testing, EuclideanDistance};
    use rand::prelude::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Mutex;

    #[test]
    fn two_pairs_converge_in_two_rounds() {
        for workers in 1..=5 {
            let rounds_seen = Mutex::new(Vec::new());
            let round_done = |nr: usize, changed: bool, centroids: &[Point<f32>]| {
                rounds_seen.lock().unwrap().push((nr, changed, centroids.to_vec()));
            };
            let conf = KMeansConfig::<f32>::build().round_done(&round_done).build();
            let res = testing::run_precomputed(testing::two_pairs(), vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], workers, &conf);

            assert_eq!(res.assignments, vec![0, 0, 1, 1]);
            assert_eq!(res.centroids, vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)]);
            assert_eq!(res.centroid_frequency, vec![2, 2]);
            assert_eq!(res.rounds, 2);
            assert_eq!(res.termination, Some(Termination::Converged));

            let halves = vec![Point::new(0.0, 0.5), Point::new(10.0, 0.5)];
            assert_eq!(*rounds_seen.lock().unwrap(), vec![(1, true, halves.clone()), (2, false, halves)]);
        }
    }

    #[test]
    fn empty_cluster_handling() {
        let samples = vec![Point::new(1.0f64, 0.0), Point::new(2.0, 0.0), Point::new(3.0, 0.0)];
        let far_away = Point::new(1337.0f64, 0.1);
        let res = testing::run_precomputed(samples, vec![Point::new(2.0, 0.0), far_away], 2, &KMeansConfig::default());

        assert_eq!(&res.assignments, &[0, 0, 0]);
        assert_eq!(res.centroids[0], Point::new(2.0, 0.0));
        assert_eq!(res.centroids[1].x.to_bits(), far_away.x.to_bits());
        assert_eq!(res.centroids[1].y.to_bits(), far_away.y.to_bits());
        assert_eq!(&res.centroid_frequency, &[3, 0]);
        assert!(res.converged());
    }

    #[test]
    fn tie_binds_to_higher_index() {
        for _ in 0..20 {
            let res = testing::run_precomputed(vec![Point::new(0.0f32, 0.0)], vec![Point::new(-1.0, 0.0), Point::new(1.0, 0.0)], 1, &KMeansConfig::default());
            assert_eq!(res.assignments, vec![1]);
            assert_eq!(res.centroids, vec![Point::new(-1.0, 0.0), Point::new(0.0, 0.0)]);
        }
    }

    #[test]
    fn update_centroids_matches_means() {
        let mut rnd = StdRng::seed_from_u64(42);
        let k = 6;
        let samples: Vec<Point<f64>> = (0..300).map(|_| Point::new(rnd.gen_range(0.0, 1.0), rnd.gen_range(0.0, 1.0))).collect();
        // cluster 5 stays empty
        let assignments: Vec<usize> = (0..samples.len()).map(|_| rnd.gen_range(0, k - 1)).collect();
        let before = vec![Point::new(0.25, 0.75); k];
        let mut centroids = before.clone();

        let frequency = Lloyd::<f64, EuclideanDistance>::update_centroids(&samples, assignments.iter().cloned(), &mut centroids);

        assert_eq!(frequency.len(), k);
        assert_eq!(frequency[k - 1], 0);
        assert_eq!(frequency.iter().sum::<usize>(), samples.len());
        for (ci, mean) in testing::cluster_means(&samples, &assignments, k).into_iter().enumerate() {
            match mean {
                Some(mean) => {
                    assert_approx_eq!(centroids[ci].x, mean.x, 1e-12);
                    assert_approx_eq!(centroids[ci].y, mean.y, 1e-12);
                }
                None => assert_eq!(centroids[ci], before[ci])
            }
        }
    }

    #[test]
    fn converged_state_is_a_fixed_point() {
        let mut rnd = StdRng::seed_from_u64(3);
        let samples: Vec<Point<f32>> = (0..400).map(|_| Point::new(rnd.gen_range(-10.0, 10.0), rnd.gen_range(-10.0, 10.0))).collect();
        let conf = KMeansConfig::build().random_generator(rnd).build();
        let kmean = KMeans::new(samples, EuclideanDistance);
        let first = kmean.kmeans_lloyd(5, 3, KMeans::init_random_sample, &conf).unwrap();
        assert!(first.converged());

        // Rerunning from the converged centroids keeps everything in place
        let second = kmean.kmeans_lloyd(5, 4, KMeans::init_precomputed(first.centroids.clone()), &conf).unwrap();
        assert_eq!(second.assignments, first.assignments);
        assert_eq!(second.centroids, first.centroids);
        assert_eq!(second.rounds, 2);
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let mut rnd = StdRng::seed_from_u64(11);
        let samples: Vec<Point<f32>> = (0..1000).map(|_| Point::new(rnd.gen_range(0.0, 100.0), rnd.gen_range(0.0, 100.0))).collect();
        let init: Vec<Point<f32>> = samples.iter().step_by(100).cloned().collect();

        let reference = testing::run_precomputed(samples.clone(), init.clone(), 1, &KMeansConfig::default());
        for workers in [2, 3, 7, 16, 32] {
            let res = testing::run_precomputed(samples.clone(), init.clone(), workers, &KMeansConfig::default());
            assert_eq!(res.assignments, reference.assignments);
            assert_eq!(res.centroids, reference.centroids);
            assert_eq!(res.rounds, reference.rounds);
        }
    }

    #[test]
    fn round_limit_is_reported() {
        let conf = KMeansConfig::build().abort_strategy(AbortStrategy::MaxRounds { rounds: 1 }).build();
        let res = testing::run_precomputed(testing::two_pairs(), vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 2, &conf);
        assert_eq!(res.rounds, 1);
        assert_eq!(res.termination, Some(Termination::RoundLimit));
        assert!(!res.converged());
        assert_eq!(res.assignments, vec![0, 0, 1, 1]);
    }

    #[test]
    fn single_late_change_keeps_everybody_running() {
        // Four workers, one point each. Only the last worker's point moves in round 2, every
        // other worker reports no change for that round.
        let samples = vec![Point::new(0.0f32, 0.0), Point::new(2.0, 0.0), Point::new(100.0, 0.0), Point::new(14.0, 0.0)];
        // Round 1: [0, 0, 1, 1], centroids move to 1 and 57
        // Round 2: the point at 14 switches over to cluster 0
        // Round 3: nothing moves
        let res = testing::run_precomputed(samples, vec![Point::new(0.0, 0.0), Point::new(15.0, 0.0)], 4, &KMeansConfig::default());
        assert_eq!(res.assignments, vec![0, 0, 1, 0]);
        assert_eq!(res.rounds, 3);
        assert!(res.converged());
    }

    #[test]
    fn frequencies_belong_to_the_final_assignment() {
        let mut rnd = StdRng::seed_from_u64(23);
        let samples: Vec<Point<f32>> = (0..700).map(|_| Point::new(rnd.gen_range(0.0, 30.0), rnd.gen_range(0.0, 30.0))).collect();
        let init: Vec<Point<f32>> = samples.iter().step_by(70).cloned().collect();
        let res = testing::run_precomputed(samples, init, 3, &KMeansConfig::default());

        let mut counted = vec![0usize; 10];
        res.assignments.iter().for_each(|&c| counted[c] += 1);
        assert_eq!(res.centroid_frequency, counted);
    }

    #[test]
    fn panicking_callback_ends_the_run() {
        let round_done = |_: usize, _: bool, _: &[Point<f32>]| panic!("round callback failed");
        let conf = KMeansConfig::<f32>::build().round_done(&round_done).build();
        let kmean = KMeans::new(testing::two_pairs(), EuclideanDistance);
        for workers in [1, 2, 4] {
            let run = catch_unwind(AssertUnwindSafe(|| {
                let init = KMeans::init_precomputed(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
                kmean.kmeans_lloyd(2, workers, init, &conf)
            }));
            assert!(run.is_err(), "workers={}", workers);
        }
    }

    /// Squared euclidean distance that fails for samples on the far side of the plane.
    struct FailsBeyond(f32);
    impl DistanceFunction<f32> for FailsBeyond {
        fn distance(&self, a: &Point<f32>, b: &Point<f32>) -> f32 {
            assert!(a.x < self.0, "sample {:?} out of range", a);
            EuclideanDistance.distance(a, b)
        }
    }

    #[test]
    fn panicking_worker_releases_its_peers() {
        // With two workers, only worker 1 owns the points at x = 10 and fails during assignment
        // while worker 0 already waits at the first barrier.
        let kmean = KMeans::new(testing::two_pairs(), FailsBeyond(5.0));
        let run = catch_unwind(AssertUnwindSafe(|| {
            let init = KMeans::init_precomputed(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
            kmean.kmeans_lloyd(2, 2, init, &KMeansConfig::default())
        }));
        assert!(run.is_err());
    }
}
