use crate::{DistanceFunction, KMeans, KMeansState, KMeansConfig, memory::*, error::{ConfigError, Result}};
use rand::prelude::*;
use std::ops::DerefMut;

#[inline(always)] pub fn calculate<T, D>(kmean: &KMeans<T, D>, state: &mut KMeansState<T>, config: &KMeansConfig<'_, T>) -> Result<()>
                where T: Primitive, D: DistanceFunction<T> {
    if state.k > kmean.sample_cnt() {
        return Err(ConfigError::MoreClustersThanPoints { k: state.k, sample_cnt: kmean.sample_cnt() }.into());
    }
    kmean.samples
        .choose_multiple(config.rnd.borrow_mut().deref_mut(), state.k)
        .cloned()
        .enumerate()
        .for_each(|(ci, c)| { // Copy randomly chosen samples into state.centroids
            state.centroids[ci] = c;
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EuclideanDistance, KMeansError};

    fn grid() -> KMeans<f32, EuclideanDistance> {
        KMeans::new((0..100).map(|i| Point::new((i % 10) as f32, (i / 10) as f32)).collect(), EuclideanDistance)
    }

    #[test]
    fn same_seed_same_centroids() {
        let kmean = grid();
        let pick = |seed| {
            let conf = KMeansConfig::build().random_generator(StdRng::seed_from_u64(seed)).build();
            let mut state = KMeansState::new(kmean.sample_cnt(), 9);
            calculate(&kmean, &mut state, &conf).unwrap();
            state.centroids
        };
        assert_eq!(pick(0), pick(0));
        assert_ne!(pick(0), pick(1));
    }

    #[test]
    fn picks_distinct_samples() {
        let kmean = grid();
        let conf = KMeansConfig::build().random_generator(StdRng::seed_from_u64(7)).build();
        let mut state = KMeansState::new(kmean.sample_cnt(), 32);
        calculate(&kmean, &mut state, &conf).unwrap();
        for (i, c) in state.centroids.iter().enumerate() {
            assert!(kmean.samples().contains(c));
            assert!(!state.centroids[i + 1..].contains(c), "centroid {:?} picked twice", c);
        }
    }

    #[test]
    fn more_clusters_than_points() {
        let kmean = KMeans::new(vec![Point::new(0.0f32, 0.0), Point::new(1.0, 1.0)], EuclideanDistance);
        let conf = KMeansConfig::default();
        let mut state = KMeansState::new(kmean.sample_cnt(), 3);
        let err = calculate(&kmean, &mut state, &conf).unwrap_err();
        assert!(matches!(err, KMeansError::Config(ConfigError::MoreClustersThanPoints { k: 3, sample_cnt: 2 })));
    }
}
