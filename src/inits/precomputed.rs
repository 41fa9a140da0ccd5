use crate::{DistanceFunction, KMeans, KMeansConfig, KMeansState, memory::*, error::{ConfigError, Result}};

#[inline(always)]
pub fn calculate<T, D>(
    _kmean: &KMeans<T, D>, state: &mut KMeansState<T>, _config: &KMeansConfig<'_, T>, computed: Vec<Point<T>>,
) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    if computed.len() != state.k {
        return Err(ConfigError::CentroidCountMismatch { expected: state.k, actual: computed.len() }.into());
    }
    if let Some(index) = computed.iter().position(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(ConfigError::NonFiniteCentroid { index }.into());
    }
    state.centroids = computed;
    Ok(())
}
