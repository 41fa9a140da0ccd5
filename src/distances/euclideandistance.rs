use crate::{DistanceFunction, Point, Primitive};

/// Squared euclidean distance. The square root is skipped, as only the ordering of
/// distances matters for the cluster assignment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

impl<T: Primitive> DistanceFunction<T> for EuclideanDistance {
    #[inline(always)]
    fn distance(&self, a: &Point<T>, b: &Point<T>) -> T {
        let (dx, dy) = (a.x - b.x, a.y - b.y);
        dx * dx + dy * dy
    }
}
