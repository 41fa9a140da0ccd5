use num::{NumCast, Zero, Float};
use std::{
    fmt::{Debug, Display}, iter::Sum, str::FromStr, ops::{Add, AddAssign, Range, Sub, SubAssign},
    sync::{atomic::{AtomicUsize, Ordering}, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError}
};

pub trait Primitive: Add + AddAssign + Sum + Sub + SubAssign + Zero + Float + NumCast
                + PartialOrd + Copy + Default + Display + Debug + FromStr + Sync + Send + 'static {}
impl Primitive for f32 {}
impl Primitive for f64 {}

/// Marker stored in an assignment slot before the point's first assignment phase.
pub const UNASSIGNED: usize = usize::MAX;

/// A position in the plane. Used for dataset points as well as for centroids.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point<T: Primitive> {
    pub x: T,
    pub y: T
}
impl<T: Primitive> Point<T> {
    pub fn new(x: T, y: T) -> Self { Self { x, y } }
}
impl<T: Primitive> From<(T, T)> for Point<T> {
    fn from((x, y): (T, T)) -> Self { Self { x, y } }
}


/// Mutable state shared by all workers during one engine run.
///
/// Every worker stores into the assignment slots of its own partition only, and reads the
/// centroids during the assignment phase. The leader reads all slots and rewrites the centroids
/// between the two barriers of a round. Barrier phasing is what keeps these accesses apart:
/// relaxed atomics are sufficient for the slots (the barrier's mutex orders them), and the
/// centroid lock is never contended.
pub(crate) struct RoundArena<T: Primitive> {
    assignments: Vec<AtomicUsize>,
    centroids: RwLock<Vec<Point<T>>>
}
impl<T: Primitive> RoundArena<T> {
    pub fn new(assignments: &[usize], centroids: Vec<Point<T>>) -> Self {
        Self {
            assignments: assignments.iter().map(|&a| AtomicUsize::new(a)).collect(),
            centroids: RwLock::new(centroids)
        }
    }

    /// Assignment slots of one worker's partition.
    pub fn partition(&self, range: Range<usize>) -> &[AtomicUsize] {
        &self.assignments[range]
    }

    /// Snapshot of every assignment slot. Only valid between barrier 1 and barrier 2.
    pub fn assignments(&self) -> impl Iterator<Item = usize> + '_ {
        self.assignments.iter().map(|a| a.load(Ordering::Relaxed))
    }

    pub fn centroids(&self) -> RwLockReadGuard<'_, Vec<Point<T>>> {
        self.centroids.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn centroids_mut(&self) -> RwLockWriteGuard<'_, Vec<Point<T>>> {
        self.centroids.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<Point<T>>) {
        let assignments = self.assignments.into_iter().map(AtomicUsize::into_inner).collect();
        let centroids = self.centroids.into_inner().unwrap_or_else(PoisonError::into_inner);
        (assignments, centroids)
    }
}
