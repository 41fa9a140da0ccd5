use crate::helpers;
use std::ops::Range;

/// Static block partitioning of the point indices `0..sample_cnt` over `workers` workers.
///
/// Worker `w` owns the contiguous range `[w * c, min((w + 1) * c, sample_cnt))` where
/// `c = ceil(sample_cnt / workers)`. Trailing workers may own an empty range when there are
/// fewer points than workers. The mapping never changes during a run, so every round hands the
/// same indices to the same worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Partition {
    sample_cnt: usize,
    workers: usize,
    chunk_size: usize
}
impl Partition {
    pub fn new(sample_cnt: usize, workers: usize) -> Self {
        assert!(workers > 0, "a partition needs at least one worker");
        let chunk_size = helpers::multiple_roundup(sample_cnt, workers) / workers;
        Self { sample_cnt, workers, chunk_size }
    }

    /// Index range owned by **worker_id**.
    pub fn range(&self, worker_id: usize) -> Range<usize> {
        assert!(worker_id < self.workers);
        let start = (worker_id * self.chunk_size).min(self.sample_cnt);
        let end = (start + self.chunk_size).min(self.sample_cnt);
        start..end
    }
}
