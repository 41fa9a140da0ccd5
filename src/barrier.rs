use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Generation-counting rendezvous for a fixed number of parties, that reduces one boolean
/// contribution per party with logical OR while they are gathered.
///
/// Every call to [`RoundBarrier::wait`] blocks until all parties of the current generation
/// arrived. The last party to arrive finalizes the reduction and opens the next generation
/// before anybody is released, so a party that already raced ahead into the next generation
/// can neither be released early nor clobber the result its peers are about to read.
///
/// A party that will never arrive again has to [`RoundBarrier::abort`] the barrier. All
/// current and future waiters are then released without a result.
pub(crate) struct RoundBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar
}

struct BarrierState {
    arrived: usize,
    generation: u64,
    pending: bool,
    // Reduced value of the last completed generation
    released: bool,
    aborted: bool
}

impl RoundBarrier {
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0);
        Self {
            parties,
            state: Mutex::new(BarrierState { arrived: 0, generation: 0, pending: false, released: false, aborted: false }),
            cvar: Condvar::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arrive with **contribution** and block until every party arrived.
    /// ## Returns
    /// The OR of all parties' contributions of this generation, or `None` once the barrier
    /// was aborted before this generation completed.
    pub fn wait(&self, contribution: bool) -> Option<bool> {
        let mut state = self.lock();
        if state.aborted {
            return None;
        }
        state.pending |= contribution;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.released = state.pending;
            state.pending = false;
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Some(state.released);
        }

        let generation = state.generation;
        while state.generation == generation && !state.aborted {
            state = self.cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.generation == generation {
            return None;
        }
        // Nobody can complete the following generation before this party arrives there,
        // so `released` still belongs to ours.
        Some(state.released)
    }

    /// Release every waiting party without a result and make all later waits return
    /// immediately.
    pub fn abort(&self) {
        self.lock().aborted = true;
        self.cvar.notify_all();
    }
}

/// Aborts the barrier when dropped during a panic, so the remaining parties do not wait
/// for a party that unwound out of its round loop.
pub(crate) struct AbortOnUnwind<'b>(pub &'b RoundBarrier);
impl Drop for AbortOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}
