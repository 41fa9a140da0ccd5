/// Enum with possible abort strategies.
/// These strategies specify when the round loop of a running k-means calculation stops.
/// Every strategy stops as soon as a round left all assignments untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortStrategy {
	/// Keep running rounds until no point changes its cluster anymore.
	UntilStable,
	/// Like [`AbortStrategy::UntilStable`], but give up after **rounds** rounds. The result is then
	/// the assignment after the last round, not necessarily a fixed point.
	/// ## Fields:
	/// - **rounds**: Maximum amount of rounds to run
	MaxRounds { rounds: usize }
}
impl AbortStrategy {
	pub(crate) fn create_logic(&self) -> Box<dyn AbortStrategyLogic> {
		match *self {
			AbortStrategy::UntilStable => Box::new(UntilStableLogic),
			AbortStrategy::MaxRounds{rounds} => Box::new(MaxRoundsLogic {
				rounds,
				completed: 0
			})
		}
	}
}

/// How a finished k-means calculation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
	/// The last round did not change any assignment.
	Converged,
	/// The round cap was hit while assignments were still changing.
	RoundLimit
}

/// Decision of an [`AbortStrategyLogic`] after a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
	Continue,
	Stop(Termination)
}

pub(crate) trait AbortStrategyLogic {
	/// Function that has to be called once a round ended.
	/// ## Arguments
	/// - **changed**: Whether any worker changed any assignment in that round
	fn next(&mut self, changed: bool) -> Verdict;
}


pub(crate) struct UntilStableLogic;
impl AbortStrategyLogic for UntilStableLogic {
	fn next(&mut self, changed: bool) -> Verdict {
		if changed { Verdict::Continue } else { Verdict::Stop(Termination::Converged) }
	}
}


pub(crate) struct MaxRoundsLogic {
	rounds: usize,
	completed: usize
}
impl AbortStrategyLogic for MaxRoundsLogic {
	fn next(&mut self, changed: bool) -> Verdict {
		self.completed += 1;
		if !changed {
			Verdict::Stop(Termination::Converged)
		} else if self.completed >= self.rounds {
			Verdict::Stop(Termination::RoundLimit)
		} else {
			Verdict::Continue
		}
	}
}
