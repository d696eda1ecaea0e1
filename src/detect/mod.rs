//! Breadth-first search over the lattice of consistent cuts.
//!
//! For one predicate bound to processes `(i, j)` the search seeds the
//! frontier with the all-zero cut, evaluates it, and keeps expanding only the
//! cuts the predicate failed on, one lattice level at a time, until either no
//! failing cut survives (definitely true) or the logs are exhausted.

pub mod cut;
pub mod lattice;
pub mod monitor;
pub mod predicate;

pub use cut::{Cut, Frontier};
pub use lattice::LatticeBuilder;
pub use monitor::{Monitor, MonitorBuilder, Phase, Report, Verdicts};
pub use predicate::{
    Predicate, PredicateEvaluator, PredicateId, PredicateTable, Step, Verdict,
};

use crate::{
    error::{Error, Result},
    order::event_log::EventLog,
};
use std::fmt;

/// The two processes whose local values a predicate reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessPair {
    pub i: usize,
    pub j: usize,
}

impl ProcessPair {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

impl From<(usize, usize)> for ProcessPair {
    fn from((i, j): (usize, usize)) -> Self {
        Self::new(i, j)
    }
}

impl fmt::Display for ProcessPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}/P{}", self.i, self.j)
    }
}

/// Why the search for one predicate ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// No cut failing the predicate survived a level.
    Definitely,
    /// The frontier ran out of successors.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    /// Lattice levels handed to the evaluator, the seed level included.
    pub levels: usize,
    pub stop: StopReason,
}

/// Runs the level-by-level search for `predicate` over frozen `logs`.
///
/// `logs` is indexed by process id. Logs of processes outside the
/// predicate's pair are never read.
pub fn search<V>(predicate: &Predicate<V>, logs: &[EventLog<V>]) -> Result<Outcome> {
    let pair = predicate.pair();
    let log = |pid: usize| {
        logs.get(pid).ok_or(Error::UnknownProcess {
            pid,
            processes: logs.len(),
        })
    };
    let (log_i, log_j) = (log(pair.i)?, log(pair.j)?);

    let builder = LatticeBuilder::new(pair, log_i, log_j);
    let mut evaluator = PredicateEvaluator::new(predicate, log_i, log_j);

    let mut frontier = builder.seed(logs.len());
    let mut levels = 0;
    let stop = loop {
        if frontier.is_empty() {
            break StopReason::Exhausted;
        }
        levels += 1;
        tracing::trace!(level = levels, cuts = frontier.len(), "evaluating lattice level");
        match evaluator.evaluate(frontier) {
            Step::Stop => break StopReason::Definitely,
            Step::Continue(failing) => frontier = builder.expand(&failing),
        }
    };

    debug_assert!(levels <= (log_i.len() + log_j.len()).saturating_sub(1));
    Ok(Outcome {
        verdict: evaluator.verdict(),
        levels,
        stop,
    })
}
