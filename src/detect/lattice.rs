use super::{
    cut::{Cut, Frontier},
    ProcessPair,
};
use crate::order::event_log::EventLog;

/// Successor generation for cuts over one pair of process logs.
///
/// A cut only moves along `pair.i` and `pair.j`; every other component keeps
/// its seed value.
pub struct LatticeBuilder<'a, V> {
    pair: ProcessPair,
    log_i: &'a EventLog<V>,
    log_j: &'a EventLog<V>,
}

impl<'a, V> LatticeBuilder<'a, V> {
    pub fn new(pair: ProcessPair, log_i: &'a EventLog<V>, log_j: &'a EventLog<V>) -> Self {
        Self { pair, log_i, log_j }
    }

    /// The first frontier to evaluate.
    ///
    /// That is the all-zero cut when both logs have an event and the two
    /// first events are consistent. When the initial cut is inconsistent (a
    /// first event already received a later message) it is never a global
    /// state, so its consistent successors are returned instead.
    pub fn seed(&self, n_procs: usize) -> Frontier {
        let initial = Cut::initial(n_procs);
        if !self.in_range(&initial) {
            return Frontier::new();
        }
        if self.admits(&initial) {
            return std::iter::once(initial).collect();
        }
        tracing::debug!(cut = %initial, "initial cut is inconsistent, starting from its successors");
        self.successors(&initial).into_iter().collect()
    }

    /// Whether both events `cut` names exist and their clocks agree.
    pub fn admits(&self, cut: &Cut) -> bool {
        let ProcessPair { i, j } = self.pair;
        match (self.log_i.get(cut.index(i)), self.log_j.get(cut.index(j))) {
            (Some(ev_i), Some(ev_j)) => ev_i.clock.is_consistent(j, &ev_j.clock),
            _ => false,
        }
    }

    fn in_range(&self, cut: &Cut) -> bool {
        cut.index(self.pair.i) < self.log_i.len() && cut.index(self.pair.j) < self.log_j.len()
    }

    /// Advances `cut` along `i`, then along `j`, keeping the consistent results.
    pub fn successors(&self, cut: &Cut) -> Vec<Cut> {
        [self.pair.i, self.pair.j]
            .into_iter()
            .map(|pid| cut.advance(pid))
            .inspect(|next| debug_assert!(next.dominates(cut)))
            .filter(|next| {
                let keep = self.admits(next);
                if !keep {
                    tracing::trace!(from = %cut, cut = %next, "pruned successor");
                }
                keep
            })
            .collect()
    }

    /// Next lattice level reachable from `frontier`.
    pub fn expand(&self, frontier: &Frontier) -> Frontier {
        frontier
            .iter()
            .flat_map(|cut| self.successors(cut))
            .collect()
    }
}
