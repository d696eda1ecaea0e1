use super::LogicalClock;
use std::cmp::Ordering;

/// Vector timestamp owned by one process.
///
/// Component `owner` only moves through [`LogicalClock::increment`] on the
/// owning process; every other component only moves through
/// [`LogicalClock::merge`] and never decreases.
#[derive(Clone, Debug)]
pub struct VectorClock {
    i: usize,
    clk: Vec<usize>,
}

impl VectorClock {
    /// Builds a clock from raw components, e.g. when replaying a recorded trace.
    pub fn from_parts(owner: usize, clk: Vec<usize>) -> Self {
        assert!(
            owner < clk.len(),
            "Expect 0-based index of process {owner} < n_procs={}",
            clk.len()
        );
        Self { i: owner, clk }
    }

    pub fn get(&self, pid: usize) -> usize {
        self.clk[pid]
    }

    pub fn len(&self) -> usize {
        self.clk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clk.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.clk
    }

    /// Pairwise consistency of the two events carrying `self` and `other`.
    ///
    /// `other` must not have seen more of `self`'s process than `self` has
    /// produced (`self[self.owner] >= other[self.owner]`), and `self` must not
    /// have seen more of `other_pid` than it has produced
    /// (`self[other_pid] <= other[other_pid]`).
    pub fn is_consistent(&self, other_pid: usize, other: &Self) -> bool {
        self.clk[self.i] >= other.clk[self.i] && self.clk[other_pid] <= other.clk[other_pid]
    }
}

impl LogicalClock for VectorClock {
    fn new(i: usize, n_procs: usize) -> Self {
        Self::from_parts(i, vec![0; n_procs])
    }
    fn owner(&self) -> usize {
        self.i
    }
    fn increment(&mut self) {
        self.clk[self.i] += 1;
    }
    // Only the sender's own component is reconciled on receipt
    fn merge(&mut self, other: &Self) {
        assert!(
            self.clk.len() == other.clk.len(),
            "Cannot merge with process that is aware of differing processes"
        );
        let j = other.i;
        self.clk[j] = self.clk[j].max(other.clk[j]);
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.clk == other.clk
    }
}

// Happens-before: None for concurrent clocks
impl PartialOrd for VectorClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.clk.len() != other.clk.len() {
            return None;
        }
        self.clk
            .iter()
            .zip(&other.clk)
            .try_fold(Ordering::Equal, |acc, (s, t)| match (acc, s.cmp(t)) {
                (acc, Ordering::Equal) => Some(acc),
                (Ordering::Equal, ord) => Some(ord),
                (acc, ord) if acc == ord => Some(acc),
                _ => None,
            })
    }
}
