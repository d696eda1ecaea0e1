use super::{vector_clock::VectorClock, LogicalClock};
use crate::error::{Error, Result};

/// One recorded step of a process: its clock snapshot and the local value
/// predicates are evaluated against.
#[derive(Clone, Debug, PartialEq)]
pub struct Event<V> {
    pub clock: VectorClock,
    pub value: V,
}

impl<V> Event<V> {
    pub fn new(clock: VectorClock, value: V) -> Self {
        Self { clock, value }
    }
}

/// Append-only, ordered log of the events of a single process.
#[derive(Clone, Debug)]
pub struct EventLog<V> {
    pid: usize,
    n_procs: usize,
    events: Vec<Event<V>>,
}

impl<V> EventLog<V> {
    pub fn new(pid: usize, n_procs: usize) -> Self {
        Self {
            pid,
            n_procs,
            events: Vec::new(),
        }
    }

    pub fn pid(&self) -> usize {
        self.pid
    }

    /// Appends `event`, rejecting clocks that break the log's ordering.
    ///
    /// The clock must be owned by this log's process, span every process, and
    /// its owner component must be strictly greater than the previous event's.
    pub fn push(&mut self, event: Event<V>) -> Result<()> {
        let clock = &event.clock;
        if clock.owner() != self.pid {
            return Err(Error::ClockOwnerMismatch {
                pid: self.pid,
                owner: clock.owner(),
            });
        }
        if clock.len() != self.n_procs {
            return Err(Error::ClockWidth {
                expected: self.n_procs,
                found: clock.len(),
            });
        }
        if let Some(last) = self.events.last() {
            let previous = last.clock.get(self.pid);
            let found = clock.get(self.pid);
            if found <= previous {
                return Err(Error::NonMonotonicClock {
                    pid: self.pid,
                    previous,
                    found,
                });
            }
        }
        self.events.push(event);
        Ok(())
    }

    pub fn get(&self, idx: usize) -> Option<&Event<V>> {
        self.events.get(idx)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event<V>] {
        &self.events
    }
}
