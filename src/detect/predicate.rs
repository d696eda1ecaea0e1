use super::{cut::Frontier, ProcessPair};
use crate::{
    error::{Error, Result},
    order::event_log::EventLog,
};
use std::fmt;

pub type PredicateFn<V> = dyn Fn(&V, &V) -> bool + Send + Sync;

/// Position of a predicate in its [`PredicateTable`], and of its entries in
/// the result vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub usize);

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pure boolean function over the local values of two processes.
pub struct Predicate<V> {
    name: String,
    pair: ProcessPair,
    check: Box<PredicateFn<V>>,
}

impl<V> Predicate<V> {
    pub fn new<F>(name: impl Into<String>, pair: ProcessPair, check: F) -> Self
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pair,
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pair(&self) -> ProcessPair {
        self.pair
    }

    pub fn holds(&self, value_i: &V, value_j: &V) -> bool {
        (self.check)(value_i, value_j)
    }
}

impl<V> fmt::Debug for Predicate<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("pair", &self.pair)
            .finish()
    }
}

/// Registered predicates, each bound to its process pair.
///
/// Ids are handed out densely in registration order.
#[derive(Debug)]
pub struct PredicateTable<V> {
    n_procs: usize,
    predicates: Vec<Predicate<V>>,
}

impl<V> PredicateTable<V> {
    pub fn new(n_procs: usize) -> Self {
        Self {
            n_procs,
            predicates: Vec::new(),
        }
    }

    pub fn processes(&self) -> usize {
        self.n_procs
    }

    pub fn register(&mut self, predicate: Predicate<V>) -> Result<PredicateId> {
        let ProcessPair { i, j } = predicate.pair;
        for pid in [i, j] {
            if pid >= self.n_procs {
                return Err(Error::UnknownProcess {
                    pid,
                    processes: self.n_procs,
                });
            }
        }
        if i == j {
            return Err(Error::SameProcessPair { pid: i });
        }
        if self.predicates.iter().any(|p| p.name == predicate.name) {
            return Err(Error::DuplicatePredicate {
                name: predicate.name,
            });
        }

        let id = PredicateId(self.predicates.len());
        self.predicates.push(predicate);
        Ok(id)
    }

    pub fn get(&self, id: PredicateId) -> Option<&Predicate<V>> {
        self.predicates.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PredicateId, &Predicate<V>)> {
        self.predicates
            .iter()
            .enumerate()
            .map(|(n, p)| (PredicateId(n), p))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Held in at least one consistent cut.
    pub possibly: bool,
    /// No path through the lattice avoids it.
    pub definitely: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// The cuts the predicate failed on; expand these next.
    Continue(Frontier),
    /// No failing cut survived.
    Stop,
}

/// Classifies successive lattice levels for one predicate.
pub struct PredicateEvaluator<'a, V> {
    predicate: &'a Predicate<V>,
    log_i: &'a EventLog<V>,
    log_j: &'a EventLog<V>,
    verdict: Verdict,
}

impl<'a, V> PredicateEvaluator<'a, V> {
    pub fn new(predicate: &'a Predicate<V>, log_i: &'a EventLog<V>, log_j: &'a EventLog<V>) -> Self {
        Self {
            predicate,
            log_i,
            log_j,
            verdict: Verdict::default(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Evaluates every cut of `frontier`.
    ///
    /// Satisfying cuts mark the predicate possibly true and are dropped; the
    /// failing ones are returned. When a non-empty level leaves no failing
    /// cut, the predicate is definitely true and the search may stop.
    pub fn evaluate(&mut self, frontier: Frontier) -> Step {
        if frontier.is_empty() {
            return Step::Continue(frontier);
        }
        let ProcessPair { i, j } = self.predicate.pair;

        let failing: Frontier = frontier
            .into_iter()
            .filter(|cut| {
                let (Some(ev_i), Some(ev_j)) =
                    (self.log_i.get(cut.index(i)), self.log_j.get(cut.index(j)))
                else {
                    tracing::warn!(%cut, "cut references a missing event, keeping it as failing");
                    return true;
                };
                let holds = self.predicate.holds(&ev_i.value, &ev_j.value);
                tracing::trace!(predicate = %self.predicate.name, %cut, holds);
                if holds {
                    self.verdict.possibly = true;
                }
                !holds
            })
            .collect();

        if failing.is_empty() {
            self.verdict.definitely = true;
            Step::Stop
        } else {
            Step::Continue(failing)
        }
    }
}
