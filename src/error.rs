use crate::detect::Phase;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Contract violations by producers, predicate registrations or result readers.
///
/// Pruned cuts are never errors; they are ordinary outcomes of the search.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown process {pid}, monitor tracks {processes} processes")]
    UnknownProcess { pid: usize, processes: usize },

    #[error("event appended to log {pid} carries a clock owned by process {owner}")]
    ClockOwnerMismatch { pid: usize, owner: usize },

    #[error("vector clock has {found} components, expected {expected}")]
    ClockWidth { expected: usize, found: usize },

    #[error("clock of process {pid} went from {previous} to {found}, must strictly increase")]
    NonMonotonicClock {
        pid: usize,
        previous: usize,
        found: usize,
    },

    #[error("process {pid} already terminated")]
    AlreadyTerminated { pid: usize },

    #[error("predicate must compare two distinct processes, got ({pid}, {pid})")]
    SameProcessPair { pid: usize },

    #[error("predicate {name:?} registered twice")]
    DuplicatePredicate { name: String },

    #[error("monitor is {found:?}, operation requires {expected:?}")]
    InvalidPhase { expected: Phase, found: Phase },

    #[error("monitor state poisoned by a panicking thread")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}
