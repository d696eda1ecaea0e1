//! Offline global predicate detection.
//!
//! Producers record vector-clocked events into per-process logs. Once every
//! producer has terminated, the [`Monitor`] walks the lattice of consistent
//! cuts level by level and classifies each registered predicate as possibly
//! and/or definitely true.

pub mod config;
pub mod detect;
pub mod error;
pub mod order;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Comparison, MonitorConfig, PredicateConfig};
pub use detect::{
    search, Cut, Frontier, LatticeBuilder, Monitor, MonitorBuilder, Outcome, Phase, Predicate,
    PredicateEvaluator, PredicateId, PredicateTable, ProcessPair, Report, Step, StopReason,
    Verdict, Verdicts,
};
pub use error::{Error, Result};
pub use order::{
    event_log::{Event, EventLog},
    process::Process,
    vector_clock::VectorClock,
    LogicalClock, OrdProcess,
};
