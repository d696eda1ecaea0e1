use super::{event_log::Event, vector_clock::VectorClock, LogicalClock, OrdProcess};
use crate::{
    detect::Monitor,
    error::{Error, Result},
};
use std::sync::Arc;

/// A traced process that reports every step to a shared [`Monitor`].
pub struct Process<V> {
    clock: VectorClock,
    monitor: Arc<Monitor<V>>,
}

impl<V> Process<V> {
    pub fn new(pid: usize, monitor: &Arc<Monitor<V>>) -> Result<Self> {
        let n_procs = monitor.processes();
        if pid >= n_procs {
            return Err(Error::UnknownProcess {
                pid,
                processes: n_procs,
            });
        }
        Ok(Self {
            clock: VectorClock::new(pid, n_procs),
            monitor: monitor.clone(),
        })
    }

    pub fn pid(&self) -> usize {
        self.clock.owner()
    }

    /// Signals termination. The log of this process is frozen afterwards.
    pub fn finish(self) -> Result<()> {
        self.monitor.signal_terminated(self.pid())
    }
}

impl<V> OrdProcess<VectorClock> for Process<V> {
    type Value = V;

    fn clock(&self) -> &VectorClock {
        &self.clock
    }
    fn clock_mut(&mut self) -> &mut VectorClock {
        &mut self.clock
    }
    fn record(&mut self, value: V) -> Result<()> {
        self.monitor
            .append_event(self.pid(), Event::new(self.clock.clone(), value))
    }
}
