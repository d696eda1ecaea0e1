pub mod event_log;
pub mod process;
pub mod vector_clock;

use crate::error::Result;

// PartialOrd because not all clocks are comparable
pub trait LogicalClock: PartialOrd + Clone {
    fn new(pid: usize, n_procs: usize) -> Self;
    fn owner(&self) -> usize;
    // Ticks the owner's own component
    fn increment(&mut self);
    // Reconciles with a clock received from another process
    fn merge(&mut self, other: &Self);
}

/// Producer side of a traced process.
///
/// Every local, send and receive step ticks the clock and records one event
/// carrying a snapshot of it together with the local value the predicates
/// will later look at.
pub trait OrdProcess<Clock>
where
    Clock: LogicalClock,
{
    type Value;

    fn clock(&self) -> &Clock;
    fn clock_mut(&mut self) -> &mut Clock;
    // Publishes the current clock with `value`
    fn record(&mut self, value: Self::Value) -> Result<()>;

    // Local step
    fn exec(&mut self, value: Self::Value) -> Result<()> {
        self.clock_mut().increment();
        self.record(value)
    }
    // Sends new clock to receiving party
    fn send<F: FnOnce(Clock)>(&mut self, value: Self::Value, send_fn: F) -> Result<()> {
        self.clock_mut().increment();
        self.record(value)?;
        send_fn(self.clock().clone());
        Ok(())
    }
    // Receives clock from sending party and updates own clock
    fn recv<F: FnOnce() -> Clock>(&mut self, value: Self::Value, recv_fn: F) -> Result<()> {
        let received = recv_fn();
        self.clock_mut().merge(&received);
        self.clock_mut().increment();
        self.record(value)
    }
}
