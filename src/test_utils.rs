use crate::order::{
    event_log::{Event, EventLog},
    vector_clock::VectorClock,
    LogicalClock,
};
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber honouring `RUST_LOG`. The first call wins.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gpd=debug")),
            )
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Log of a process that never communicates: one local event per value.
pub fn independent_log<V: Clone>(pid: usize, n_procs: usize, values: &[V]) -> EventLog<V> {
    let mut clock = VectorClock::new(pid, n_procs);
    let mut log = EventLog::new(pid, n_procs);
    for value in values {
        clock.increment();
        log.push(Event::new(clock.clone(), value.clone()))
            .expect("local events keep the log ordered");
    }
    log
}
