use super::{
    predicate::{Predicate, PredicateId, PredicateTable, Verdict},
    search, Outcome, ProcessPair, StopReason,
};
use crate::{
    config::MonitorConfig,
    error::{Error, Result},
    order::event_log::{Event, EventLog},
};
use std::sync::{Condvar, Mutex, PoisonError};
use tracing::{debug, info_span, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Producers are still appending.
    Collecting,
    /// Every producer terminated; the lattice search is running.
    Searching,
    /// All predicates are classified.
    Done,
}

/// Result of one predicate's search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub id: PredicateId,
    pub name: String,
    pub pair: ProcessPair,
    pub outcome: Outcome,
}

impl Report {
    pub fn verdict(&self) -> Verdict {
        self.outcome.verdict
    }
}

/// Per-predicate results, indexed by [`PredicateId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdicts {
    reports: Vec<Report>,
}

impl Verdicts {
    pub fn possibly_true(&self) -> Vec<bool> {
        self.reports.iter().map(|r| r.verdict().possibly).collect()
    }

    pub fn definitely_true(&self) -> Vec<bool> {
        self.reports.iter().map(|r| r.verdict().definitely).collect()
    }

    pub fn get(&self, id: PredicateId) -> Option<&Report> {
        self.reports.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Report> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

struct State<V> {
    phase: Phase,
    logs: Vec<EventLog<V>>,
    terminated: Vec<bool>,
    running: usize,
    verdicts: Option<Verdicts>,
}

/// Owns the logs while [`Monitor::run`] searches outside the lock.
///
/// Dropping it always puts the logs back. Without verdicts (an error or a
/// panicking predicate) the monitor returns to [`Phase::Collecting`], so the
/// logs stay readable and `run` can be retried.
struct SearchGuard<'m, V> {
    state: &'m Mutex<State<V>>,
    logs: Vec<EventLog<V>>,
    verdicts: Option<Verdicts>,
}

impl<V> Drop for SearchGuard<'_, V> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.logs = std::mem::take(&mut self.logs);
        match self.verdicts.take() {
            Some(verdicts) => {
                state.verdicts = Some(verdicts);
                state.phase = Phase::Done;
            }
            None => {
                warn!("search aborted, monitor back to collecting");
                state.phase = Phase::Collecting;
            }
        }
    }
}

/// Collects the per-process logs and, once every producer has terminated,
/// classifies each registered predicate.
///
/// Producers share the monitor (typically behind an `Arc`) and call
/// [`append_event`](Self::append_event) and
/// [`signal_terminated`](Self::signal_terminated); one coordinator calls
/// [`run`](Self::run), which blocks until the last producer is done.
pub struct Monitor<V> {
    n_procs: usize,
    predicates: PredicateTable<V>,
    state: Mutex<State<V>>,
    all_terminated: Condvar,
}

impl<V> Monitor<V> {
    pub fn new(predicates: PredicateTable<V>) -> Self {
        let n_procs = predicates.processes();
        Self {
            n_procs,
            predicates,
            state: Mutex::new(State {
                phase: Phase::Collecting,
                logs: (0..n_procs).map(|pid| EventLog::new(pid, n_procs)).collect(),
                terminated: vec![false; n_procs],
                running: n_procs,
                verdicts: None,
            }),
            all_terminated: Condvar::new(),
        }
    }

    pub fn builder(n_procs: usize) -> MonitorBuilder<V> {
        MonitorBuilder {
            table: PredicateTable::new(n_procs),
        }
    }

    pub fn processes(&self) -> usize {
        self.n_procs
    }

    pub fn predicates(&self) -> &PredicateTable<V> {
        &self.predicates
    }

    fn check_pid(&self, pid: usize) -> Result<()> {
        if pid < self.n_procs {
            Ok(())
        } else {
            warn!(pid, processes = self.n_procs, "rejected unknown process");
            Err(Error::UnknownProcess {
                pid,
                processes: self.n_procs,
            })
        }
    }

    /// Appends `event` to the log of `pid`.
    ///
    /// Rejected once `pid` has signalled termination: a log never changes
    /// after its producer is done.
    pub fn append_event(&self, pid: usize, event: Event<V>) -> Result<()> {
        self.check_pid(pid)?;
        let mut state = self.state.lock()?;
        if state.terminated[pid] {
            warn!(pid, "rejected event after termination");
            return Err(Error::AlreadyTerminated { pid });
        }
        state.logs[pid].push(event)
    }

    /// Records that `pid` has produced its last event. Exactly once per process.
    pub fn signal_terminated(&self, pid: usize) -> Result<()> {
        self.check_pid(pid)?;
        let mut state = self.state.lock()?;
        if state.terminated[pid] {
            warn!(pid, "duplicate termination signal");
            return Err(Error::AlreadyTerminated { pid });
        }
        state.terminated[pid] = true;
        state.running -= 1;
        debug!(pid, events = state.logs[pid].len(), running = state.running, "process terminated");
        if state.running == 0 {
            self.all_terminated.notify_all();
        }
        Ok(())
    }

    pub fn phase(&self) -> Result<Phase> {
        Ok(self.state.lock()?.phase)
    }

    /// Blocks until every process has terminated, then searches the lattice
    /// once per registered predicate.
    ///
    /// Runs at most once to completion; later calls fail with
    /// [`Error::InvalidPhase`].
    pub fn run(&self) -> Result<Verdicts> {
        let logs = {
            let mut state = self.state.lock()?;
            while state.running > 0 {
                state = self.all_terminated.wait(state)?;
            }
            if state.phase != Phase::Collecting {
                return Err(Error::InvalidPhase {
                    expected: Phase::Collecting,
                    found: state.phase,
                });
            }
            state.phase = Phase::Searching;
            debug!(predicates = self.predicates.len(), "all processes terminated, searching");
            std::mem::take(&mut state.logs)
        };

        let mut guard = SearchGuard {
            state: &self.state,
            logs,
            verdicts: None,
        };
        let reports = self
            .predicates
            .iter()
            .map(|(id, predicate)| self.classify(id, predicate, &guard.logs))
            .collect::<Result<Vec<_>>>()?;

        let verdicts = Verdicts { reports };
        guard.verdicts = Some(verdicts.clone());
        Ok(verdicts)
    }

    fn classify(
        &self,
        id: PredicateId,
        predicate: &Predicate<V>,
        logs: &[EventLog<V>],
    ) -> Result<Report> {
        let span = info_span!("predicate", name = %predicate.name(), pair = %predicate.pair());
        let _enter = span.enter();

        let outcome = search(predicate, logs)?;
        debug!(
            possibly = outcome.verdict.possibly,
            definitely = outcome.verdict.definitely,
            levels = outcome.levels,
            exhausted = outcome.stop == StopReason::Exhausted,
            "predicate classified"
        );
        Ok(Report {
            id,
            name: predicate.name().to_owned(),
            pair: predicate.pair(),
            outcome,
        })
    }

    pub fn verdicts(&self) -> Result<Verdicts> {
        let state = self.state.lock()?;
        match (&state.verdicts, state.phase) {
            (Some(verdicts), Phase::Done) => Ok(verdicts.clone()),
            (_, found) => Err(Error::InvalidPhase {
                expected: Phase::Done,
                found,
            }),
        }
    }

    /// Possibly-true flag per predicate id. Only available once [`Phase::Done`].
    pub fn possibly_true(&self) -> Result<Vec<bool>> {
        Ok(self.verdicts()?.possibly_true())
    }

    /// Definitely-true flag per predicate id. Only available once [`Phase::Done`].
    pub fn definitely_true(&self) -> Result<Vec<bool>> {
        Ok(self.verdicts()?.definitely_true())
    }

    /// Runs `f` over the frozen log of `pid`, e.g. for reporting after the search.
    pub fn with_log<R>(&self, pid: usize, f: impl FnOnce(&EventLog<V>) -> R) -> Result<R> {
        self.check_pid(pid)?;
        let state = self.state.lock()?;
        if state.phase != Phase::Done {
            return Err(Error::InvalidPhase {
                expected: Phase::Done,
                found: state.phase,
            });
        }
        Ok(f(&state.logs[pid]))
    }
}

impl<V: PartialOrd + 'static> Monitor<V> {
    /// Builds a monitor whose predicates compare the two local values as
    /// configured.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        config
            .predicates
            .iter()
            .try_fold(Self::builder(config.processes), |builder, p| {
                let comparison = p.comparison;
                builder.predicate(&p.name, (p.i, p.j), move |a: &V, b: &V| {
                    comparison.holds(a, b)
                })
            })
            .map(MonitorBuilder::build)
    }
}

pub struct MonitorBuilder<V> {
    table: PredicateTable<V>,
}

impl<V> MonitorBuilder<V> {
    pub fn predicate<F>(mut self, name: &str, pair: impl Into<ProcessPair>, check: F) -> Result<Self>
    where
        F: Fn(&V, &V) -> bool + Send + Sync + 'static,
    {
        self.table.register(Predicate::new(name, pair.into(), check))?;
        Ok(self)
    }

    pub fn build(self) -> Monitor<V> {
        Monitor::new(self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::{Monitor, Phase};
    use crate::{
        config::MonitorConfig,
        detect::PredicateId,
        error::Error,
        order::{event_log::Event, vector_clock::VectorClock},
        test_utils::init_test_logging,
    };
    use rand::Rng;
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    fn ev(owner: usize, clk: &[usize], value: i64) -> Event<i64> {
        Event::new(VectorClock::from_parts(owner, clk.to_vec()), value)
    }

    fn equal_monitor() -> Monitor<i64> {
        Monitor::builder(2)
            .predicate("equal", (0, 1), |a: &i64, b: &i64| a == b)
            .unwrap()
            .build()
    }

    #[test]
    fn rejects_unknown_process() {
        let m = equal_monitor();
        let unknown = Error::UnknownProcess {
            pid: 2,
            processes: 2,
        };
        assert_eq!(m.append_event(2, ev(0, &[1, 0], 0)), Err(unknown.clone()));
        assert_eq!(m.signal_terminated(2), Err(unknown));
    }

    #[test]
    fn termination_is_exactly_once() {
        let m = equal_monitor();
        m.append_event(0, ev(0, &[1, 0], 0)).unwrap();
        m.signal_terminated(0).unwrap();
        assert_eq!(m.signal_terminated(0), Err(Error::AlreadyTerminated { pid: 0 }));
        assert_eq!(
            m.append_event(0, ev(0, &[2, 0], 1)),
            Err(Error::AlreadyTerminated { pid: 0 })
        );
        // a duplicate must not count as process 1 finishing
        assert_eq!(m.phase().unwrap(), Phase::Collecting);
    }

    #[test]
    fn results_only_after_done() {
        init_test_logging();
        let m = equal_monitor();
        let early = Error::InvalidPhase {
            expected: Phase::Done,
            found: Phase::Collecting,
        };
        assert_eq!(m.possibly_true(), Err(early.clone()));
        assert_eq!(m.definitely_true(), Err(early));

        m.append_event(0, ev(0, &[1, 0], 4)).unwrap();
        m.append_event(1, ev(1, &[0, 1], 4)).unwrap();
        m.signal_terminated(0).unwrap();
        m.signal_terminated(1).unwrap();

        let verdicts = m.run().unwrap();
        assert_eq!(m.phase().unwrap(), Phase::Done);
        assert_eq!(m.possibly_true().unwrap(), vec![true]);
        assert_eq!(m.definitely_true().unwrap(), vec![true]);
        assert_eq!(m.verdicts().unwrap(), verdicts);
        assert_eq!(verdicts.get(PredicateId(0)).map(|r| r.name.as_str()), Some("equal"));
        assert_eq!(m.with_log(1, |log| log.len()).unwrap(), 1);

        assert_eq!(
            m.run(),
            Err(Error::InvalidPhase {
                expected: Phase::Collecting,
                found: Phase::Done
            })
        );
    }

    #[test]
    fn panicking_predicate_keeps_logs_for_retry() {
        init_test_logging();
        let tripped = AtomicBool::new(false);
        let m = Monitor::builder(2)
            .predicate("flaky", (0, 1), move |a: &i64, b: &i64| {
                if !tripped.swap(true, Ordering::SeqCst) {
                    panic!("first evaluation fails");
                }
                a == b
            })
            .unwrap()
            .build();
        m.append_event(0, ev(0, &[1, 0], 4)).unwrap();
        m.append_event(1, ev(1, &[0, 1], 4)).unwrap();
        m.signal_terminated(0).unwrap();
        m.signal_terminated(1).unwrap();

        assert!(panic::catch_unwind(AssertUnwindSafe(|| m.run())).is_err());
        assert_eq!(m.phase().unwrap(), Phase::Collecting);

        let verdicts = m.run().unwrap();
        assert_eq!(verdicts.possibly_true(), vec![true]);
        assert_eq!(m.phase().unwrap(), Phase::Done);
        assert_eq!(m.with_log(0, |log| log.len()).unwrap(), 1);
    }

    #[test]
    fn run_waits_for_every_producer() {
        init_test_logging();
        let m = Arc::new(equal_monitor());

        let coordinator = thread::spawn({
            let m = m.clone();
            move || m.run()
        });

        let producers: Vec<_> = (0..2)
            .map(|pid| {
                let m = m.clone();
                thread::spawn(move || {
                    let mut rng = rand::thread_rng();
                    for k in 1..=3 {
                        thread::sleep(Duration::from_millis(rng.gen_range(0..=20)));
                        let mut clk = vec![0; 2];
                        clk[pid] = k;
                        // only the last events meet
                        let value = if k == 3 { 9 } else { (pid * 10 + k) as i64 };
                        m.append_event(pid, Event::new(VectorClock::from_parts(pid, clk), value))
                            .unwrap();
                    }
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(m.phase().unwrap(), Phase::Collecting);
        m.signal_terminated(0).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(m.phase().unwrap(), Phase::Collecting);
        m.signal_terminated(1).unwrap();

        let verdicts = coordinator.join().unwrap().unwrap();
        assert_eq!(verdicts.possibly_true(), vec![true]);
        // the top cut (2, 2) is the only witness, and every path ends there
        assert_eq!(verdicts.definitely_true(), vec![true]);
        assert_eq!(verdicts.iter().next().unwrap().outcome.levels, 5);
    }

    #[test]
    fn classic_configuration() {
        init_test_logging();
        let m: Monitor<i64> = Monitor::from_config(&MonitorConfig::classic(3)).unwrap();
        assert_eq!(m.predicates().len(), 4);

        // p0 and p2 never hold the same value, p0 and p1 start equal
        for (pid, values) in [(0, [1, 2]), (1, [1, 3]), (2, [7, 8])] {
            for (k, value) in values.into_iter().enumerate() {
                let mut clk = vec![0; 3];
                clk[pid] = k + 1;
                m.append_event(pid, Event::new(VectorClock::from_parts(pid, clk), value))
                    .unwrap();
            }
            m.signal_terminated(pid).unwrap();
        }

        let v = m.run().unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v.possibly_true(), vec![true, true, true, false]);
        // p0 < p1 holds on both branches past the seed, p0 > p1 only on one
        assert_eq!(v.definitely_true(), vec![true, true, false, false]);
        assert_eq!(v.by_name("predicate3").map(|r| r.pair.j), Some(2));
    }

    #[test]
    fn no_processes_finishes_immediately() {
        let m = Monitor::<i64>::builder(0).build();
        assert!(m.run().unwrap().is_empty());
        assert_eq!(m.phase().unwrap(), Phase::Done);
    }
}
