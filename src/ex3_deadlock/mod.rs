//! # Deadlock
//!
//! Two processes, two resources guarded by binary semaphores. Each process wants both.
//!
//! If process 1 takes resource 1 then 2 and process 2 takes resource 2 then 1, there's
//! an interleaving where each holds one and waits for the other forever:
//! - P1 takes R1
//! - P2 takes R2
//! - P1 waits for R2, P2 waits for R1 => nobody moves again
//!
//! Whether it happens depends on luck, see [Scenario::Racy]. [Scenario::Forced] removes the luck
//! by making both processes meet after taking their first resource. Taking the resources in the same
//! order everywhere ([Scenario::Fixed]) makes the deadlock impossible.
//!
//! Semaphores have no timeouts, so a deadlocked [run_deadlock] never returns. That's the demo.
//! The [WaitForGraph] next to the semaphores lets a watchdog notice it without resolving it.

pub mod wait_for_graph;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Barrier,
    },
    thread,
    time::Duration,
};

use strum_macros::{Display, EnumString};
use tracing::warn;

pub use wait_for_graph::WaitForGraph;

use crate::{co_begin, co_begin::LaunchError, semaphore::Semaphore, transcript::Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    /// opposite order, deadlocks sometimes
    Racy,
    /// opposite order, both hold their first resource before asking for the second one
    Forced,
    /// same order, never deadlocks
    Fixed,
}

impl Scenario {
    /// (first, second) resource for the process
    fn order(self, pid: usize) -> (usize, usize) {
        match (self, pid) {
            (Scenario::Fixed, _) | (_, 1) => (1, 2),
            _ => (2, 1),
        }
    }
}

/// Two resources, their wait-for graph and a meeting point for [Scenario::Forced].
pub struct Resources {
    semaphores: [Semaphore; 2],
    graph: WaitForGraph,
    meet: Barrier,
    finished: AtomicUsize,
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

impl Resources {
    pub fn new() -> Self {
        Self {
            semaphores: [Semaphore::binary(), Semaphore::binary()],
            graph: WaitForGraph::new(),
            meet: Barrier::new(2),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn graph(&self) -> &WaitForGraph {
        &self.graph
    }

    /// how many processes got through
    pub fn finished(&self) -> usize {
        self.finished.load(Relaxed)
    }

    fn take(&self, pid: usize, resource: usize, t: &Transcript) {
        t.record(format!("Process {pid} wants resource {resource}"));
        self.graph.waits_for(pid, resource);
        self.semaphores[resource - 1].acquire();
        self.graph.acquired(pid, resource);
    }

    fn give_back(&self, pid: usize, resource: usize) {
        self.graph.releasing(pid, resource);
        self.semaphores[resource - 1].release();
    }

    pub fn process(&self, pid: usize, scenario: Scenario, t: &Transcript) {
        let (first, second) = scenario.order(pid);

        self.take(pid, first, t);
        if scenario == Scenario::Forced {
            self.meet.wait();
        }
        self.take(pid, second, t);

        t.record(format!("Process {pid} now has both resources."));

        self.give_back(pid, second);
        self.give_back(pid, first);
        self.finished.fetch_add(1, Relaxed);
    }

    /// Runs both processes. Never returns if they deadlock.
    pub fn run(&self, scenario: Scenario, t: &Transcript) -> Result<(), LaunchError> {
        co_begin!(
            || self.process(1, scenario, t),
            || self.process(2, scenario, t),
        )
    }

    /// Polls the graph until both processes finish (`None`) or a cycle shows up.
    pub fn watch(&self, period: Duration) -> Option<Vec<usize>> {
        loop {
            if self.finished() == 2 {
                return None;
            }
            if let Some(cycle) = self.graph.find_cycle() {
                warn!(?cycle, "deadlock detected");
                return Some(cycle);
            }
            thread::sleep(period);
        }
    }
}

pub fn run_deadlock(scenario: Scenario, t: &Transcript) -> Result<(), LaunchError> {
    Resources::new().run(scenario, t)
}

/// Same as [run_deadlock] plus a watchdog that reports a deadlock in the transcript.
/// Still never returns when deadlocked.
pub fn run_watched(scenario: Scenario, t: &Transcript) -> Result<(), LaunchError> {
    let resources = Resources::new();
    co_begin!(
        || resources.process(1, scenario, t),
        || resources.process(2, scenario, t),
        || {
            if let Some(cycle) = resources.watch(Duration::from_millis(100)) {
                let cycle: Vec<String> = cycle.iter().map(|p| format!("Process {p}")).collect();
                t.record(format!("Deadlock: {} are waiting on each other.", cycle.join(", ")));
            }
        },
    )
}

pub fn run(scenario: Scenario) -> Result<(), LaunchError> {
    println!("Starting...");
    run_watched(scenario, &Transcript::echo_only())
}

#[cfg(test)]
mod test {
    use std::sync::{mpsc, Arc};

    use super::*;

    const BOTH: [&str; 2] = [
        "Process 1 now has both resources.",
        "Process 2 now has both resources.",
    ];

    #[test]
    fn test_fixed_never_deadlocks() {
        for _ in 0..200 {
            let t = Transcript::silent();
            run_deadlock(Scenario::Fixed, &t).unwrap();
            let lines = t.lines();
            assert!(BOTH.iter().all(|b| lines.iter().any(|l| l == b)));
        }
    }

    #[test]
    fn test_fixed_watched_reports_nothing() {
        let t = Transcript::silent();
        run_watched(Scenario::Fixed, &t).unwrap();
        assert!(t.lines().iter().all(|l| !l.starts_with("Deadlock")));
    }

    #[test]
    fn test_forced_deadlocks() {
        let resources = Arc::new(Resources::new());
        let t = Arc::new(Transcript::silent());
        let (done_tx, done_rx) = mpsc::channel();

        // deadlocked threads are never joined, they stay blocked until the test binary exits
        {
            let (resources, t) = (resources.clone(), t.clone());
            thread::spawn(move || {
                let _ = resources.run(Scenario::Forced, &t);
                let _ = done_tx.send(());
            });
        }

        assert_eq!(resources.watch(Duration::from_millis(10)), Some(vec![1, 2]));
        assert!(done_rx.recv_timeout(Duration::from_millis(300)).is_err());
        assert_eq!(resources.finished(), 0);

        let lines = t.lines();
        // both got to "about to take the second one" and nothing happened after
        assert!(lines.contains(&"Process 1 wants resource 2".to_string()));
        assert!(lines.contains(&"Process 2 wants resource 1".to_string()));
        assert!(lines.iter().all(|l| !l.ends_with("now has both resources.")));
        assert_eq!(lines.len(), 4);

        assert_eq!(resources.graph().holder(1), Some(1));
        assert_eq!(resources.graph().holder(2), Some(2));
    }

    #[test]
    fn test_racy_either_finishes_or_deadlocks() {
        let resources = Arc::new(Resources::new());
        let t = Arc::new(Transcript::silent());
        {
            let (resources, t) = (resources.clone(), t.clone());
            thread::spawn(move || {
                let _ = resources.run(Scenario::Racy, &t);
            });
        }
        match resources.watch(Duration::from_millis(5)) {
            None => assert_eq!(t.lines().len(), 6),
            Some(cycle) => assert_eq!(cycle, vec![1, 2]),
        }
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(Scenario::Forced.to_string(), "forced");
        assert_eq!("fixed".parse::<Scenario>().unwrap(), Scenario::Fixed);
    }
}
