//! # Wait-for graph
//!
//! Processes are nodes, "P waits for a resource that Q holds" is an edge P -> Q.
//! A cycle in the graph is a deadlock: everybody on it waits for somebody else on it.
//!
//! The graph only observes, it never breaks a deadlock.
//!
//! Each resource is assumed to have at most one holder (binary semaphores).
//! A holder is recorded only after the acquire succeeded and forgotten before the release,
//! so every recorded edge is real and a reported cycle can't be a false alarm.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Default)]
pub struct WaitForGraph {
    inner: Mutex<Edges>,
}

#[derive(Debug, Default)]
struct Edges {
    /// resource -> process holding it
    holders: HashMap<usize, usize>,
    /// process -> resource it's blocked on
    waiting: HashMap<usize, usize>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// call right before blocking on `resource`
    pub fn waits_for(&self, process: usize, resource: usize) {
        self.lock().waiting.insert(process, resource);
    }

    /// call right after `resource` was acquired
    pub fn acquired(&self, process: usize, resource: usize) {
        let mut edges = self.lock();
        edges.waiting.remove(&process);
        edges.holders.insert(resource, process);
    }

    /// call right before `resource` is released
    pub fn releasing(&self, process: usize, resource: usize) {
        let mut edges = self.lock();
        if edges.holders.get(&resource) == Some(&process) {
            edges.holders.remove(&resource);
        }
    }

    pub fn holder(&self, resource: usize) -> Option<usize> {
        self.lock().holders.get(&resource).copied()
    }

    /// Processes forming a cycle, starting from the lowest id, e.g. `[1, 2]` for 1 -> 2 -> 1.
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        let edges = self.lock();

        let mut starts: Vec<usize> = edges.waiting.keys().copied().collect();
        starts.sort_unstable();

        for start in starts {
            let mut path = vec![start];
            let mut current = start;
            // every process waits for at most one resource => at most one way out of each node
            while let Some(next) = edges
                .waiting
                .get(&current)
                .and_then(|resource| edges.holders.get(resource))
                .copied()
            {
                if next == start {
                    return Some(path);
                }
                if path.contains(&next) {
                    // a cycle that doesn't go through `start`, its lowest member finds it
                    break;
                }
                path.push(next);
                current = next;
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, Edges> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
