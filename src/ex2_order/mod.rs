//! # Ordering processes
//!
//! Three processes print `Process 1`, `Process 2` and `Process 3`. Started with [co_begin!] and
//! nothing else, they print in whatever order the scheduler likes, see [unordered].
//!
//! To force an order, each process gets a semaphore that means "it's your turn".
//! The first one starts with a permit, the rest with none.
//! A process waits for its turn, does its thing, then hands the turn to the next one.
//!
//! - [chain] - 1, 2, 3, once
//! - [round_robin] - 1, 2, 3, 1, 2, 3, ... the last process hands the turn back to the first
//! - [batches] - 1, 1, 1, 2, 2, 2, 3, 3, 3
//!
//! All of them are [run_hand_off] with different parameters.

use crate::{
    co_begin,
    co_begin::{LaunchError, Process},
    semaphore::Semaphore,
    transcript::Transcript,
};

/// A ring of "your turn" semaphores
pub struct HandOff {
    turns: Vec<Semaphore>,
}

impl HandOff {
    /// the 1st process has the turn
    pub fn new(processes: usize) -> Self {
        Self {
            turns: (0..processes)
                .map(|i| Semaphore::with_permits(if i == 0 { 1 } else { 0 }))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn wait_turn(&self, process: usize) {
        self.turns[process].acquire();
    }

    /// the last process passes the turn back to the first one
    pub fn pass(&self, process: usize) {
        self.turns[(process + 1) % self.turns.len()].release();
    }
}

fn print_out(pid: usize, t: &Transcript) {
    t.record(format!("Process {pid}"));
}

/// `processes` processes go `rounds` times around the ring,
/// each printing its id `batch` times per turn.
pub fn run_hand_off(
    processes: usize,
    rounds: usize,
    batch: usize,
    t: &Transcript,
) -> Result<(), LaunchError> {
    let ring = HandOff::new(processes);
    let procs = (0..processes)
        .map(|i| {
            let ring = &ring;
            Box::new(move || {
                for _ in 0..rounds {
                    ring.wait_turn(i);
                    for _ in 0..batch {
                        print_out(i + 1, t);
                    }
                    ring.pass(i);
                }
            }) as Process
        })
        .collect();
    co_begin::co_begin(procs)
}

pub fn unordered(t: &Transcript) -> Result<(), LaunchError> {
    co_begin!(|| print_out(1, t), || print_out(2, t), || print_out(3, t))
}

pub fn chain(t: &Transcript) -> Result<(), LaunchError> {
    run_hand_off(3, 1, 1, t)
}

pub fn round_robin(rounds: usize, t: &Transcript) -> Result<(), LaunchError> {
    run_hand_off(3, rounds, 1, t)
}

pub fn batches(batch: usize, t: &Transcript) -> Result<(), LaunchError> {
    run_hand_off(3, 1, batch, t)
}

pub fn run(rounds: usize) -> Result<(), LaunchError> {
    let t = Transcript::echo_only();
    println!("Starting...");
    println!("-- chain");
    chain(&t)?;
    println!("-- round robin");
    round_robin(rounds, &t)?;
    println!("-- batches");
    batches(rounds, &t)
}

#[cfg(test)]
mod test {
    use super::*;

    fn expected(ids: impl IntoIterator<Item = usize>) -> Vec<String> {
        ids.into_iter().map(|id| format!("Process {id}")).collect()
    }

    #[test]
    fn test_unordered_prints_all() {
        let t = Transcript::silent();
        unordered(&t).unwrap();
        let mut lines = t.lines();
        lines.sort();
        assert_eq!(lines, expected([1, 2, 3]));
    }

    #[test]
    fn test_chain_is_reproducible() {
        for _ in 0..100 {
            let t = Transcript::silent();
            chain(&t).unwrap();
            assert_eq!(t.lines(), expected([1, 2, 3]));
        }
    }

    #[test]
    fn test_round_robin() {
        for _ in 0..20 {
            let t = Transcript::silent();
            round_robin(3, &t).unwrap();
            assert_eq!(t.lines(), expected([1, 2, 3, 1, 2, 3, 1, 2, 3]));
        }
    }

    #[test]
    fn test_batches() {
        for _ in 0..20 {
            let t = Transcript::silent();
            batches(3, &t).unwrap();
            assert_eq!(t.lines(), expected([1, 1, 1, 2, 2, 2, 3, 3, 3]));
        }
    }

    #[test]
    fn test_long_ring() {
        let t = Transcript::silent();
        run_hand_off(8, 4, 2, &t).unwrap();
        let ids = (0..4).flat_map(|_| (1..=8).flat_map(|id| [id, id]));
        assert_eq!(t.lines(), expected(ids));
    }

    #[test]
    fn test_hand_off_starts_with_first() {
        let ring = HandOff::new(2);
        assert_eq!(ring.len(), 2);
        ring.wait_turn(0);
        ring.pass(0);
        ring.wait_turn(1);
        ring.pass(1);
        // back to the first one
        ring.wait_turn(0);
    }
}
