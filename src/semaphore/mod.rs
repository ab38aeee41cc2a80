//! # Counting semaphore
//!
//! A semaphore is a counter of permits plus a set of threads waiting for one:
//! - `acquire` takes a permit or puts the thread to sleep until there is one
//! - `release` gives a permit back and wakes the waiters up, it never blocks
//!
//! A semaphore that starts with 1 permit is a mutex without data, see [Semaphore::binary].
//!
//! ## Building it
//!
//! The chapter about our own locks built a Mutex from an atomic and futex-style wait/wake.
//! Here all the state lives behind a std [Mutex] and sleeping is done with a [Condvar], like the
//! poor man's channel from the channels chapter. The Mutex gives us two things for free:
//! - the count can't be observed half-updated (no transient negatives, no lost updates)
//! - unlocking in `release` happens-before locking in `acquire`, so whatever the releasing
//!   thread wrote before `release` is visible after the matching `acquire`
//!
//! ## Fairness
//!
//! Condvar's `notify_*` gives no guarantee about who wins the lock after a wake up, so a
//! thread could lose the race for a permit forever. Waiters take a ticket and are served in ticket
//! order, the same way a ticket spin lock works. A thread that finds free permits but
//! sees somebody queued also takes a ticket instead of barging in.
//!
//! There are no timeouts on purpose. If nobody releases, `acquire` sleeps forever,
//! and that's exactly what the deadlock exercise wants to show.

pub mod exclusive;

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::trace;

pub use exclusive::{Exclusive, ExclusiveGuard};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SemaphoreError {
    #[error("a semaphore can't start with a negative number of permits, got {0}")]
    NegativePermits(i64),
    #[error("{0} permits don't fit this platform's usize")]
    TooManyPermits(i64),
}

#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<State>,
    turn: Condvar,
}

#[derive(Debug)]
struct State {
    /// free permits, never below 0 by construction
    permits: usize,
    /// ticket the next waiter gets
    next_ticket: u64,
    /// ticket allowed to take the next permit
    serving: u64,
}

impl State {
    fn queued(&self) -> usize {
        (self.next_ticket - self.serving) as usize
    }
}

impl Semaphore {
    /// Makes a semaphore with `initial` permits.
    ///
    /// This is the only fallible operation of a semaphore.
    pub fn new(initial: i64) -> Result<Self, SemaphoreError> {
        if initial < 0 {
            return Err(SemaphoreError::NegativePermits(initial));
        }
        usize::try_from(initial)
            .map(Self::with_permits)
            .map_err(|_| SemaphoreError::TooManyPermits(initial))
    }

    pub const fn with_permits(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                next_ticket: 0,
                serving: 0,
            }),
            turn: Condvar::new(),
        }
    }

    /// 1 permit => at most 1 holder
    pub const fn binary() -> Self {
        Self::with_permits(1)
    }

    /// Takes a permit, sleeping until one is available and it's our turn.
    pub fn acquire(&self) {
        let mut state = self.lock();

        // fast path: permits are there and nobody is ahead of us
        if state.permits > 0 && state.queued() == 0 {
            state.permits -= 1;
            return;
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        trace!(ticket, queued = state.queued(), "no permit, waiting");

        while state.serving != ticket || state.permits == 0 {
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        state.permits -= 1;
        state.serving += 1;
        trace!(ticket, "got a permit");

        // several releases may have landed while we slept, let the next ticket check again
        if state.permits > 0 && state.queued() > 0 {
            self.turn.notify_all();
        }
    }

    /// Gives a permit back. Never blocks.
    pub fn release(&self) {
        let mut state = self.lock();
        state.permits += 1;
        if state.queued() > 0 {
            // every waiter re-checks, only the one with the serving ticket proceeds
            self.turn.notify_all();
        }
    }

    /// Takes a permit only if it wouldn't have to wait for it.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if state.permits > 0 && state.queued() == 0 {
            state.permits -= 1;
            true
        } else {
            false
        }
    }

    /// [Semaphore::acquire] that gives the permit back when the guard is dropped
    pub fn access(&self) -> Permit<'_> {
        self.acquire();
        Permit { semaphore: self }
    }

    /// It's a snapshot, it may be stale by the time it's looked at.
    pub fn available_permits(&self) -> usize {
        self.lock().permits
    }

    /// number of threads sleeping in [Semaphore::acquire]
    pub fn waiting(&self) -> usize {
        self.lock().queued()
    }

    // nobody panics while holding the state lock, but don't let a poisoned lock take the semaphore down
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::binary()
    }
}

/// Proof of a held permit, releases it on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
