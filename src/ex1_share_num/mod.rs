//! # Sharing a number
//!
//! Two processes, one adds 1, 2, .., N to a number, the other one subtracts the same.
//! Whatever the interleaving, the number must end up where it started.
//!
//! `num = num + i` is a read followed by a write, so without a lock two processes can read the
//! same value and one of the updates gets lost. The number lives inside [SharedCounter] behind
//! its own binary semaphore, so there's no way to touch it without the lock.

use crate::{co_begin, co_begin::LaunchError, semaphore::Exclusive, transcript::Transcript};

pub struct SharedCounter {
    value: Exclusive<i64>,
}

impl SharedCounter {
    pub fn new(value: i64) -> Self {
        Self {
            value: Exclusive::new(value),
        }
    }

    /// read-modify-write under the lock, returns the new value
    pub fn update(&self, f: impl FnOnce(i64) -> i64) -> i64 {
        let mut value = self.value.lock();
        *value = f(*value);
        *value
    }

    pub fn add(&self, delta: i64) -> i64 {
        self.update(|v| v + delta)
    }

    pub fn get(&self) -> i64 {
        self.update(|v| v)
    }

    pub fn into_inner(self) -> i64 {
        self.value.into_inner()
    }
}

pub fn run_share_num(start: i64, rounds: i64, t: &Transcript) -> Result<i64, LaunchError> {
    let num = SharedCounter::new(start);

    co_begin!(
        || {
            for i in 1..=rounds {
                num.add(i);
            }
        },
        || {
            for i in 1..=rounds {
                num.add(-i);
            }
        },
    )?;

    let result = num.into_inner();
    t.record(format!("The final value of Num is: {result}"));
    Ok(result)
}

pub fn run() -> Result<(), LaunchError> {
    run_share_num(10, 5, &Transcript::echo_only()).map(|_| ())
}

#[cfg(test)]
mod test {
    use std::thread::scope;

    use super::*;

    #[test]
    fn test_ends_where_started() {
        for _ in 0..50 {
            let t = Transcript::silent();
            assert_eq!(run_share_num(10, 5, &t).unwrap(), 10);
            assert_eq!(t.lines(), vec!["The final value of Num is: 10"]);
        }
    }

    #[test]
    fn test_no_lost_updates() {
        let counter = SharedCounter::new(0);
        scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..10_000 {
                        counter.add(1);
                    }
                });
            }
        });
        assert_eq!(counter.get(), 80_000);
    }

    #[test]
    fn test_update_returns_new_value() {
        let counter = SharedCounter::new(3);
        assert_eq!(counter.update(|v| v * 2), 6);
        assert_eq!(counter.add(-1), 5);
    }
}
