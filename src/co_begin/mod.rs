//! # Co-begin
//!
//! Start a bunch of processes at once and wait for all of them to finish.
//!
//! Every process gets its own OS thread, so there's no limit on how many of them run at once
//! other than the OS itself. Processes are started inside [std::thread::scope],
//! which means they can borrow semaphores and shared state from the caller's stack
//! instead of relying on globals.
//!
//! Start order is unspecified. If a process needs to go after another one, it has to be told so
//! through a semaphore.
//!
//! ## Panics
//!
//! A panicking process doesn't affect the other ones. Once everybody's finished,
//! [co_begin] reports which processes panicked via [LaunchError::Panicked].
//!
//! If one of the processes never returns, neither does [co_begin]. That's expected for the
//! exercises which loop forever.

use std::{any::Any, io, thread};

use thiserror::Error;
use tracing::{debug, warn};

/// A unit of work for [co_begin]: no arguments, may borrow from the caller.
pub type Process<'env> = Box<dyn FnOnce() + Send + 'env>;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("unable to start process {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("{} process(es) panicked: {}", .units.len(), describe(.units))]
    Panicked { units: Vec<(usize, String)> },
}

fn describe(units: &[(usize, String)]) -> String {
    units
        .iter()
        .map(|(i, msg)| format!("#{i} ({msg})"))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Runs all the `procs` concurrently and returns when all of them are done.
pub fn co_begin<'env>(procs: Vec<Process<'env>>) -> Result<(), LaunchError> {
    debug!(processes = procs.len(), "co-begin");

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(procs.len());
        let mut spawn_error = None;

        for (index, proc) in procs.into_iter().enumerate() {
            match thread::Builder::new()
                .name(format!("process-{}", index + 1))
                .spawn_scoped(s, proc)
            {
                Ok(handle) => handles.push((index, handle)),
                Err(source) => {
                    // the ones already running are joined below anyway
                    spawn_error = Some(LaunchError::Spawn { index, source });
                    break;
                }
            }
        }

        let mut panicked = Vec::new();
        for (index, handle) in handles {
            if let Err(payload) = handle.join() {
                let msg = panic_message(payload.as_ref());
                warn!(index, %msg, "process panicked");
                panicked.push((index, msg));
            }
        }
        debug!("co-end");

        match spawn_error {
            Some(e) => Err(e),
            None if !panicked.is_empty() => Err(LaunchError::Panicked { units: panicked }),
            None => Ok(()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Boxes each closure so different closure types fit in one call:
/// `co_begin!(|| a(), || b())`
#[macro_export]
macro_rules! co_begin {
    ($($proc:expr),* $(,)?) => {
        $crate::co_begin::co_begin(vec![$(Box::new($proc) as $crate::co_begin::Process<'_>),*])
    };
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering::Relaxed},
            Barrier,
        },
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_waits_for_all() {
        let done = AtomicUsize::new(0);
        let procs: Vec<Process> = (0..10)
            .map(|i| {
                let done = &done;
                Box::new(move || {
                    thread::sleep(Duration::from_millis(10 * i));
                    done.fetch_add(1, Relaxed);
                }) as Process
            })
            .collect();
        co_begin(procs).unwrap();
        assert_eq!(done.load(Relaxed), 10);
    }

    #[test]
    fn test_empty() {
        assert!(co_begin(Vec::new()).is_ok());
    }

    #[test]
    fn test_runs_concurrently() {
        // a barrier only opens if all of the processes are running at the same time
        let n = 16;
        let barrier = Barrier::new(n);
        let procs = (0..n)
            .map(|_| {
                let barrier = &barrier;
                Box::new(move || {
                    barrier.wait();
                }) as Process
            })
            .collect();
        co_begin(procs).unwrap();
    }

    #[test]
    fn test_macro_mixed_closures() {
        let a = AtomicUsize::new(0);
        let b = String::from("borrowed");
        crate::co_begin!(
            || {
                a.fetch_add(1, Relaxed);
            },
            || assert_eq!(b.len(), 8),
        )
        .unwrap();
        assert_eq!(a.load(Relaxed), 1);
    }

    #[test]
    fn test_panic_is_reported() {
        let done = AtomicUsize::new(0);
        let err = crate::co_begin!(
            || {
                done.fetch_add(1, Relaxed);
            },
            || panic!("boom"),
            || {
                thread::sleep(Duration::from_millis(50));
                done.fetch_add(1, Relaxed);
            },
        )
        .unwrap_err();

        // the others still ran to completion
        assert_eq!(done.load(Relaxed), 2);
        match err {
            LaunchError::Panicked { units } => {
                assert_eq!(units, vec![(1, "boom".to_string())]);
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_panic_message_formats() {
        let err = crate::co_begin!(|| panic!("{} went wrong", 42)).unwrap_err();
        assert_eq!(err.to_string(), "1 process(es) panicked: #0 (42 went wrong)");
    }
}
