//! # Readers and writers
//!
//! Any number of readers may be in the room together, a writer needs it empty.
//!
//! The room is guarded by the `empty` semaphore. A writer simply holds it.
//! Readers hold it as a group: the first one in takes it, the last one out gives it back.
//! That's the "lightswitch" - the first person in turns the light on, the last one turns it off.
//! The reader count is behind its own mutex semaphore, so checking "am I the first/last"
//! and changing the count happen in one step.
//!
//! The first reader sleeps on `empty` while holding the count's lock. That's on purpose: the
//! other readers queue up on the count behind it instead of sneaking into a room with a writer inside.
//!
//! Readers get priority, so a steady stream of readers can keep a writer out forever.

use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

use crate::{
    co_begin,
    co_begin::{LaunchError, Process},
    semaphore::{Exclusive, Semaphore},
    transcript::Transcript,
};

#[derive(Default)]
pub struct Room {
    readers: Exclusive<usize>,
    empty: Semaphore,
    // bookkeeping for the tests, not part of the protocol
    reading: AtomicUsize,
    writing: AtomicUsize,
    violations: AtomicUsize,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while sharing the room with other readers.
    pub fn read<R>(&self, f: impl FnOnce() -> R) -> R {
        {
            let mut readers = self.readers.lock();
            *readers += 1;
            if *readers == 1 {
                self.empty.acquire();
            }
        }

        self.reading.fetch_add(1, SeqCst);
        if self.writing.load(SeqCst) > 0 {
            self.violations.fetch_add(1, SeqCst);
        }
        let result = f();
        self.reading.fetch_sub(1, SeqCst);

        let mut readers = self.readers.lock();
        *readers -= 1;
        if *readers == 0 {
            self.empty.release();
        }
        result
    }

    /// Runs `f` alone in the room.
    pub fn write<R>(&self, f: impl FnOnce() -> R) -> R {
        let _permit = self.empty.access();

        if self.writing.fetch_add(1, SeqCst) > 0 || self.reading.load(SeqCst) > 0 {
            self.violations.fetch_add(1, SeqCst);
        }
        let result = f();
        self.writing.fetch_sub(1, SeqCst);
        result
    }

    /// times somebody found the room in a state it shouldn't be in
    pub fn violations(&self) -> usize {
        self.violations.load(SeqCst)
    }
}

pub fn run_readers_writers(
    readers: usize,
    writers: usize,
    visits: usize,
    t: &Transcript,
) -> Result<usize, LaunchError> {
    let room = Room::new();

    let writer_procs = (1..=writers).map(|id| {
        let room = &room;
        Box::new(move || {
            for _ in 0..visits {
                room.write(|| {
                    t.record(format!("Writer {id} started writing"));
                    t.record(format!("Writer {id} stopped writing"));
                });
            }
        }) as Process
    });
    let reader_procs = (1..=readers).map(|id| {
        let room = &room;
        Box::new(move || {
            for _ in 0..visits {
                room.read(|| {
                    t.record(format!("Reader {id} started reading"));
                    t.record(format!("Reader {id} stopped reading"));
                });
            }
        }) as Process
    });
    co_begin::co_begin(writer_procs.chain(reader_procs).collect())?;

    Ok(room.violations())
}

pub fn run(visits: usize) -> Result<(), LaunchError> {
    // 2 writers and 6 readers, like the classic setup
    let violations = run_readers_writers(6, 2, visits, &Transcript::echo_only())?;
    println!("violations: {violations}");
    Ok(())
}
