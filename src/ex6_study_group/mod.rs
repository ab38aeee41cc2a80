//! # Study group
//!
//! Students come and go to study in a room. Officer Dangle checks on the room, and may go in only if
//! - the room is empty, to search it
//! - there are more than `limit` students, to break up the party
//!
//! With 1..=limit students inside he waits outside. While he's in the room no student may enter,
//! and when he breaks up a party he doesn't leave until everybody else has.
//!
//! All the waiting is blocking, there's no "loop until students are gone":
//! - `summon` - the officer sleeps on it while the room is in the wrong state. A student who changes
//!   the count to something the officer may act on releases it. The officer re-checks after waking
//! - `clear` - the officer sleeps on it while the party is breaking up, the last student out releases it
//! - `turnstile` - students pass through it on the way in, the officer holds it while he's inside
//!   so the newcomers sleep on it

use std::thread;

use crate::{
    co_begin,
    co_begin::{LaunchError, Process},
    semaphore::{Exclusive, Semaphore},
    transcript::Transcript,
};

pub const OFFICER_ENTERED: &str = "Officer Dangle entered the room.";
pub const OFFICER_LEFT: &str = "Officer Dangle left the room.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Officer {
    Away,
    /// outside, waiting for the room to get empty or crowded
    Waiting,
    /// a student released `summon`, he hasn't looked yet
    Summoned,
    Inside,
}

struct Occupancy {
    students: usize,
    officer: Officer,
}

pub struct StudyRoom {
    limit: usize,
    occupancy: Exclusive<Occupancy>,
    summon: Semaphore,
    clear: Semaphore,
    turnstile: Semaphore,
}

impl StudyRoom {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            occupancy: Exclusive::new(Occupancy {
                students: 0,
                officer: Officer::Away,
            }),
            summon: Semaphore::with_permits(0),
            clear: Semaphore::with_permits(0),
            turnstile: Semaphore::binary(),
        }
    }

    pub fn students(&self) -> usize {
        self.occupancy.lock().students
    }

    pub fn officer(&self) -> Officer {
        self.occupancy.lock().officer
    }

    fn officer_may_act(&self, students: usize) -> bool {
        students == 0 || students > self.limit
    }

    /// wakes the officer if he's waiting for the room to look like it does now
    fn maybe_summon(&self, occupancy: &mut Occupancy) {
        if occupancy.officer == Officer::Waiting && self.officer_may_act(occupancy.students) {
            occupancy.officer = Officer::Summoned;
            self.summon.release();
        }
    }

    /// enters, runs `study`, leaves
    pub fn student_visit(&self, id: usize, t: &Transcript, study: impl FnOnce()) {
        loop {
            // sleeps here while the officer is inside
            self.turnstile.acquire();
            self.turnstile.release();

            let mut occupancy = self.occupancy.lock();
            // the officer may have gone in after we passed the turnstile => back to it
            if occupancy.officer != Officer::Inside {
                occupancy.students += 1;
                t.record(format!("Student {id} entered the room."));
                self.maybe_summon(&mut occupancy);
                break;
            }
        }

        study();

        let mut occupancy = self.occupancy.lock();
        occupancy.students -= 1;
        t.record(format!("Student {id} left the room."));
        if occupancy.students == 0 && occupancy.officer == Officer::Inside {
            self.clear.release();
        }
        self.maybe_summon(&mut occupancy);
    }

    pub fn officer_visit(&self, t: &Transcript) {
        let mut occupancy = self.occupancy.lock();
        while !self.officer_may_act(occupancy.students) {
            occupancy.officer = Officer::Waiting;
            drop(occupancy);
            self.summon.acquire();
            occupancy = self.occupancy.lock();
        }

        occupancy.officer = Officer::Inside;
        self.turnstile.acquire();
        t.record(OFFICER_ENTERED);

        if occupancy.students > 0 {
            // breaking up the party, wait for the last one out
            drop(occupancy);
            self.clear.acquire();
            occupancy = self.occupancy.lock();
        }

        occupancy.officer = Officer::Away;
        t.record(OFFICER_LEFT);
        self.turnstile.release();
    }
}

pub fn run_study_group(
    students: usize,
    limit: usize,
    visits: usize,
    t: &Transcript,
) -> Result<(), LaunchError> {
    let room = StudyRoom::new(limit);

    let students = (1..=students).map(|id| {
        let room = &room;
        Box::new(move || {
            for _ in 0..visits {
                room.student_visit(id, t, thread::yield_now);
            }
        }) as Process
    });
    let officer = {
        let room = &room;
        Box::new(move || {
            for _ in 0..visits {
                room.officer_visit(t);
            }
        }) as Process
    };
    co_begin::co_begin(students.chain([officer]).collect())
}

pub fn run(visits: usize) -> Result<(), LaunchError> {
    run_study_group(8, 5, visits, &Transcript::echo_only())
}
