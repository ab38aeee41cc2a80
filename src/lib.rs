//! Classic synchronization exercises on top of two things:
//! a counting [semaphore::Semaphore] and [co_begin::co_begin], which runs processes concurrently
//! and waits for all of them.

pub mod co_begin;
pub mod config;
pub mod semaphore;
pub mod transcript;

pub mod ex1_share_num;
pub mod ex2_order;
pub mod ex3_deadlock;
pub mod ex4_producer_consumer;
pub mod ex5_readers_writers;
pub mod ex6_study_group;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Launch(#[from] co_begin::LaunchError),
}
