//! # Producers and consumers
//!
//! Producers make products and put them into a shared buffer, consumers take them out.
//! All the coordination lives in [BoundedBuffer], the processes themselves are plain loops.
//!
//! The classic version never stops: producers produce and consumers consume forever,
//! so [co_begin!] never returns. With a per-producer item limit, every consumer claims the items it's
//! going to take before waiting on the buffer, so nobody is left waiting for an item that will never come.

pub mod bounded_buffer;

use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

pub use bounded_buffer::{BoundedBuffer, Stats};

use crate::{
    co_begin,
    co_begin::{LaunchError, Process},
    transcript::Transcript,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub producer: usize,
    pub serial: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub producers: usize,
    pub consumers: usize,
    pub capacity: usize,
    /// items per producer, `None` => forever
    pub items: Option<usize>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 3,
            capacity: 8,
            items: None,
        }
    }
}

fn producer(id: usize, items: Option<usize>, buffer: &BoundedBuffer<Product>, t: &Transcript) {
    let mut serial = 0;
    while items.map_or(true, |limit| serial < limit) {
        serial += 1;
        let product = Product {
            producer: id,
            serial,
        };
        t.record(format!("Producer {id} made product {id}.{serial}"));
        buffer.put(product);
    }
}

/// claims one of the `remaining` items, `false` when there's nothing left to claim
fn claim(remaining: &Option<AtomicUsize>) -> bool {
    match remaining {
        None => true,
        Some(left) => left
            .fetch_update(Relaxed, Relaxed, |n| n.checked_sub(1))
            .is_ok(),
    }
}

fn consumer(
    id: usize,
    remaining: &Option<AtomicUsize>,
    buffer: &BoundedBuffer<Product>,
    t: &Transcript,
) {
    while claim(remaining) {
        let Product {
            producer: from,
            serial,
        } = buffer.take();
        t.record(format!("Consumer {id} consumed product {from}.{serial}"));
    }
}

/// Returns the buffer's stats, which only happens when `setup.items` is set.
pub fn run_producer_consumer(setup: &Setup, t: &Transcript) -> Result<Stats, LaunchError> {
    let buffer = BoundedBuffer::new(setup.capacity);
    run_on_buffer(&buffer, setup, t)?;
    Ok(buffer.stats())
}

/// Same as [run_producer_consumer] on a buffer the caller can watch,
/// `setup.capacity` is ignored in favor of the buffer's own.
pub fn run_on_buffer(
    buffer: &BoundedBuffer<Product>,
    setup: &Setup,
    t: &Transcript,
) -> Result<(), LaunchError> {
    let remaining = setup.items.map(|n| AtomicUsize::new(n * setup.producers));

    let producers = (1..=setup.producers)
        .map(|id| Box::new(move || producer(id, setup.items, buffer, t)) as Process);
    let consumers = (1..=setup.consumers).map(|id| {
        let remaining = &remaining;
        Box::new(move || consumer(id, remaining, buffer, t)) as Process
    });
    co_begin::co_begin(producers.chain(consumers).collect())
}

pub fn run(items: Option<usize>) -> Result<(), LaunchError> {
    let setup = Setup {
        items,
        ..Setup::default()
    };
    let stats = run_producer_consumer(&setup, &Transcript::echo_only())?;
    println!(
        "produced {}, consumed {}, left in the buffer {}",
        stats.produced, stats.consumed, stats.buffered
    );
    Ok(())
}
