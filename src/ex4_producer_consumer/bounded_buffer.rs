//! # Bounded buffer
//!
//! Three semaphores, three jobs:
//! - the queue's own binary semaphore - only one process mutates the queue at a time
//! - `items` - how many items can be taken, consumers sleep on it when the queue is empty
//! - `slots` - how much room is left, producers sleep on it when the queue is full
//!
//! The counting ones are released only after the queue change they announce is done,
//! so a consumer that got an item permit always finds an item.

use std::collections::VecDeque;

use crate::semaphore::{Exclusive, Semaphore};

struct Shelf<Y> {
    queue: VecDeque<Y>,
    produced: usize,
    consumed: usize,
}

/// A snapshot taken under the queue lock => `produced == consumed + buffered` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub produced: usize,
    pub consumed: usize,
    pub buffered: usize,
}

pub struct BoundedBuffer<Y> {
    shelf: Exclusive<Shelf<Y>>,
    items: Semaphore,
    slots: Semaphore,
    capacity: usize,
}

impl<Y> BoundedBuffer<Y> {
    /// A zero capacity buffer makes every `put` wait forever.
    pub fn new(capacity: usize) -> Self {
        Self {
            shelf: Exclusive::new(Shelf {
                queue: VecDeque::with_capacity(capacity),
                produced: 0,
                consumed: 0,
            }),
            items: Semaphore::with_permits(0),
            slots: Semaphore::with_permits(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Waits for room, then appends.
    pub fn put(&self, item: Y) {
        self.slots.acquire();
        {
            let mut shelf = self.shelf.lock();
            shelf.queue.push_back(item);
            shelf.produced += 1;
        }
        // announce only when the item is really there
        self.items.release();
    }

    /// Waits for an item, then removes the oldest one.
    pub fn take(&self) -> Y {
        self.items.acquire();
        let item = {
            let mut shelf = self.shelf.lock();
            match shelf.queue.pop_front() {
                Some(item) => {
                    shelf.consumed += 1;
                    item
                }
                // every item permit is released after a push
                None => unreachable!("got an item permit for an empty buffer"),
            }
        };
        self.slots.release();
        item
    }

    pub fn stats(&self) -> Stats {
        let shelf = self.shelf.lock();
        Stats {
            produced: shelf.produced,
            consumed: shelf.consumed,
            buffered: shelf.queue.len(),
        }
    }
}
