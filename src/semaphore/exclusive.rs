//! # Data behind a binary semaphore
//!
//! The exercises keep shared numbers and buffers next to a mutex semaphore and promise to
//! only touch them while holding it. [Exclusive] makes the promise checkable: the value is reachable
//! only through the guard, and the guard exists only while the permit is held.
//!
//! It's the spin lock from chapter 4 with the atomic swapped for a [Semaphore].

use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
};

use super::Semaphore;

pub struct Exclusive<Y> {
    lock: Semaphore,
    value: UnsafeCell<Y>,
}

// same promise as for a Mutex: sharing is fine as long as the value can move between threads
unsafe impl<Y> Sync for Exclusive<Y> where Y: Send {}

impl<Y> Exclusive<Y> {
    pub const fn new(value: Y) -> Self {
        Self {
            lock: Semaphore::binary(),
            value: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> ExclusiveGuard<'_, Y> {
        self.lock.acquire();
        ExclusiveGuard { exclusive: self }
    }

    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }
}

impl<Y> Default for Exclusive<Y>
where
    Y: Default,
{
    fn default() -> Self {
        Self::new(Y::default())
    }
}

/// Hands out `&Y` through a shared reference, so sharing the guard between threads
/// needs `Y: Sync`, like `MutexGuard`:
///
/// ```compile_fail
/// use std::{cell::Cell, thread};
/// use sync_exercises::semaphore::Exclusive;
///
/// let x = Exclusive::new(Cell::new(0));
/// let guard = x.lock();
/// thread::scope(|s| {
///     s.spawn(|| guard.set(guard.get() + 1));
///     s.spawn(|| guard.set(guard.get() + 1));
/// });
/// ```
pub struct ExclusiveGuard<'a, Y> {
    exclusive: &'a Exclusive<Y>,
}

// the auto impl would only ask for Y: Send through &Exclusive<Y>
unsafe impl<Y> Sync for ExclusiveGuard<'_, Y> where Y: Sync {}

impl<Y> Deref for ExclusiveGuard<'_, Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: the guard holds the only permit
        unsafe { &*self.exclusive.value.get() }
    }
}

impl<Y> DerefMut for ExclusiveGuard<'_, Y> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the guard holds the only permit
        unsafe { &mut *self.exclusive.value.get() }
    }
}

impl<Y> Drop for ExclusiveGuard<'_, Y> {
    fn drop(&mut self) {
        self.exclusive.lock.release();
    }
}
