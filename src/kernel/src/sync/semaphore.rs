//! Bounded counter behind every semaphore handle.
//!
//! This is pure state: no locking, no signal propagation. Callers hold the
//! record lock and forward transitions to the handle table through
//! [`super::signal`].

use thiserror::Error;
use w32sem_common::Win32Error;

use crate::namespace::ObjectName;

/// A release that would have pushed the count past the maximum.
///
/// The count is left untouched, but `previous` still reports it. Managed
/// code relies on this: over-releasing on purpose is a documented way to
/// read a semaphore's current count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("release would exceed the maximum count (count was {previous})")]
pub struct ReleaseOverflow {
    /// Count observed before the rejected release.
    pub previous: u32,
}

/// Counting semaphore state.
///
/// `max` is signed because the managed API is; it is always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semaphore {
    count: u32,
    max: i32,
}

impl Semaphore {
    /// Create a semaphore holding `initial` units out of `max`.
    ///
    /// Fails with [`Win32Error::InvalidParameter`] unless `max > 0` and
    /// `0 <= initial <= max`.
    pub fn new(initial: i32, max: i32) -> Result<Self, Win32Error> {
        if max <= 0 || initial < 0 || initial > max {
            return Err(Win32Error::InvalidParameter);
        }
        Ok(Self {
            count: initial as u32,
            max,
        })
    }

    /// Units currently available.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Upper bound on the count.
    pub fn max(&self) -> i32 {
        self.max
    }

    /// `count > 0`.
    pub fn is_signaled(&self) -> bool {
        self.count > 0
    }

    /// Take one unit for a waiter.
    ///
    /// Returns `None` and changes nothing if the count is already zero.
    /// Otherwise returns the count left behind.
    pub fn acquire(&mut self) -> Option<u32> {
        self.count = self.count.checked_sub(1)?;
        Some(self.count)
    }

    /// Add `n` units, returning the count seen before the call.
    pub fn release(&mut self, n: u32) -> Result<u32, ReleaseOverflow> {
        let previous = self.count;
        // The maximum is signed but compared as unsigned, and the sum is
        // widened so a huge `n` cannot wrap around.
        if u64::from(previous) + u64::from(n) > u64::from(self.max as u32) {
            return Err(ReleaseOverflow { previous });
        }
        self.count = previous + n;
        Ok(previous)
    }
}

/// A semaphore registered in the shared namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSemaphore {
    pub(crate) sem: Semaphore,
    name: ObjectName,
}

impl NamedSemaphore {
    /// Attach a namespace name to a semaphore.
    pub fn new(sem: Semaphore, name: ObjectName) -> Self {
        Self { sem, name }
    }

    /// The counter.
    pub fn semaphore(&self) -> &Semaphore {
        &self.sem
    }

    /// Name the semaphore is registered under.
    pub fn name(&self) -> &ObjectName {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_new_validates() {
        assert!(Semaphore::new(0, 5).is_ok());
        assert!(Semaphore::new(5, 5).is_ok());
        assert_eq!(Semaphore::new(3, 2), Err(Win32Error::InvalidParameter));
        assert_eq!(Semaphore::new(-1, 2), Err(Win32Error::InvalidParameter));
        assert_eq!(Semaphore::new(0, 0), Err(Win32Error::InvalidParameter));
        assert_eq!(Semaphore::new(0, -4), Err(Win32Error::InvalidParameter));
    }

    #[test]
    fn test_semaphore_acquire() {
        let mut sem = Semaphore::new(2, 2).unwrap();

        assert_eq!(sem.acquire(), Some(1));
        assert!(sem.is_signaled());
        assert_eq!(sem.acquire(), Some(0));
        assert!(!sem.is_signaled());

        // Draining an empty semaphore changes nothing
        assert_eq!(sem.acquire(), None);
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_semaphore_release() {
        let mut sem = Semaphore::new(0, 4).unwrap();

        assert_eq!(sem.release(3), Ok(0));
        assert_eq!(sem.count(), 3);
        assert!(sem.is_signaled());
        assert_eq!(sem.release(1), Ok(3));
        assert_eq!(sem.count(), 4);
    }

    #[test]
    fn test_semaphore_overflow_reports_previous_count() {
        let mut sem = Semaphore::new(2, 4).unwrap();

        assert_eq!(sem.release(3), Err(ReleaseOverflow { previous: 2 }));
        assert_eq!(sem.count(), 2);

        // Probing with a release that can never fit reads the count
        assert_eq!(sem.release(u32::MAX), Err(ReleaseOverflow { previous: 2 }));
        assert_eq!(sem.count(), 2);
    }

    #[test]
    fn test_semaphore_max_is_i32_max() {
        let mut sem = Semaphore::new(i32::MAX - 1, i32::MAX).unwrap();

        assert_eq!(sem.release(1), Ok(i32::MAX as u32 - 1));
        assert_eq!(
            sem.release(1),
            Err(ReleaseOverflow {
                previous: i32::MAX as u32
            })
        );
    }
}
