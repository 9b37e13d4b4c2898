//! Entry points called by the managed `System.Threading.Semaphore` class.
//!
//! These keep the calling convention managed code expects: names arrive as
//! UTF-16, handles as raw values, and outcomes are reported both as a
//! return value and through the calling thread's last-error slot.

use log::{debug, warn};
use w32sem_common::{Handle, Win32Error};

use crate::namespace::ObjectName;
use crate::sync::{ReleaseError, SyncRuntime};

/// A thread's last-error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastError(Win32Error);

impl Default for LastError {
    fn default() -> Self {
        Self(Win32Error::Success)
    }
}

impl LastError {
    /// Current value.
    pub fn get(&self) -> Win32Error {
        self.0
    }

    /// Overwrite the value.
    pub fn set(&mut self, error: Win32Error) {
        self.0 = error;
    }

    /// Reset to `Success`.
    pub fn clear(&mut self) {
        self.0 = Win32Error::Success;
    }
}

/// Result of [`release_semaphore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseResult {
    /// Whether the count was raised.
    pub success: bool,
    /// Count before the call; present whenever the handle resolved to a
    /// semaphore, including when the release overflowed.
    pub previous_count: Option<i32>,
}

/// `CreateSemaphore`: returns the handle (if any) and the error code.
///
/// Bad counts are reported through the return value only. Past that point
/// the last error is cleared and then set to the status, since a successful
/// open of an existing named semaphore returns a handle *and*
/// `AlreadyExists`.
pub fn create_semaphore(
    rt: &SyncRuntime,
    initial: i32,
    max: i32,
    name: Option<&[u16]>,
    last_error: &mut LastError,
) -> (Option<Handle>, Win32Error) {
    let sem = match SyncRuntime::new_counter(initial, max) {
        Ok(sem) => sem,
        Err(err) => return (None, err),
    };
    last_error.clear();

    let name = name.map(|units| ObjectName::from_utf16(units, rt.config().max_name_len));
    let (handle, status) = match rt.create_with_name(sem, name) {
        Ok(creation) => (Some(creation.handle()), creation.status()),
        Err(err) => (None, err),
    };
    last_error.set(status);
    (handle, status)
}

/// `ReleaseSemaphore` on a raw handle value.
///
/// An overflowing release fails without touching the last error, but still
/// reports the previous count.
pub fn release_semaphore(
    rt: &SyncRuntime,
    raw_handle: u64,
    release_count: i32,
    last_error: &mut LastError,
) -> ReleaseResult {
    let Some(handle) = Handle::from_raw(raw_handle) else {
        warn!("release on null handle {:#x}", raw_handle);
        last_error.set(Win32Error::InvalidHandle);
        return ReleaseResult {
            success: false,
            previous_count: None,
        };
    };

    match rt.release_semaphore(handle, release_count) {
        Ok(previous) => ReleaseResult {
            success: true,
            previous_count: Some(previous as i32),
        },
        Err(ReleaseError::Overflow { previous }) => ReleaseResult {
            success: false,
            previous_count: Some(previous as i32),
        },
        Err(ReleaseError::Failed(err)) => {
            last_error.set(err);
            ReleaseResult {
                success: false,
                previous_count: None,
            }
        }
    }
}

/// `OpenSemaphore`. The requested access `rights` are not enforced, and the
/// status is only returned, never stored as the last error.
pub fn open_semaphore(rt: &SyncRuntime, name: &[u16], rights: i32) -> (Option<Handle>, Win32Error) {
    let name = ObjectName::from_utf16(name, rt.config().max_name_len);
    debug!("open \"{}\" with rights {:#x}", name, rights);

    match rt.open_with_name(&name) {
        Ok(handle) => (Some(handle), Win32Error::Success),
        Err(err) => (None, err),
    }
}
