//! Windows-compatible counting semaphores.
//!
//! The module is layered leaves first:
//!
//! - [`semaphore`]: the bounded counter and its transition rules
//! - `signal`: the counter's callbacks for the handle table
//! - `named`: create-or-open through the shared namespace
//! - [`SyncRuntime`]: validation, dispatch and error mapping
//!
//! Nothing here blocks. Waiting is left to an external scheduler that
//! claims units through [`HandleTable::try_own`](crate::handle::HandleTable::try_own).
//!
//! # Example
//!
//! ```
//! use w32sem::sync::SyncRuntime;
//! use w32sem::Win32Error;
//!
//! let rt = SyncRuntime::default();
//! let created = rt.create_semaphore(0, 4, Some("workers")).unwrap();
//! assert_eq!(created.status(), Win32Error::Success);
//!
//! assert_eq!(rt.release_semaphore(created.handle(), 3), Ok(0));
//!
//! // Over-releasing reads the current count without changing it.
//! let err = rt.release_semaphore(created.handle(), 4).unwrap_err();
//! assert_eq!(err.previous_count(), Some(3));
//! ```

mod api;
mod named;
pub mod semaphore;
mod signal;

pub use api::{Creation, ReleaseError, SemaphoreInfo, SyncRuntime};
pub use semaphore::{NamedSemaphore, ReleaseOverflow, Semaphore};
