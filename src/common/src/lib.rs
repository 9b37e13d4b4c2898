//! Shared vocabulary for the w32sem workspace.
//!
//! Types here are used by both the handle-table contract (`w32sem-hal`) and
//! the semaphore runtime (`w32sem`): compatibility error codes, handle kind
//! tags with their capability flags, and the opaque handle value.

#![no_std]
#![warn(missing_docs)]

pub mod capability;
pub mod error;
pub mod handle;

pub use capability::{HandleCapability, HandleKind};
pub use error::Win32Error;
pub use handle::Handle;
