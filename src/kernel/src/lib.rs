//! w32sem
//!
//! Windows-compatible counting semaphores for a managed runtime, independent
//! of the host operating system.
//!
//! # Architecture
//!
//! - `sync`: the semaphore itself, from the bounded counter up to the
//!   create/release/open operations
//! - `handle`: the table that owns waitable records and their signal state
//! - `namespace`: the shared registry that deduplicates named objects
//! - `icall`: the entry points in the shape managed code calls them
//! - `config`: runtime limits
//!
//! # Safety
//!
//! This is a `#![no_std]` crate and contains no unsafe code.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod handle;
pub mod icall;
pub mod namespace;
pub mod sync;

#[cfg(test)]
mod testutil;

pub use config::SyncConfig;
pub use sync::{Creation, ReleaseError, SyncRuntime};
pub use w32sem_common::{Handle, HandleCapability, HandleKind, Win32Error};
pub use w32sem_hal::{HandleOps, SignalState};
