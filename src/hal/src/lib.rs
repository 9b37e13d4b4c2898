//! Handle-table callback contract.
//!
//! This crate defines the traits a handle table and the per-kind object
//! implementations meet at. The table owns records, reference counts and the
//! per-record lock; each kind supplies a [`HandleOps`] payload whose callbacks
//! the table invokes while that lock is held. Callbacks report signal changes
//! back through [`SignalState`].

#![no_std]

use core::any::Any;
use core::fmt;

pub use w32sem_common::{HandleCapability, HandleKind};

/// Signal-state surface a handle table exposes to callbacks.
///
/// Only valid while the record lock is held.
pub trait SignalState {
    /// Current signaled flag of the record.
    fn is_signaled(&self) -> bool;

    /// Set the signaled flag. With `broadcast`, every registered waiter is
    /// woken so it can try to claim the object.
    fn set_signal_state(&mut self, signaled: bool, broadcast: bool);
}

/// Per-kind callbacks of a waitable object stored in a handle table.
pub trait HandleOps: Any + Send {
    /// Kind tag of this payload.
    fn kind(&self) -> HandleKind;

    /// Signal the object once on behalf of a signal-and-wait caller.
    fn signal(&mut self, state: &mut dyn SignalState) {
        let _ = state;
    }

    /// Claim the object for a waiter chosen by the scheduler.
    ///
    /// Called only while the record is signaled. Returns `false` if the
    /// object could not be claimed after all.
    fn own(&mut self, state: &mut dyn SignalState) -> bool;

    /// Called once when the last reference to the record is released.
    fn close(&mut self) {}

    /// Kind-specific state for diagnostics.
    fn details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Name under which the object is registered, for named kinds.
    fn namespace_name(&self) -> Option<&str> {
        None
    }

    /// Upcast for safe downcasting to the concrete payload.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for safe downcasting to the concrete payload.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Adapter that renders [`HandleOps::details`] through `Display`.
pub struct Details<'a>(pub &'a dyn HandleOps);

impl fmt::Display for Details<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.details(f)
    }
}
