//! Binds the counter to the handle table's signal protocol.
//!
//! Everything here runs with the record lock already held by the caller or
//! by the table; nothing takes a lock of its own.

use alloc::boxed::Box;
use core::any::Any;
use core::fmt;
use log::debug;
use w32sem_common::{Handle, HandleCapability, HandleKind};
use w32sem_hal::{HandleOps, SignalState};

use super::semaphore::{NamedSemaphore, ReleaseOverflow, Semaphore};
use crate::handle::{HandleError, HandleTable};

/// Register both semaphore kinds as waitable and signalable.
pub(crate) fn register_capabilities(table: &HandleTable) {
    let caps = HandleCapability::WAIT | HandleCapability::SIGNAL;
    table.register_capabilities(HandleKind::Semaphore, caps);
    table.register_capabilities(HandleKind::NamedSemaphore, caps);
}

/// The counter inside a semaphore payload.
///
/// # Panics
///
/// If `ops` is not a semaphore. Callers check the kind first, so reaching
/// the panic means a handle was validated against the wrong record.
pub(crate) fn counter(ops: &dyn HandleOps) -> &Semaphore {
    let kind = ops.kind();
    let sem = match kind {
        HandleKind::Semaphore => ops.as_any().downcast_ref::<Semaphore>(),
        HandleKind::NamedSemaphore => ops
            .as_any()
            .downcast_ref::<NamedSemaphore>()
            .map(NamedSemaphore::semaphore),
        _ => None,
    };
    sem.unwrap_or_else(|| panic!("{} payload is not a semaphore", kind.type_name()))
}

/// Mutable form of [`counter`], with the same contract.
pub(crate) fn counter_mut(ops: &mut dyn HandleOps) -> &mut Semaphore {
    let kind = ops.kind();
    let sem = match kind {
        HandleKind::Semaphore => ops.as_any_mut().downcast_mut::<Semaphore>(),
        HandleKind::NamedSemaphore => ops
            .as_any_mut()
            .downcast_mut::<NamedSemaphore>()
            .map(|named| &mut named.sem),
        _ => None,
    };
    sem.unwrap_or_else(|| panic!("{} payload is not a semaphore", kind.type_name()))
}

/// Release `n` units and broadcast the signaled state on success.
pub(crate) fn release(
    ops: &mut dyn HandleOps,
    n: u32,
    state: &mut dyn SignalState,
) -> Result<u32, ReleaseOverflow> {
    let kind = ops.kind();
    let sem = counter_mut(ops);
    match sem.release(n) {
        Ok(previous) => {
            debug!(
                "{} val {} count {} max {}",
                kind.type_name(),
                previous,
                n,
                sem.max()
            );
            state.set_signal_state(true, true);
            Ok(previous)
        }
        Err(overflow) => {
            debug!(
                "{} val {} count {} max {}, max value would be exceeded",
                kind.type_name(),
                overflow.previous,
                n,
                sem.max()
            );
            Err(overflow)
        }
    }
}

fn own(kind: HandleKind, sem: &mut Semaphore, state: &mut dyn SignalState) -> bool {
    debug!("owning {} with val {}", kind.type_name(), sem.count());
    match sem.acquire() {
        None => false,
        Some(0) => {
            state.set_signal_state(false, false);
            true
        }
        Some(_) => true,
    }
}

fn signal(kind: HandleKind, sem: &mut Semaphore, state: &mut dyn SignalState) {
    match sem.release(1) {
        Ok(_) => state.set_signal_state(true, true),
        Err(overflow) => debug!(
            "signalling {} with val {} max {}, max value would be exceeded",
            kind.type_name(),
            overflow.previous,
            sem.max()
        ),
    }
}

impl HandleOps for Semaphore {
    fn kind(&self) -> HandleKind {
        HandleKind::Semaphore
    }

    fn signal(&mut self, state: &mut dyn SignalState) {
        signal(HandleKind::Semaphore, self, state)
    }

    fn own(&mut self, state: &mut dyn SignalState) -> bool {
        own(HandleKind::Semaphore, self, state)
    }

    fn details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "val: {:5}, max: {:5}", self.count(), self.max())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl HandleOps for NamedSemaphore {
    fn kind(&self) -> HandleKind {
        HandleKind::NamedSemaphore
    }

    fn signal(&mut self, state: &mut dyn SignalState) {
        signal(HandleKind::NamedSemaphore, &mut self.sem, state)
    }

    fn own(&mut self, state: &mut dyn SignalState) -> bool {
        own(HandleKind::NamedSemaphore, &mut self.sem, state)
    }

    fn details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "val: {:5}, max: {:5}, name: \"{}\"",
            self.sem.count(),
            self.sem.max(),
            self.name()
        )
    }

    fn namespace_name(&self) -> Option<&str> {
        Some(self.name().as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Put a semaphore payload in the table and publish its initial state.
///
/// The new record's lock is the only lock taken here, so this may run under
/// the namespace lock.
pub(crate) fn install(table: &HandleTable, ops: Box<dyn HandleOps>) -> Result<Handle, HandleError> {
    let kind = ops.kind();
    let handle = table.allocate(ops)?;

    let record = table
        .resolve(handle)
        .unwrap_or_else(|err| panic!("fresh {} handle {}: {}", kind.type_name(), handle, err));
    assert_eq!(
        record.kind(),
        kind,
        "fresh handle {} resolved to the wrong record",
        handle
    );

    let mut guard = record.lock();
    if counter(guard.ops()).is_signaled() {
        guard.set_signal_state(true, false);
    }
    drop(guard);

    debug!("created {} handle {}", kind.type_name(), handle);
    Ok(handle)
}
