//! Arena-backed handle table.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;
use core::task::Waker;
use crossbeam_queue::ArrayQueue;
use log::{debug, trace, warn};
use spin::{Mutex, MutexGuard};
use thiserror::Error;
use w32sem_common::{Handle, HandleCapability, HandleKind, Win32Error};
use w32sem_hal::{Details, HandleOps, SignalState};

/// Errors reported by the handle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Every slot is in use.
    #[error("handle table is full ({capacity} records)")]
    Exhausted {
        /// Configured capacity.
        capacity: usize,
    },
    /// The handle was never allocated or its record was reclaimed.
    #[error("unknown handle {0}")]
    Unknown(Handle),
    /// The record's kind did not register the needed capability.
    #[error("{} handle {handle} does not support {needed:?}", .kind.type_name())]
    Unsupported {
        /// Handle that was used.
        handle: Handle,
        /// Kind of the record behind it.
        kind: HandleKind,
        /// Capability the operation needs.
        needed: HandleCapability,
    },
}

impl From<HandleError> for Win32Error {
    fn from(err: HandleError) -> Self {
        match err {
            HandleError::Exhausted { .. } => Win32Error::GenFailure,
            HandleError::Unknown(_) | HandleError::Unsupported { .. } => Win32Error::InvalidHandle,
        }
    }
}

/// One waitable object owned by the table.
pub struct HandleRecord {
    handle: Handle,
    kind: HandleKind,
    state: Mutex<RecordState>,
    /// Wakers of tasks waiting for the record to become signaled.
    waiters: ArrayQueue<Waker>,
}

struct RecordState {
    signaled: bool,
    ops: Box<dyn HandleOps>,
}

impl HandleRecord {
    /// Handle this record was allocated under.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Kind tag of the payload.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Take the per-record lock.
    pub fn lock(&self) -> RecordGuard<'_> {
        RecordGuard {
            state: self.state.lock(),
            waiters: &self.waiters,
        }
    }
}

/// Scoped access to a locked record. Unlocks on drop.
pub struct RecordGuard<'a> {
    state: MutexGuard<'a, RecordState>,
    waiters: &'a ArrayQueue<Waker>,
}

impl RecordGuard<'_> {
    /// Current signaled flag.
    pub fn is_signaled(&self) -> bool {
        self.state.signaled
    }

    /// The kind callbacks.
    pub fn ops(&self) -> &dyn HandleOps {
        &*self.state.ops
    }

    /// Downcast the payload to its concrete type.
    pub fn payload<T: HandleOps>(&self) -> Option<&T> {
        self.state.ops.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast of the payload.
    pub fn payload_mut<T: HandleOps>(&mut self) -> Option<&mut T> {
        self.state.ops.as_any_mut().downcast_mut::<T>()
    }

    /// Run `f` with the payload and the record's signal state.
    pub fn with_signal<R>(
        &mut self,
        f: impl FnOnce(&mut dyn HandleOps, &mut dyn SignalState) -> R,
    ) -> R {
        let RecordState { signaled, ops } = &mut *self.state;
        let mut signal = RecordSignal {
            signaled,
            waiters: self.waiters,
        };
        f(&mut **ops, &mut signal)
    }

    /// Set the signaled flag, optionally waking every queued waiter.
    pub fn set_signal_state(&mut self, signaled: bool, broadcast: bool) {
        RecordSignal {
            signaled: &mut self.state.signaled,
            waiters: self.waiters,
        }
        .set_signal_state(signaled, broadcast);
    }
}

struct RecordSignal<'a> {
    signaled: &'a mut bool,
    waiters: &'a ArrayQueue<Waker>,
}

impl SignalState for RecordSignal<'_> {
    fn is_signaled(&self) -> bool {
        *self.signaled
    }

    fn set_signal_state(&mut self, signaled: bool, broadcast: bool) {
        *self.signaled = signaled;
        if broadcast {
            let mut woken = 0usize;
            while let Some(waker) = self.waiters.pop() {
                waker.wake();
                woken += 1;
            }
            trace!("broadcast woke {} waiters", woken);
        }
    }
}

/// A counted reference to a record, taken by [`HandleTable::resolve`].
///
/// Dropping it gives the reference back, which may reclaim the record.
pub struct RecordRef<'t> {
    table: &'t HandleTable,
    record: Arc<HandleRecord>,
}

impl Deref for RecordRef<'_> {
    type Target = HandleRecord;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl Drop for RecordRef<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.table.release_reference(self.record.handle) {
            warn!("dropping temporary reference: {}", err);
        }
    }
}

struct Slot {
    generation: u32,
    live: Option<LiveSlot>,
}

struct LiveSlot {
    refs: usize,
    record: Arc<HandleRecord>,
}

struct Slots {
    entries: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Slots {
    fn live_mut(&mut self, handle: Handle) -> Option<&mut LiveSlot> {
        let slot = self.entries.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.live.as_mut()
    }
}

/// Runs after a named record is reclaimed, with its old handle and the
/// name it was registered under.
pub type ReclaimHook = Box<dyn Fn(Handle, &str) + Send + Sync>;

fn next_generation(generation: u32) -> u32 {
    // Zero is reserved so that a raw handle value is never null.
    generation.wrapping_add(1).max(1)
}

/// Records addressed by generation-checked handles.
///
/// The slot lock only guards reference counts and slot bookkeeping; each
/// record carries its own lock for its payload and signal state.
pub struct HandleTable {
    slots: Mutex<Slots>,
    capabilities: Mutex<BTreeMap<HandleKind, HandleCapability>>,
    capacity: usize,
    waiters_per_handle: usize,
    on_reclaim: Option<ReclaimHook>,
}

impl HandleTable {
    /// Create an empty table holding at most `capacity` live records.
    pub fn new(capacity: usize, waiters_per_handle: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
            capabilities: Mutex::new(BTreeMap::new()),
            capacity: capacity.min(u32::MAX as usize),
            // ArrayQueue cannot be empty.
            waiters_per_handle: waiters_per_handle.max(1),
            on_reclaim: None,
        }
    }

    /// Install `hook`, run once for every named record the table reclaims.
    ///
    /// The hook runs with no table or record lock held. Whoever drops the
    /// last reference runs it, so that caller must not hold a lock the hook
    /// takes.
    pub fn with_reclaim_hook(mut self, hook: ReclaimHook) -> Self {
        self.on_reclaim = Some(hook);
        self
    }

    /// Declare which table operations records of `kind` support.
    pub fn register_capabilities(&self, kind: HandleKind, caps: HandleCapability) {
        self.capabilities.lock().insert(kind, caps);
    }

    /// Capabilities registered for `kind`; empty if none were.
    pub fn capabilities(&self, kind: HandleKind) -> HandleCapability {
        self.capabilities
            .lock()
            .get(&kind)
            .copied()
            .unwrap_or(HandleCapability::empty())
    }

    /// Store `ops` in a new record. The caller owns the one reference.
    pub fn allocate(&self, ops: Box<dyn HandleOps>) -> Result<Handle, HandleError> {
        let kind = ops.kind();
        let mut guard = self.slots.lock();
        let slots = &mut *guard;

        let index = match slots.free.pop() {
            Some(index) => index,
            None => {
                if slots.entries.len() >= self.capacity {
                    warn!(
                        "cannot allocate {} handle: table full ({} records)",
                        kind.type_name(),
                        self.capacity
                    );
                    return Err(HandleError::Exhausted {
                        capacity: self.capacity,
                    });
                }
                slots.entries.push(Slot {
                    generation: 1,
                    live: None,
                });
                (slots.entries.len() - 1) as u32
            }
        };

        let slot = &mut slots.entries[index as usize];
        let handle = Handle::new(index, slot.generation);
        slot.live = Some(LiveSlot {
            refs: 1,
            record: Arc::new(HandleRecord {
                handle,
                kind,
                state: Mutex::new(RecordState {
                    signaled: false,
                    ops,
                }),
                waiters: ArrayQueue::new(self.waiters_per_handle),
            }),
        });
        slots.live += 1;

        trace!("allocated {} handle {}", kind.type_name(), handle);
        Ok(handle)
    }

    /// Resolve a handle and take a temporary reference to its record.
    pub fn resolve(&self, handle: Handle) -> Result<RecordRef<'_>, HandleError> {
        let mut slots = self.slots.lock();
        let live = slots.live_mut(handle).ok_or(HandleError::Unknown(handle))?;
        live.refs += 1;
        Ok(RecordRef {
            table: self,
            record: Arc::clone(&live.record),
        })
    }

    /// Take an extra long-lived reference, e.g. for a second opener.
    pub fn add_ref(&self, handle: Handle) -> Result<(), HandleError> {
        let mut slots = self.slots.lock();
        let live = slots.live_mut(handle).ok_or(HandleError::Unknown(handle))?;
        live.refs += 1;
        Ok(())
    }

    /// Whether `handle` still names a live record.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.slots.lock().live_mut(handle).is_some()
    }

    /// Give back one reference held by a caller.
    pub fn close(&self, handle: Handle) -> Result<(), HandleError> {
        self.release_reference(handle)
    }

    /// Number of live records.
    pub fn live_handles(&self) -> usize {
        self.slots.lock().live
    }

    fn release_reference(&self, handle: Handle) -> Result<(), HandleError> {
        let reclaimed = {
            let mut guard = self.slots.lock();
            let slots = &mut *guard;
            let slot = slots
                .entries
                .get_mut(handle.index() as usize)
                .filter(|slot| slot.generation == handle.generation())
                .ok_or(HandleError::Unknown(handle))?;
            let live = slot.live.as_mut().ok_or(HandleError::Unknown(handle))?;
            live.refs -= 1;
            if live.refs > 0 {
                return Ok(());
            }

            let record = slot.live.take().map(|live| live.record);
            slot.generation = next_generation(slot.generation);
            slots.free.push(handle.index());
            slots.live -= 1;
            record
        };

        let Some(record) = reclaimed else {
            return Ok(());
        };
        debug!("reclaimed {} handle {}", record.kind.type_name(), handle);
        let name = {
            let mut state = record.state.lock();
            let name = state.ops.namespace_name().map(String::from);
            state.ops.close();
            name
        };
        if let (Some(hook), Some(name)) = (&self.on_reclaim, name) {
            hook(handle, &name);
        }
        Ok(())
    }

    fn require(&self, record: &HandleRecord, needed: HandleCapability) -> Result<(), HandleError> {
        if self.capabilities(record.kind).contains(needed) {
            Ok(())
        } else {
            Err(HandleError::Unsupported {
                handle: record.handle,
                kind: record.kind,
                needed,
            })
        }
    }

    /// Queue `waker` until the record is next signaled with a broadcast.
    ///
    /// A record that is already signaled wakes the waker straight away, as
    /// does a full waiter queue; the waiter then retries [`Self::try_own`].
    pub fn register_waiter(&self, handle: Handle, waker: Waker) -> Result<(), HandleError> {
        let record = self.resolve(handle)?;
        self.require(&record, HandleCapability::WAIT)?;

        let guard = record.lock();
        if guard.is_signaled() {
            waker.wake();
            return Ok(());
        }
        if let Err(waker) = record.waiters.push(waker) {
            trace!("waiter queue of {} full, waking early", handle);
            waker.wake();
        }
        Ok(())
    }

    /// Claim a signaled record for a waiter without blocking.
    ///
    /// Returns `Ok(false)` if the record is not signaled.
    pub fn try_own(&self, handle: Handle) -> Result<bool, HandleError> {
        let record = self.resolve(handle)?;
        self.require(&record, HandleCapability::WAIT)?;

        let mut guard = record.lock();
        if !guard.is_signaled() {
            return Ok(false);
        }
        let owned = guard.with_signal(|ops, signal| ops.own(signal));
        debug!(
            "own {} handle {}: {}",
            record.kind.type_name(),
            handle,
            if owned { "claimed" } else { "refused" }
        );
        Ok(owned)
    }

    /// Signal a record once, as a signal-and-wait caller does.
    pub fn signal(&self, handle: Handle) -> Result<(), HandleError> {
        let record = self.resolve(handle)?;
        self.require(&record, HandleCapability::SIGNAL)?;

        let mut guard = record.lock();
        guard.with_signal(|ops, signal| ops.signal(signal));
        Ok(())
    }

    /// Type name and kind-specific state of a record, for diagnostics.
    pub fn details(&self, handle: Handle) -> Result<String, HandleError> {
        let record = self.resolve(handle)?;
        let guard = record.lock();
        let line = format!(
            "{} {}: {}",
            record.kind.type_name(),
            handle,
            Details(guard.ops())
        );
        Ok(line)
    }
}
