//! Public semaphore operations.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use log::{debug, warn};
use thiserror::Error;
use w32sem_common::{Handle, Win32Error};

use super::named;
use super::semaphore::{NamedSemaphore, Semaphore};
use super::signal;
use crate::config::SyncConfig;
use crate::handle::HandleTable;
use crate::namespace::{Namespace, ObjectName};

/// How a successful create call got its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    /// A new semaphore was made.
    Created(Handle),
    /// A named semaphore with this name already existed and was opened.
    /// The handle is a full reference to the shared object.
    Opened(Handle),
}

impl Creation {
    /// The handle, whichever way it was obtained.
    pub fn handle(self) -> Handle {
        match self {
            Creation::Created(handle) | Creation::Opened(handle) => handle,
        }
    }

    /// Status reported next to the handle: `Success` or `AlreadyExists`.
    pub fn status(self) -> Win32Error {
        match self {
            Creation::Created(_) => Win32Error::Success,
            Creation::Opened(_) => Win32Error::AlreadyExists,
        }
    }
}

/// Why a release did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReleaseError {
    /// The count would have exceeded the maximum. Nothing changed;
    /// `previous` is the count at the time of the call.
    #[error("release would exceed the maximum count (count was {previous})")]
    Overflow {
        /// Count observed under the record lock.
        previous: u32,
    },
    /// The call was rejected before reaching a semaphore.
    #[error(transparent)]
    Failed(#[from] Win32Error),
}

impl ReleaseError {
    /// Count observed by the call, if it got as far as the semaphore.
    pub fn previous_count(self) -> Option<u32> {
        match self {
            ReleaseError::Overflow { previous } => Some(previous),
            ReleaseError::Failed(_) => None,
        }
    }
}

/// Snapshot of a semaphore taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreInfo {
    /// Units available.
    pub count: u32,
    /// Maximum count.
    pub max: i32,
    /// Signal state as published to the handle table.
    pub signaled: bool,
    /// Namespace name, for named semaphores.
    pub name: Option<String>,
}

/// Semaphore service: owns the handle table and the namespace.
///
/// One runtime is meant to be constructed per process (or per shared
/// namespace) and passed by reference to whoever needs it.
///
/// Reclaiming a named object removes its namespace entry, so handles must
/// not be closed while a [`Namespace::lock`] guard is held.
pub struct SyncRuntime {
    config: SyncConfig,
    table: HandleTable,
    namespace: Arc<Namespace>,
}

impl Default for SyncRuntime {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl SyncRuntime {
    /// Build a runtime and register the semaphore kinds with its table.
    pub fn new(config: SyncConfig) -> Self {
        let namespace = Arc::new(Namespace::new());
        let names = Arc::clone(&namespace);
        let table = HandleTable::new(config.max_handles, config.waiters_per_handle)
            .with_reclaim_hook(Box::new(move |handle: Handle, name: &str| {
                names.unregister(name, handle);
            }));
        signal::register_capabilities(&table);
        Self {
            config,
            table,
            namespace,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The handle table, for the wait scheduler.
    pub fn table(&self) -> &HandleTable {
        &self.table
    }

    /// The shared namespace, for other named kinds.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Canonical form of `name` under this runtime's bound.
    pub fn object_name(&self, name: &str) -> ObjectName {
        ObjectName::bounded(name, self.config.max_name_len)
    }

    /// Create a semaphore, or open the named one that already exists.
    ///
    /// `max` must be positive and `initial` within `0..=max`; otherwise
    /// `InvalidParameter` is returned and nothing is allocated.
    pub fn create_semaphore(
        &self,
        initial: i32,
        max: i32,
        name: Option<&str>,
    ) -> Result<Creation, Win32Error> {
        let sem = Self::new_counter(initial, max)?;
        self.create_with_name(sem, name.map(|name| self.object_name(name)))
    }

    /// Validate creation arguments into a counter.
    pub(crate) fn new_counter(initial: i32, max: i32) -> Result<Semaphore, Win32Error> {
        Semaphore::new(initial, max).map_err(|err| {
            debug!(
                "rejecting semaphore initial {} max {}: {}",
                initial, max, err
            );
            err
        })
    }

    pub(crate) fn create_with_name(
        &self,
        sem: Semaphore,
        name: Option<ObjectName>,
    ) -> Result<Creation, Win32Error> {
        match name {
            None => {
                debug!(
                    "creating semaphore initial {} max {}",
                    sem.count(),
                    sem.max()
                );
                let handle = signal::install(&self.table, Box::new(sem)).map_err(|err| {
                    warn!("error creating semaphore: {}", err);
                    Win32Error::from(err)
                })?;
                Ok(Creation::Created(handle))
            }
            Some(name) => named::create_or_open(&self.table, &self.namespace, sem, name),
        }
    }

    /// Add `release_count` units, returning the count before the call.
    ///
    /// On overflow nothing changes and the error still carries the count,
    /// which makes a deliberate over-release a way to read it.
    pub fn release_semaphore(&self, handle: Handle, release_count: i32) -> Result<u32, ReleaseError> {
        if release_count < 1 {
            debug!("rejecting release count {} on {}", release_count, handle);
            return Err(Win32Error::InvalidParameter.into());
        }

        let record = self.table.resolve(handle).map_err(|err| {
            warn!("release on {}: {}", handle, err);
            Win32Error::InvalidHandle
        })?;
        if !record.kind().is_semaphore() {
            warn!(
                "release on {}: {} is not a semaphore",
                handle,
                record.kind().type_name()
            );
            return Err(Win32Error::InvalidHandle.into());
        }

        debug!("releasing {} handle {}", record.kind().type_name(), handle);
        let mut guard = record.lock();
        let released = guard.with_signal(|ops, state| signal::release(ops, release_count as u32, state));
        drop(guard);

        released.map_err(|overflow| ReleaseError::Overflow {
            previous: overflow.previous,
        })
    }

    /// Open an existing named semaphore.
    pub fn open_semaphore(&self, name: &str) -> Result<Handle, Win32Error> {
        self.open_with_name(&self.object_name(name))
    }

    pub(crate) fn open_with_name(&self, name: &ObjectName) -> Result<Handle, Win32Error> {
        named::open_existing(&self.table, &self.namespace, name)
    }

    /// Drop one reference to `handle`.
    pub fn close_handle(&self, handle: Handle) -> Result<(), Win32Error> {
        self.table.close(handle).map_err(|err| {
            warn!("close {}: {}", handle, err);
            Win32Error::from(err)
        })
    }

    /// Read a semaphore's state without changing it.
    pub fn query_semaphore(&self, handle: Handle) -> Result<SemaphoreInfo, Win32Error> {
        let record = self.table.resolve(handle)?;
        if !record.kind().is_semaphore() {
            return Err(Win32Error::InvalidHandle);
        }

        let guard = record.lock();
        let sem = signal::counter(guard.ops());
        let name = guard
            .payload::<NamedSemaphore>()
            .map(|named| String::from(named.name().as_str()));
        Ok(SemaphoreInfo {
            count: sem.count(),
            max: sem.max(),
            signaled: guard.is_signaled(),
            name,
        })
    }

    /// One-line description of any handle in the table.
    pub fn describe(&self, handle: Handle) -> Result<String, Win32Error> {
        Ok(self.table.details(handle)?)
    }
}
