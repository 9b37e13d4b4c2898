//! Shared namespace for named waitable objects.
//!
//! One registry serves every named kind, so a name can only be bound to a
//! single object at a time whatever its kind. Entries hold a weak relation
//! to their record: the handle table owns the object, and the entry goes
//! away through [`Namespace::unregister`] once the object is reclaimed. A
//! search that runs before that finds the handle dead and drops the entry
//! itself.
//!
//! All create-or-open decisions happen while holding the guard returned by
//! [`Namespace::lock`], which makes them atomic with respect to each other.

use alloc::collections::BTreeMap;
use log::{debug, trace};
use spin::{Mutex, MutexGuard};
use w32sem_common::{Handle, HandleKind};

use crate::handle::HandleTable;

mod name;

pub use name::ObjectName;

#[derive(Debug, Clone, Copy)]
struct NamespaceEntry {
    kind: HandleKind,
    handle: Handle,
}

/// Outcome of a namespace search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No live object has this name.
    NotFound,
    /// The name belongs to a live object of another kind.
    KindMismatch(HandleKind),
    /// A live object of the requested kind. The caller now owns one extra
    /// reference to it.
    Found(Handle),
}

/// Process-wide registry of named objects.
pub struct Namespace {
    entries: Mutex<BTreeMap<ObjectName, NamespaceEntry>>,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Take the namespace lock.
    pub fn lock(&self) -> NamespaceGuard<'_> {
        NamespaceGuard {
            entries: self.entries.lock(),
        }
    }

    /// Number of entries, including ones whose object is already gone.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the namespace holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the entry for `name` if it still refers to `handle`.
    ///
    /// An entry rebound to a newer object is left alone.
    pub fn unregister(&self, name: &str, handle: Handle) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(name) {
            Some(entry) if entry.handle == handle => {
                entries.remove(name);
                trace!("unregistered \"{}\" ({})", name, handle);
                true
            }
            _ => false,
        }
    }

    /// Drop entries whose object has been reclaimed. Returns how many went.
    pub fn prune(&self, table: &HandleTable) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| table.is_live(entry.handle));
        let pruned = before - entries.len();
        if pruned > 0 {
            debug!("pruned {} stale namespace entries", pruned);
        }
        pruned
    }
}

/// Exclusive access to the namespace. Unlocks on drop.
pub struct NamespaceGuard<'a> {
    entries: MutexGuard<'a, BTreeMap<ObjectName, NamespaceEntry>>,
}

impl NamespaceGuard<'_> {
    /// Look `name` up for an object of `kind`.
    ///
    /// Only the table's slot bookkeeping is touched, never a record lock.
    pub fn search(&mut self, kind: HandleKind, name: &ObjectName, table: &HandleTable) -> Lookup {
        let Some(entry) = self.entries.get(name).copied() else {
            return Lookup::NotFound;
        };

        let live = if entry.kind == kind {
            table.add_ref(entry.handle).is_ok()
        } else {
            table.is_live(entry.handle)
        };
        if !live {
            trace!("dropping stale namespace entry \"{}\"", name);
            self.entries.remove(name);
            return Lookup::NotFound;
        }

        if entry.kind == kind {
            Lookup::Found(entry.handle)
        } else {
            Lookup::KindMismatch(entry.kind)
        }
    }

    /// Bind `name` to a freshly created object.
    pub fn register(&mut self, kind: HandleKind, name: ObjectName, handle: Handle) {
        trace!("registering {} \"{}\" as {}", kind.type_name(), name, handle);
        self.entries.insert(name, NamespaceEntry { kind, handle });
    }
}
