//! Create-or-open for named semaphores.
//!
//! Both entry points run their search, and for creation the insert, under
//! the namespace lock, so concurrent callers using one name see exactly one
//! creator. The only record lock taken while the namespace is locked is the
//! one of a record created in the same critical section.

use alloc::boxed::Box;
use log::{debug, warn};
use w32sem_common::{Handle, HandleKind, Win32Error};

use super::semaphore::{NamedSemaphore, Semaphore};
use super::signal;
use super::Creation;
use crate::handle::HandleTable;
use crate::namespace::{Lookup, Namespace, ObjectName};

/// Open the named semaphore `name`, creating it if nobody has yet.
///
/// `sem` is only installed when the semaphore is created; an existing
/// object keeps its own counts.
pub(crate) fn create_or_open(
    table: &HandleTable,
    namespace: &Namespace,
    sem: Semaphore,
    name: ObjectName,
) -> Result<Creation, Win32Error> {
    let mut guard = namespace.lock();
    debug!(
        "creating named semaphore \"{}\" initial {} max {}",
        name,
        sem.count(),
        sem.max()
    );

    match guard.search(HandleKind::NamedSemaphore, &name, table) {
        Lookup::KindMismatch(kind) => {
            debug!(
                "name \"{}\" is already used by a {} object",
                name,
                kind.type_name()
            );
            Err(Win32Error::InvalidHandle)
        }
        // The search already granted the caller its reference.
        Lookup::Found(handle) => {
            debug!("named semaphore \"{}\" already exists as {}", name, handle);
            Ok(Creation::Opened(handle))
        }
        Lookup::NotFound => {
            let sem = NamedSemaphore::new(sem, name.clone());
            let handle = signal::install(table, Box::new(sem)).map_err(|err| {
                warn!("error creating named semaphore \"{}\": {}", name, err);
                Win32Error::from(err)
            })?;
            guard.register(HandleKind::NamedSemaphore, name, handle);
            Ok(Creation::Created(handle))
        }
    }
}

/// Open an existing named semaphore. Never creates one.
pub(crate) fn open_existing(
    table: &HandleTable,
    namespace: &Namespace,
    name: &ObjectName,
) -> Result<Handle, Win32Error> {
    let mut guard = namespace.lock();
    debug!("opening named semaphore \"{}\"", name);

    match guard.search(HandleKind::NamedSemaphore, name, table) {
        Lookup::KindMismatch(kind) => {
            debug!(
                "name \"{}\" is already used by a {} object",
                name,
                kind.type_name()
            );
            Err(Win32Error::InvalidHandle)
        }
        Lookup::NotFound => Err(Win32Error::FileNotFound),
        Lookup::Found(handle) => {
            debug!("returning named semaphore handle {}", handle);
            Ok(handle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MarkerOps;

    fn sem(initial: i32, max: i32) -> Semaphore {
        Semaphore::new(initial, max).unwrap()
    }

    fn setup() -> (HandleTable, Namespace) {
        let table = HandleTable::new(8, 4);
        signal::register_capabilities(&table);
        (table, Namespace::new())
    }

    #[test]
    fn test_create_then_open() {
        let (table, namespace) = setup();

        let created = create_or_open(&table, &namespace, sem(1, 3), ObjectName::new("jobs")).unwrap();
        assert!(matches!(created, Creation::Created(_)));

        let opened = create_or_open(&table, &namespace, sem(0, 9), ObjectName::new("jobs")).unwrap();
        assert_eq!(opened, Creation::Opened(created.handle()));

        // The second creator's counts are ignored.
        let record = table.resolve(created.handle()).unwrap();
        let guard = record.lock();
        let sem = guard.payload::<NamedSemaphore>().unwrap().semaphore();
        assert_eq!((sem.count(), sem.max()), (1, 3));
    }

    #[test]
    fn test_create_over_other_kind() {
        let (table, namespace) = setup();
        let event = table
            .allocate(Box::new(MarkerOps::new(HandleKind::NamedEvent)))
            .unwrap();
        namespace
            .lock()
            .register(HandleKind::NamedEvent, ObjectName::new("ready"), event);

        assert_eq!(
            create_or_open(&table, &namespace, sem(0, 1), ObjectName::new("ready")),
            Err(Win32Error::InvalidHandle)
        );
        assert_eq!(
            open_existing(&table, &namespace, &ObjectName::new("ready")),
            Err(Win32Error::InvalidHandle)
        );
        assert_eq!(table.live_handles(), 1);
    }

    #[test]
    fn test_open_missing() {
        let (table, namespace) = setup();
        assert_eq!(
            open_existing(&table, &namespace, &ObjectName::new("missing")),
            Err(Win32Error::FileNotFound)
        );
    }

    #[test]
    fn test_allocation_failure_registers_nothing() {
        let table = HandleTable::new(0, 4);
        let namespace = Namespace::new();

        assert_eq!(
            create_or_open(&table, &namespace, sem(0, 1), ObjectName::new("full")),
            Err(Win32Error::GenFailure)
        );
        assert!(namespace.is_empty());
    }

    #[test]
    fn test_name_released_with_last_reference() {
        let (table, namespace) = setup();
        let name = ObjectName::new("short-lived");

        let handle = create_or_open(&table, &namespace, sem(0, 1), name.clone())
            .unwrap()
            .handle();
        table.close(handle).unwrap();

        assert_eq!(
            open_existing(&table, &namespace, &name),
            Err(Win32Error::FileNotFound)
        );
        let again = create_or_open(&table, &namespace, sem(0, 1), name).unwrap();
        assert!(matches!(again, Creation::Created(_)));
    }
}
