use bitflags::bitflags;

/// The kind tag carried by every record in the handle table.
///
/// Only the semaphore kinds have behavior in this workspace. The other tags
/// exist so that a name bound to a different kind of object can be told
/// apart from a name bound to a semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandleKind {
    /// Anonymous counting semaphore.
    Semaphore,
    /// Counting semaphore registered in the shared namespace.
    NamedSemaphore,
    /// Anonymous mutex.
    Mutex,
    /// Mutex registered in the shared namespace.
    NamedMutex,
    /// Anonymous event.
    Event,
    /// Event registered in the shared namespace.
    NamedEvent,
}

impl HandleKind {
    /// Short type name used in diagnostics.
    pub const fn type_name(self) -> &'static str {
        match self {
            HandleKind::Semaphore => "Semaphore",
            HandleKind::NamedSemaphore => "N.Semaphore",
            HandleKind::Mutex => "Mutex",
            HandleKind::NamedMutex => "N.Mutex",
            HandleKind::Event => "Event",
            HandleKind::NamedEvent => "N.Event",
        }
    }

    /// Whether objects of this kind live in the shared namespace.
    pub const fn is_named(self) -> bool {
        matches!(
            self,
            HandleKind::NamedSemaphore | HandleKind::NamedMutex | HandleKind::NamedEvent
        )
    }

    /// Whether this is one of the two semaphore kinds.
    pub const fn is_semaphore(self) -> bool {
        matches!(self, HandleKind::Semaphore | HandleKind::NamedSemaphore)
    }
}

bitflags! {
    /// Operations a handle kind supports through the handle table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct HandleCapability: u32 {
        /// Can be waited on and claimed by a waiter.
        const WAIT         = 1 << 0;
        /// Can be signaled directly (signal-and-wait).
        const SIGNAL       = 1 << 1;
        /// Ownership is tracked per thread (mutexes).
        const OWN          = 1 << 2;
        /// Needs a kind-specific wait path.
        const SPECIAL_WAIT = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(HandleKind::Semaphore.type_name(), "Semaphore");
        assert_eq!(HandleKind::NamedSemaphore.type_name(), "N.Semaphore");
    }

    #[test]
    fn test_kind_predicates() {
        assert!(HandleKind::NamedSemaphore.is_named());
        assert!(HandleKind::NamedSemaphore.is_semaphore());
        assert!(!HandleKind::Semaphore.is_named());
        assert!(!HandleKind::NamedMutex.is_semaphore());
    }
}
