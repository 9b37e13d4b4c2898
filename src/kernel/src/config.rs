//! Runtime configuration.

/// Longest name, in bytes, kept for a named object. Longer names are cut.
pub const MAX_PATH: usize = 260;

/// Default handle table capacity.
pub const DEFAULT_MAX_HANDLES: usize = 1 << 16;

/// Default capacity of each record's waiter queue.
pub const DEFAULT_WAITERS_PER_HANDLE: usize = 100;

/// Limits applied by a [`SyncRuntime`](crate::sync::SyncRuntime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncConfig {
    /// Number of live records the handle table can hold.
    pub max_handles: usize,
    /// Bytes of a name kept in the namespace.
    pub max_name_len: usize,
    /// Wakers each record can queue before extra waiters are woken early.
    pub waiters_per_handle: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_handles: DEFAULT_MAX_HANDLES,
            max_name_len: MAX_PATH,
            waiters_per_handle: DEFAULT_WAITERS_PER_HANDLE,
        }
    }
}

impl SyncConfig {
    /// Override the handle table capacity.
    pub fn with_max_handles(mut self, max_handles: usize) -> Self {
        self.max_handles = max_handles;
        self
    }

    /// Override the name truncation bound.
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }
}
