//! Reference handle table.
//!
//! Owns every waitable record, counts references to it, and provides the
//! per-record lock and signal-state propagation that kind callbacks rely on.
//! Waiting itself belongs to an external scheduler, which drives the table
//! through [`HandleTable::register_waiter`] and [`HandleTable::try_own`].

mod table;

pub use table::{HandleError, HandleRecord, HandleTable, ReclaimHook, RecordGuard, RecordRef};
