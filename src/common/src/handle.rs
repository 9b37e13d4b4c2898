use core::fmt;

/// Opaque reference to a record in the handle table.
///
/// A handle names a slot and the generation the slot had when the record was
/// allocated. Once the record is reclaimed the slot's generation moves on, so
/// an old handle can never resolve to whatever is allocated there next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Build a handle from its slot index and generation.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the table.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at allocation time.
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Raw value handed to managed code. Never zero for a real handle,
    /// because generations start at 1.
    pub const fn as_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Decode a raw value. Zero (the null handle) decodes to `None`.
    pub const fn from_raw(raw: u64) -> Option<Self> {
        let generation = (raw >> 32) as u32;
        if generation == 0 {
            return None;
        }
        Some(Self {
            index: raw as u32,
            generation,
        })
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.as_raw())
    }
}
