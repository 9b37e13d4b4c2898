use alloc::string::String;
use core::borrow::Borrow;
use core::char::{decode_utf16, REPLACEMENT_CHARACTER};
use core::fmt;
use log::debug;

use crate::config::MAX_PATH;

/// Canonical, bounded form of an object name.
///
/// Names are UTF-8, end at the first NUL, and keep at most `max_len` bytes;
/// a longer name is cut on the last character boundary that fits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectName(String);

impl ObjectName {
    /// Canonicalize `name` with the default [`MAX_PATH`] bound.
    pub fn new(name: &str) -> Self {
        Self::bounded(name, MAX_PATH)
    }

    /// Canonicalize `name`, keeping at most `max_len` bytes.
    pub fn bounded(name: &str, max_len: usize) -> Self {
        let name = name.split('\0').next().unwrap_or("");
        let mut end = name.len().min(max_len);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        if end < name.len() {
            debug!(
                "object name truncated from {} to {} bytes",
                name.len(),
                end
            );
        }
        Self(String::from(&name[..end]))
    }

    /// Decode a managed (UTF-16) name. Unpaired surrogates become U+FFFD.
    pub fn from_utf16(units: &[u16], max_len: usize) -> Self {
        let decoded: String = decode_utf16(units.iter().copied().take_while(|&unit| unit != 0))
            .map(|unit| unit.unwrap_or(REPLACEMENT_CHARACTER))
            .collect();
        Self::bounded(&decoded, max_len)
    }

    /// The canonical name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
