//! Compatibility error codes reported to managed callers.

use thiserror::Error;

/// Win32 error codes surfaced by the synchronization objects.
///
/// The discriminants are the values from `winerror.h`; managed code compares
/// against those numbers, so they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Win32Error {
    /// The operation completed successfully.
    #[error("the operation completed successfully")]
    Success = 0,
    /// No object exists under the requested name.
    #[error("the system cannot find the file specified")]
    FileNotFound = 2,
    /// The handle is unknown, stale, or refers to the wrong kind of object.
    #[error("the handle is invalid")]
    InvalidHandle = 6,
    /// Resource allocation failed.
    #[error("a device attached to the system is not functioning")]
    GenFailure = 31,
    /// A caller-supplied argument was out of range.
    #[error("the parameter is incorrect")]
    InvalidParameter = 87,
    /// A named object was opened rather than created.
    #[error("cannot create a file when that file already exists")]
    AlreadyExists = 183,
}

impl Win32Error {
    /// The numeric code as seen by managed code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Map a numeric code back to a known error.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Win32Error::Success,
            2 => Win32Error::FileNotFound,
            6 => Win32Error::InvalidHandle,
            31 => Win32Error::GenFailure,
            87 => Win32Error::InvalidParameter,
            183 => Win32Error::AlreadyExists,
            _ => return None,
        })
    }

    /// `true` for [`Win32Error::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Win32Error::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_winerror() {
        assert_eq!(Win32Error::Success.code(), 0);
        assert_eq!(Win32Error::FileNotFound.code(), 2);
        assert_eq!(Win32Error::InvalidHandle.code(), 6);
        assert_eq!(Win32Error::GenFailure.code(), 31);
        assert_eq!(Win32Error::InvalidParameter.code(), 87);
        assert_eq!(Win32Error::AlreadyExists.code(), 183);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Win32Error::from_code(183), Some(Win32Error::AlreadyExists));
        assert_eq!(Win32Error::from_code(5), None);
    }
}
