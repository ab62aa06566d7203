//! Error types for the DreamSpectre core
//!
//! The numeric core never fails on malformed input: absent fields become
//! defaults and non-finite values become zero. The only fallible surface is
//! parsing an externally supplied fingerprint string, e.g. when an audit
//! consumer reads a record back from a log.

use core::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Fingerprint Parse Errors
// ============================================================================

/// Errors from parsing a [`SpectralFingerprint`](crate::spectral::SpectralFingerprint)
/// out of its hexadecimal text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintParseError {
    /// Input is not exactly 16 characters long
    InvalidLength {
        /// Length of the input in bytes
        got: usize,
        /// Required length in bytes
        expected: usize,
    },
    /// Input contains a byte outside `[0-9a-f]`
    InvalidCharacter {
        /// Byte offset of the offending character
        position: usize,
        /// The offending byte
        byte: u8,
    },
}

impl fmt::Display for FingerprintParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { got, expected } => {
                write!(f, "Invalid fingerprint length: got {got} bytes, expected {expected}")
            }
            Self::InvalidCharacter { position, byte } => {
                write!(
                    f,
                    "Invalid fingerprint character 0x{byte:02X} at position {position} (expected lowercase hex)"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FingerprintParseError {}

// ============================================================================
// Tests
// ============================================================================
