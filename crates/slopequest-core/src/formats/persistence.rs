//! # Profile Record Format
//!
//! Binary serialization for the local profile record.
//!
//! Format: Header (5 bytes) + postcard-serialized `ProgressState`.
//! - 4 bytes: Magic ("SLPQ")
//! - 1 byte: Version
//!
//! The whole profile is written as one value so a save is atomic: either the
//! old record or the new one is visible, never a mix of scalar keys.
//!
//! Size and header are validated before the payload is parsed.

use crate::{ProgressState, QuizError, primitives};

/// Maximum accepted record size. A profile is a few hundred bytes.
pub const MAX_RECORD_SIZE: usize = 64 * 1024;

const HEADER_LEN: usize = 5;

// =============================================================================
// RECORD HEADER
// =============================================================================

/// The header that precedes every profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic and version.
    pub fn validate(&self) -> Result<(), QuizError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(QuizError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(QuizError::SerializationError(format!(
                "Unsupported record version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QuizError> {
        let Some(head) = bytes.get(..HEADER_LEN) else {
            return Err(QuizError::SerializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[0..4]);
        Ok(Self {
            magic,
            version: head[4],
        })
    }
}

impl Default for RecordHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Serialize a profile to record bytes (header + payload).
pub fn profile_to_bytes(state: &ProgressState) -> Result<Vec<u8>, QuizError> {
    let payload =
        postcard::to_stdvec(state).map_err(|e| QuizError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&RecordHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a profile from record bytes.
///
/// The result is not normalized; callers apply `ProgressState::normalize`
/// with their configured level length.
pub fn profile_from_bytes(bytes: &[u8]) -> Result<ProgressState, QuizError> {
    if bytes.len() < HEADER_LEN {
        return Err(QuizError::SerializationError(format!(
            "Record too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(QuizError::SerializationError(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }

    RecordHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        QuizError::SerializationError(format!("Failed to decode profile record: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
