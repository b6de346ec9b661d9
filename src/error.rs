//! Error types for the DWG codec

use std::io;
use thiserror::Error;

/// Severity of a failure, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Known but unhandled content; decoding continues.
    Notice,
    /// A single object diverged from its declared size.
    Recoverable,
    /// A handle reference could not be resolved.
    Dangling,
    /// A page or section failed integrity verification.
    Integrity,
    /// Decoding cannot continue.
    Critical,
}

/// Main error type for DWG decode and encode operations
#[derive(Debug, Error)]
pub enum DwgError {
    /// IO error occurred during stream operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unrecognized or unsupported version tag
    #[error("Unsupported DWG version: {0:?}")]
    UnsupportedVersion(String),

    /// A cursor tried to move past the end of its buffer
    #[error("Out of bounds: bit position {position} exceeds buffer of {size} bytes")]
    OutOfBounds { position: u64, size: u64 },

    /// A decoded value does not fit its declared width
    #[error("Overflow: {0}")]
    Overflow(String),

    /// Error parsing the binary format
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed compressed stream
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Reed-Solomon block with more errors than the code can correct
    #[error("Reed-Solomon block uncorrectable at offset {offset:#X}")]
    Uncorrectable { offset: u64 },

    /// CRC or page checksum mismatch
    #[error("Checksum mismatch: expected {expected:#X}, got {actual:#X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Section start or end sentinel mismatch
    #[error("Invalid sentinel: {0}")]
    InvalidSentinel(String),

    /// Invalid file header
    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    /// A mandatory logical section could not be located
    #[error("Missing section: {0}")]
    MissingSection(String),

    /// A logical section failed integrity verification
    #[error("Section {section} is corrupt: {source}")]
    CorruptSection {
        section: String,
        #[source]
        source: Box<DwgError>,
    },

    /// An object failed to decode
    #[error("Object #{index} (handle {handle:#X}) at offset {offset:#X}: {source}")]
    Object {
        index: usize,
        handle: u64,
        offset: u64,
        #[source]
        source: Box<DwgError>,
    },

    /// The document cannot be written as requested
    #[error("Encode error: {0}")]
    Encode(String),
}

/// Error returned by [`crate::decode`].
pub type DecodeError = DwgError;

/// Error returned by [`crate::encode`].
pub type EncodeError = DwgError;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, DwgError>;

impl DwgError {
    /// Wrap this error as the cause of a corrupt section.
    pub fn in_section(self, section: &str) -> Self {
        match self {
            DwgError::CorruptSection { .. } => self,
            other => DwgError::CorruptSection {
                section: section.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Classify this error.
    pub fn severity(&self) -> Severity {
        match self {
            DwgError::Object { .. } => Severity::Recoverable,
            DwgError::Uncorrectable { .. }
            | DwgError::ChecksumMismatch { .. }
            | DwgError::CorruptSection { .. } => Severity::Integrity,
            _ => Severity::Critical,
        }
    }
}
