use thiserror::Error;

/// Per-frame decode failures. Every variant carries the absolute byte offset
/// (from the start of the Ethernet frame) where decoding stopped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame truncated at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedFrame {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("field truncated at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedField {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("length field truncated at offset {offset}")]
    TruncatedLength { offset: usize },
    #[error("unsupported length form 0x{octet:02x} at offset {offset}")]
    UnsupportedLengthForm { offset: usize, octet: u8 },
    #[error("integer field at offset {offset} is {width} bytes wide, at most 4 supported")]
    FieldTooWide { offset: usize, width: usize },
    #[error("bit string at offset {offset} has {bits} bits, 13 required for quality")]
    ShortBitString { offset: usize, bits: usize },
    #[error("bit string at offset {offset} has invalid padding {padding}")]
    InvalidPadding { offset: usize, padding: u8 },
    #[error("tag 0x{tag:02x} at offset {offset}: expected {expected} value bytes, got {actual}")]
    LengthMismatch {
        offset: usize,
        tag: u8,
        expected: usize,
        actual: usize,
    },
    #[error("gocbRef at offset {offset} has length {length}, shorter than its inner header")]
    MalformedGocbRef { offset: usize, length: usize },
    #[error("string field at offset {offset} is not valid UTF-8: {source}")]
    Utf8 {
        offset: usize,
        #[source]
        source: std::str::Utf8Error,
    },
}

impl DecodeError {
    /// Stable short name of the error kind, for counters and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::TruncatedFrame { .. } => "TruncatedFrame",
            DecodeError::TruncatedField { .. } => "TruncatedField",
            DecodeError::TruncatedLength { .. } => "TruncatedLength",
            DecodeError::UnsupportedLengthForm { .. } => "UnsupportedLengthForm",
            DecodeError::FieldTooWide { .. } => "FieldTooWide",
            DecodeError::ShortBitString { .. } => "ShortBitString",
            DecodeError::InvalidPadding { .. } => "InvalidPadding",
            DecodeError::LengthMismatch { .. } => "LengthMismatch",
            DecodeError::MalformedGocbRef { .. } => "MalformedGocbRef",
            DecodeError::Utf8 { .. } => "Utf8DecodeError",
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            DecodeError::TruncatedFrame { offset, .. }
            | DecodeError::TruncatedField { offset, .. }
            | DecodeError::TruncatedLength { offset }
            | DecodeError::UnsupportedLengthForm { offset, .. }
            | DecodeError::FieldTooWide { offset, .. }
            | DecodeError::ShortBitString { offset, .. }
            | DecodeError::InvalidPadding { offset, .. }
            | DecodeError::LengthMismatch { offset, .. }
            | DecodeError::MalformedGocbRef { offset, .. }
            | DecodeError::Utf8 { offset, .. } => *offset,
        }
    }

    /// Re-express a field-level truncation as a frame truncation. The frame
    /// walker uses this so callers only ever see `TruncatedFrame` for reads
    /// that ran past the captured bytes.
    pub(crate) fn into_frame_error(self) -> Self {
        match self {
            DecodeError::TruncatedField {
                offset,
                needed,
                available,
            } => DecodeError::TruncatedFrame {
                offset,
                needed,
                available,
            },
            other => other,
        }
    }
}
