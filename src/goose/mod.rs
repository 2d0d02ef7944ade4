//! GOOSE (IEC 61850-8-1) frame decoding and sequence tracking.

pub mod alldata;
pub mod bitstring;
pub mod error;
pub mod length;
pub mod packet_processor;
pub mod pdu;
pub mod reader;
pub mod sequence;
pub mod timestamp;
pub mod types;

pub use error::DecodeError;
pub use pdu::decode;
pub use sequence::{SequenceCheck, SequenceGap, SequenceTracker};
pub use types::{DataValue, FilterConfig, FrameOutcome, GooseFrame, IgnoreReason};
