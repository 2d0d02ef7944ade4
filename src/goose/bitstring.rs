//! Padded BIT STRING values and the IEC 61850 data quality they carry.
//!
//! The first value octet counts the unused low-order bits of the last octet.
//! Bits are numbered from the most significant bit of the first payload octet.
//! Quality uses bits 0-12: two validity bits followed by eleven detail flags.

use crate::goose::error::DecodeError;
use serde::Serialize;

pub const QUALITY_BITS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Validity {
    Good,
    Invalid,
    Questionable,
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality {
    pub validity: Validity,
    pub overflow: bool,
    pub out_of_range: bool,
    pub bad_reference: bool,
    pub oscillatory: bool,
    pub failure: bool,
    pub old_data: bool,
    pub inconsistent: bool,
    pub inaccurate: bool,
    pub source: bool,
    pub test: bool,
    pub operator_blocked: bool,
}

impl Quality {
    /// Interpret the first 13 bits. `offset` is only used for error reporting.
    pub fn from_bits(bits: &[bool], offset: usize) -> Result<Self, DecodeError> {
        if bits.len() < QUALITY_BITS {
            return Err(DecodeError::ShortBitString {
                offset,
                bits: bits.len(),
            });
        }
        let validity = match (bits[0], bits[1]) {
            (false, false) => Validity::Good,
            (false, true) => Validity::Invalid,
            (true, true) => Validity::Questionable,
            (true, false) => Validity::Reserved,
        };
        Ok(Quality {
            validity,
            overflow: bits[2],
            out_of_range: bits[3],
            bad_reference: bits[4],
            oscillatory: bits[5],
            failure: bits[6],
            old_data: bits[7],
            inconsistent: bits[8],
            inaccurate: bits[9],
            source: bits[10],
            test: bits[11],
            operator_blocked: bits[12],
        })
    }

    /// Flags in wire order, paired with their names.
    pub fn flags(&self) -> [(&'static str, bool); 11] {
        [
            ("Overflow", self.overflow),
            ("OutOfRange", self.out_of_range),
            ("BadReference", self.bad_reference),
            ("Oscillatory", self.oscillatory),
            ("Failure", self.failure),
            ("OldData", self.old_data),
            ("Inconsistent", self.inconsistent),
            ("Inaccurate", self.inaccurate),
            ("Source", self.source),
            ("Test", self.test),
            ("OperatorBlocked", self.operator_blocked),
        ]
    }
}

/// Unpack a padded bit string. `offset` is the absolute position of the
/// padding octet.
pub fn decode_bits(value: &[u8], offset: usize) -> Result<Vec<bool>, DecodeError> {
    let (&padding, payload) = value.split_first().ok_or(DecodeError::TruncatedFrame {
        offset,
        needed: 1,
        available: 0,
    })?;
    if padding > 7 || (payload.is_empty() && padding != 0) {
        return Err(DecodeError::InvalidPadding { offset, padding });
    }

    let total = payload.len() * 8 - usize::from(padding);
    let bits = payload
        .iter()
        .flat_map(|&byte| (0..8u8).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .take(total)
        .collect();
    Ok(bits)
}

/// Unpack the bits and, when at least 13 are present, the quality.
pub fn decode_bit_string(
    value: &[u8],
    offset: usize,
) -> Result<(Vec<bool>, Option<Quality>), DecodeError> {
    let bits = decode_bits(value, offset)?;
    let quality = match Quality::from_bits(&bits, offset) {
        Ok(q) => Some(q),
        Err(e) => {
            log::trace!("quality unavailable: {}", e);
            None
        }
    };
    Ok((bits, quality))
}

pub fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
}
