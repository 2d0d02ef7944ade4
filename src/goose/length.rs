//! BER length octets.
//!
//! Short form: one octet, high bit clear, value in the low 7 bits.
//! Long form: `0x80 | n` followed by `n` big-endian value octets.
//! The indefinite form (`0x80` alone) never appears in GOOSE and is rejected.

use crate::goose::error::DecodeError;

const LONG_FORM: u8 = 0x80;

/// Decode the length field at `pos`. Returns `(value, bytes_consumed)`.
pub fn decode_length(buf: &[u8], pos: usize) -> Result<(usize, usize), DecodeError> {
    let octet = *buf
        .get(pos)
        .ok_or(DecodeError::TruncatedLength { offset: pos })?;

    if octet & LONG_FORM == 0 {
        return Ok((usize::from(octet), 1));
    }

    let count = usize::from(octet & 0x7F);
    if count == 0 {
        return Err(DecodeError::UnsupportedLengthForm { offset: pos, octet });
    }

    let value_octets = buf
        .get(pos + 1..pos + 1 + count)
        .ok_or(DecodeError::TruncatedLength { offset: pos })?;

    let mut value: usize = 0;
    for b in value_octets {
        if value > usize::MAX >> 8 {
            return Err(DecodeError::UnsupportedLengthForm { offset: pos, octet });
        }
        value = (value << 8) | usize::from(*b);
    }

    Ok((value, 1 + count))
}
