// allData (0xAB) payload: one TLV per data-set member, in data-set order
use crate::goose::bitstring::decode_bit_string;
use crate::goose::error::DecodeError;
use crate::goose::length::decode_length;
use crate::goose::reader::{read_slice, read_uint, MAX_UINT_WIDTH};
use crate::goose::timestamp::{render_utc, QualityTimestamp, QUALITY_TIMESTAMP_LEN};
use crate::goose::types::DataValue;

pub const TAG_BOOLEAN: u8 = 0x83;
pub const TAG_BIT_STRING: u8 = 0x84;
pub const TAG_INTEGER: u8 = 0x85;

/// Decode every entry of an allData payload. `base` is the absolute frame
/// offset of `data[0]`, so errors point into the original frame.
pub fn decode_all_data(data: &[u8], base: usize) -> Result<Vec<DataValue>, DecodeError> {
    let mut values = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tag = data[pos];
        let (length, consumed) =
            decode_length(data, pos + 1).map_err(|e| rebase(e, base))?;
        let value_pos = pos + 1 + consumed;
        let value = read_slice(data, value_pos, length)
            .map_err(|e| rebase(e, base).into_frame_error())?;

        values.push(decode_entry(tag, value, base + value_pos)?);
        pos = value_pos + length;
    }

    Ok(values)
}

/// Decode one entry. `value` is exactly the entry's value region.
fn decode_entry(tag: u8, value: &[u8], offset: usize) -> Result<DataValue, DecodeError> {
    match tag {
        TAG_BOOLEAN => {
            expect_len(tag, value, 1, offset)?;
            Ok(DataValue::Boolean(value[0] != 0))
        }
        TAG_BIT_STRING => {
            let (bits, quality) = decode_bit_string(value, offset)?;
            Ok(DataValue::BitString { bits, quality })
        }
        TAG_INTEGER => decode_integer(value, offset),
        other => {
            log::trace!("allData entry with unhandled tag 0x{:02x} at {}", other, offset);
            Ok(DataValue::Unknown { tag: other })
        }
    }
}

/// The integer tag is overloaded on this profile: one byte is a small
/// integer, up to four bytes are epoch seconds and eight bytes are a full
/// quality timestamp.
fn decode_integer(value: &[u8], offset: usize) -> Result<DataValue, DecodeError> {
    match value.len() {
        1 => Ok(DataValue::Integer {
            value: u32::from(value[0]),
            utc: None,
        }),
        2..=MAX_UINT_WIDTH => {
            let seconds = read_uint(value, 0, value.len()).map_err(|e| rebase(e, offset))?;
            Ok(DataValue::Integer {
                value: seconds,
                utc: Some(render_utc(seconds)),
            })
        }
        QUALITY_TIMESTAMP_LEN => Ok(DataValue::Timestamp(QualityTimestamp::decode(
            value, offset,
        )?)),
        0 => Err(DecodeError::LengthMismatch {
            offset,
            tag: TAG_INTEGER,
            expected: 1,
            actual: 0,
        }),
        width => Err(DecodeError::FieldTooWide { offset, width }),
    }
}

fn expect_len(tag: u8, value: &[u8], expected: usize, offset: usize) -> Result<(), DecodeError> {
    if value.len() != expected {
        return Err(DecodeError::LengthMismatch {
            offset,
            tag,
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Shift a slice-relative error offset to a frame offset.
fn rebase(err: DecodeError, base: usize) -> DecodeError {
    match err {
        DecodeError::TruncatedField {
            offset,
            needed,
            available,
        } => DecodeError::TruncatedField {
            offset: offset + base,
            needed,
            available,
        },
        DecodeError::TruncatedLength { offset } => DecodeError::TruncatedLength {
            offset: offset + base,
        },
        DecodeError::UnsupportedLengthForm { offset, octet } => {
            DecodeError::UnsupportedLengthForm {
                offset: offset + base,
                octet,
            }
        }
        DecodeError::FieldTooWide { offset, width } => DecodeError::FieldTooWide {
            offset: offset + base,
            width,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goose::bitstring::Validity;

    #[test]
    fn integer_of_length_one() {
        let values = decode_all_data(&[0x85, 0x01, 0x07], 0).unwrap();
        assert_eq!(
            values,
            vec![DataValue::Integer {
                value: 7,
                utc: None
            }]
        );
    }

    #[test]
    fn integer_of_length_four_is_epoch_seconds() {
        let values = decode_all_data(&[0x85, 0x04, 0x5F, 0x5E, 0x10, 0x00], 0).unwrap();
        assert_eq!(
            values,
            vec![DataValue::Integer {
                value: 0x5F5E_1000,
                utc: Some("Sep 13, 2020 12:26:40 UTC".to_string())
            }]
        );
    }

    #[test]
    fn integer_of_length_eight_is_quality_timestamp() {
        let data = [0x85, 0x08, 0x5F, 0x5E, 0x10, 0x00, 0x40, 0x00, 0x00, 0x0A];
        let values = decode_all_data(&data, 0).unwrap();
        let ts = values[0].as_timestamp().unwrap();
        assert_eq!(ts.seconds, 0x5F5E_1000);
        assert_eq!(ts.fractional_seconds, 0.25);
    }

    #[test]
    fn mixed_entries_keep_order() {
        let data = [
            0x83, 0x01, 0x01, // boolean true
            0x84, 0x03, 0x03, 0x40, 0x00, // bit string, invalid
            0x91, 0x02, 0xAA, 0xBB, // unhandled tag
            0x83, 0x01, 0x00, // boolean false
        ];
        let values = decode_all_data(&data, 0).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], DataValue::Boolean(true));
        assert_eq!(values[1].as_quality().unwrap().validity, Validity::Invalid);
        assert_eq!(values[2], DataValue::Unknown { tag: 0x91 });
        assert_eq!(values[3], DataValue::Boolean(false));
    }

    #[test]
    fn short_bit_string_keeps_bits() {
        let values = decode_all_data(&[0x84, 0x02, 0x03, 0x00], 0).unwrap();
        match &values[0] {
            DataValue::BitString { bits, quality } => {
                assert_eq!(bits.len(), 5);
                assert!(quality.is_none());
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn empty_payload() {
        assert!(decode_all_data(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn boolean_with_wrong_length() {
        let err = decode_all_data(&[0x83, 0x02, 0x01, 0x00], 100).unwrap_err();
        assert_eq!(
            err,
            DecodeError::LengthMismatch {
                offset: 102,
                tag: 0x83,
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn entry_running_past_payload() {
        let err = decode_all_data(&[0x83, 0x01, 0x01, 0x85, 0x04, 0x00], 50).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedFrame {
                offset: 55,
                needed: 4,
                available: 1
            }
        );
    }

    #[test]
    fn integer_too_wide() {
        let err = decode_all_data(&[0x85, 0x05, 0, 0, 0, 0, 1], 10).unwrap_err();
        assert_eq!(err, DecodeError::FieldTooWide { offset: 12, width: 5 });
    }

    #[test]
    fn truncated_length_is_rebased() {
        let err = decode_all_data(&[0x83, 0x82, 0x00], 20).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedLength { offset: 21 });
    }

    #[test]
    fn indefinite_length_entry() {
        let err = decode_all_data(&[0x83, 0x01, 0x01, 0x84, 0x80, 0x00], 30).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedLengthForm {
                offset: 34,
                octet: 0x80
            }
        );
    }

    #[test]
    fn oversized_long_form_entry() {
        let mut data = vec![0x85, 0x88];
        data.extend_from_slice(&[0xFF; 8]);
        let err = decode_all_data(&data, 40).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedFrame {
                offset: 50,
                needed: usize::MAX,
                available: 0
            }
        );
    }
}
