//! GOOSE frame decoding.
//!
//! A frame is decoded in one pass over a fully buffered capture: address
//! filter, Ethernet header, then the PDU TLV sequence. Two PDU layouts are
//! recognised:
//!
//! * session profile: an IEC 61850-8-1 header (APPID, Length, two reserved
//!   words) followed by the `0x61` goosePdu container; the walker descends
//!   into the container and `gocbRef` is a plain string;
//! * flat profile: TLVs start right after the EtherType. `gocbRef` then
//!   carries a nested header that is skipped by a fixed offset.
//!
//! Unknown tags are skipped in both layouts.

use crate::goose::alldata::decode_all_data;
use crate::goose::error::DecodeError;
use crate::goose::length::decode_length;
use crate::goose::reader::{read_ether_type, read_mac, read_slice, read_u8, read_uint};
use crate::goose::timestamp::{QualityTimestamp, QUALITY_TIMESTAMP_LEN};
use crate::goose::types::{FilterConfig, FrameOutcome, GooseFrame};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ETHER_TYPE_OFFSET: usize = 12;
pub const GOOSE_ETHER_TYPE: [u8; 2] = [0x88, 0xB8];
pub const SESSION_HEADER_LEN: usize = 8;
pub const TAG_GOOSE_PDU: u8 = 0x61;

pub const TAG_GOCB_REF: u8 = 0x80;
pub const TAG_TIME_ALLOWED_TO_LIVE: u8 = 0x81;
pub const TAG_DAT_SET: u8 = 0x82;
pub const TAG_GO_ID: u8 = 0x83;
pub const TAG_T: u8 = 0x84;
pub const TAG_ST_NUM: u8 = 0x85;
pub const TAG_SQ_NUM: u8 = 0x86;
pub const TAG_SIMULATION: u8 = 0x87;
pub const TAG_CONF_REV: u8 = 0x88;
pub const TAG_NDS_COM: u8 = 0x89;
pub const TAG_NUM_DAT_SET_ENTRIES: u8 = 0x8A;
pub const TAG_ALL_DATA: u8 = 0xAB;

/// Bytes between the start of a flat-profile gocbRef value and the string.
const GOCB_REF_SKIP: usize = 11;
/// Amount subtracted from a flat-profile gocbRef length to get the string length.
const GOCB_REF_LEN_ADJUST: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    Flat,
    Session,
}

/// Decode one captured Ethernet frame.
///
/// Returns `Ignored` when the frame is not addressed to the subscription in
/// `filter`. Decoding is pure: the same bytes always give the same outcome.
pub fn decode(bytes: &[u8], filter: &FilterConfig) -> Result<FrameOutcome, DecodeError> {
    let destination = read_mac(bytes, 0).map_err(DecodeError::into_frame_error)?;
    let source = read_mac(bytes, 6).map_err(DecodeError::into_frame_error)?;
    if let Some(reason) = filter.check(&destination, &source) {
        return Ok(FrameOutcome::Ignored(reason));
    }

    let ether_type =
        read_ether_type(bytes, ETHER_TYPE_OFFSET).map_err(DecodeError::into_frame_error)?;

    let mut frame = GooseFrame {
        destination,
        source,
        ether_type,
        ..Default::default()
    };

    match session_header(bytes) {
        Some(appid) => {
            frame.appid = Some(appid);
            let pdu_pos = ETHERNET_HEADER_LEN + SESSION_HEADER_LEN;
            let (length, consumed) = decode_length(bytes, pdu_pos + 1)?;
            let start = pdu_pos + 1 + consumed;
            read_slice(bytes, start, length).map_err(DecodeError::into_frame_error)?;
            walk_pdu(bytes, start, start + length, Profile::Session, &mut frame)?;
        }
        None => walk_pdu(bytes, ETHERNET_HEADER_LEN, bytes.len(), Profile::Flat, &mut frame)?,
    }

    Ok(FrameOutcome::Decoded(frame))
}

/// APPID of a frame that carries a GOOSE session header, if it does.
///
/// The header is only trusted when the EtherType is GOOSE, its Length word
/// fits inside the capture and the goosePdu tag follows it.
fn session_header(bytes: &[u8]) -> Option<u16> {
    let header = bytes.get(ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + SESSION_HEADER_LEN + 1)?;
    if bytes[ETHER_TYPE_OFFSET..ETHERNET_HEADER_LEN] != GOOSE_ETHER_TYPE {
        return None;
    }
    let appid = u16::from_be_bytes([header[0], header[1]]);
    let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
    let remaining = bytes.len() - ETHERNET_HEADER_LEN;
    if length <= SESSION_HEADER_LEN || length > remaining {
        return None;
    }
    if header[SESSION_HEADER_LEN] != TAG_GOOSE_PDU {
        return None;
    }
    Some(appid)
}

/// Walk the TLVs in `bytes[start..end]` and fill in `frame`.
fn walk_pdu(
    bytes: &[u8],
    start: usize,
    end: usize,
    profile: Profile,
    frame: &mut GooseFrame,
) -> Result<(), DecodeError> {
    let mut pos = start;

    while pos < end {
        let tag = bytes[pos];
        let length_octet = read_u8(bytes, pos + 1).map_err(|_| DecodeError::TruncatedLength {
            offset: pos + 1,
        })?;
        let (length, consumed) = decode_length(bytes, pos + 1)?;
        let value_pos = pos + 1 + consumed;
        let truncated = DecodeError::TruncatedFrame {
            offset: value_pos,
            needed: length,
            available: end.saturating_sub(value_pos),
        };
        let value_end = match value_pos.checked_add(length) {
            Some(value_end) if value_end <= end => value_end,
            _ => return Err(truncated),
        };
        let value = bytes.get(value_pos..value_end).ok_or(truncated)?;
        let mut next = value_end;

        match tag {
            TAG_GOCB_REF => match profile {
                Profile::Session => frame.gocb_ref = read_string(value, value_pos)?,
                Profile::Flat => {
                    let (text, text_end) = flat_gocb_ref(bytes, value_pos, length)?;
                    frame.gocb_ref = text;
                    next = text_end;
                }
            },
            TAG_TIME_ALLOWED_TO_LIVE => {
                // width follows the length octet itself, not the decoded length
                let width = if length_octet == 2 { 2 } else { 1 };
                frame.time_allowed_to_live =
                    read_uint(bytes, value_pos, width).map_err(DecodeError::into_frame_error)?;
            }
            TAG_DAT_SET => frame.dat_set = read_string(value, value_pos)?,
            TAG_GO_ID => frame.go_id = read_string(value, value_pos)?,
            TAG_T => {
                expect_len(tag, length, QUALITY_TIMESTAMP_LEN, value_pos)?;
                frame.timestamp = Some(QualityTimestamp::decode(value, value_pos)?);
            }
            TAG_ST_NUM => frame.st_num = read_uint(bytes, value_pos, length)?,
            TAG_SQ_NUM => frame.sq_num = read_uint(bytes, value_pos, length)?,
            TAG_SIMULATION => {
                expect_len(tag, length, 1, value_pos)?;
                frame.simulation = value[0] != 0;
            }
            TAG_CONF_REV => frame.conf_rev = read_uint(bytes, value_pos, length)?,
            TAG_NDS_COM => {
                expect_len(tag, length, 1, value_pos)?;
                frame.nds_com = value[0] != 0;
            }
            TAG_NUM_DAT_SET_ENTRIES => {
                // only the first value octet is significant
                let first = value.first().ok_or(DecodeError::LengthMismatch {
                    offset: value_pos,
                    tag,
                    expected: 1,
                    actual: 0,
                })?;
                frame.num_dat_set_entries = u32::from(*first);
            }
            TAG_ALL_DATA => frame.all_data = decode_all_data(value, value_pos)?,
            other => {
                log::trace!("skipping tag 0x{:02x} ({} bytes) at {}", other, length, pos);
            }
        }

        pos = next;
    }

    Ok(())
}

/// Flat-profile gocbRef: the string starts `GOCB_REF_SKIP` bytes into the
/// value and runs for `length - GOCB_REF_LEN_ADJUST` bytes, one byte past
/// the declared value region. Returns the string and the position after it.
fn flat_gocb_ref(
    bytes: &[u8],
    value_pos: usize,
    length: usize,
) -> Result<(String, usize), DecodeError> {
    let text_len = length
        .checked_sub(GOCB_REF_LEN_ADJUST)
        .ok_or(DecodeError::MalformedGocbRef {
            offset: value_pos,
            length,
        })?;
    let text_pos = value_pos + GOCB_REF_SKIP;
    let text = read_slice(bytes, text_pos, text_len).map_err(DecodeError::into_frame_error)?;
    Ok((read_string(text, text_pos)?, text_pos + text_len))
}

fn read_string(value: &[u8], offset: usize) -> Result<String, DecodeError> {
    std::str::from_utf8(value)
        .map(str::to_string)
        .map_err(|source| DecodeError::Utf8 { offset, source })
}

fn expect_len(tag: u8, actual: usize, expected: usize, offset: usize) -> Result<(), DecodeError> {
    if actual != expected {
        return Err(DecodeError::LengthMismatch {
            offset,
            tag,
            expected,
            actual,
        });
    }
    Ok(())
}
