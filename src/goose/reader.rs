// fixed-width field readers shared by the frame walker and the data-set decoder
use crate::goose::error::DecodeError;
use anyhow::Result;
use log::error;

/// Widest integer field the decoder accepts.
pub const MAX_UINT_WIDTH: usize = 4;

/// Borrow `len` bytes starting at `offset`.
pub fn read_slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(len);
    match end.and_then(|end| buf.get(offset..end)) {
        Some(bytes) => Ok(bytes),
        None => Err(DecodeError::TruncatedField {
            offset,
            needed: len,
            available: buf.len().saturating_sub(offset),
        }),
    }
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, DecodeError> {
    Ok(read_slice(buf, offset, 1)?[0])
}

/// Read a big-endian unsigned integer of `width` bytes (1-4). A zero width
/// reads nothing and yields 0.
pub fn read_uint(buf: &[u8], offset: usize, width: usize) -> Result<u32, DecodeError> {
    if width > MAX_UINT_WIDTH {
        return Err(DecodeError::FieldTooWide { offset, width });
    }
    let bytes = read_slice(buf, offset, width)?;
    Ok(bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}

/// Read a 6-byte MAC address, e.g. `01:0C:CD:01:00:08`.
pub fn read_mac(buf: &[u8], offset: usize) -> Result<String, DecodeError> {
    let bytes = read_slice(buf, offset, 6)?;
    let mut mac = [0u8; 6];
    mac.copy_from_slice(bytes);
    Ok(format_mac(&mac))
}

/// Read a 2-byte EtherType as four lower-case hex digits, e.g. `88b8`.
pub fn read_ether_type(buf: &[u8], offset: usize) -> Result<String, DecodeError> {
    let bytes = read_slice(buf, offset, 2)?;
    Ok(format!("{:04x}", u16::from_be_bytes([bytes[0], bytes[1]])))
}

pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse MAC address string into [u8; 6]
/// Supports formats like "01:0C:CD:01:00:01", "01-0C-CD-01-00-01", "010CCD010001"
pub fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(|c| c == ':' || c == '-' || c == '.').collect();
    if parts.len() == 6 {
        let mut mac = [0u8; 6];
        for (i, p) in parts.iter().enumerate() {
            if p.len() != 2 {
                error!("MAC part '{}' has wrong length in '{}'", p, s);
                anyhow::bail!("MAC part '{}' has wrong length", p);
            }
            mac[i] = u8::from_str_radix(p, 16).map_err(|e| {
                error!("Invalid hex '{}' in MAC address '{}': {}", p, s, e);
                anyhow::anyhow!("Invalid hex in '{}': {}", p, e)
            })?;
        }
        return Ok(mac);
    }

    if s.len() == 12 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut mac = [0u8; 6];
        for (i, byte) in mac.iter_mut().enumerate() {
            let pair = &s[2 * i..2 * i + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|e| anyhow::anyhow!("Invalid hex in '{}': {}", pair, e))?;
        }
        return Ok(mac);
    }

    anyhow::bail!("invalid MAC format: {}", s)
}
