// UtcTime decoding (IEC 61850-8-1 8-byte form) and the 4-byte epoch-seconds form
use crate::goose::error::DecodeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const QUALITY_TIMESTAMP_LEN: usize = 8;

const FRACTION_SCALE: f64 = (1u32 << 24) as f64;
const CALENDAR_FORMAT: &str = "%b %-d, %Y %H:%M:%S";

/// Time accuracy from the low 5 bits of the time-quality octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeAccuracy {
    /// Number of significant bits in the fraction (0-24).
    Bits(u8),
    Invalid,
    Unspecified,
}

impl TimeAccuracy {
    pub fn from_bits(value: u8) -> Self {
        match value & 0x1F {
            31 => TimeAccuracy::Unspecified,
            25..=30 => TimeAccuracy::Invalid,
            n => TimeAccuracy::Bits(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityTimestamp {
    pub seconds: u32,
    /// Raw 24-bit binary fraction of a second.
    pub fraction: u32,
    /// `fraction / 2^24`, always in `[0, 1)`.
    pub fractional_seconds: f64,
    pub leap_second_known: bool,
    pub clock_failure: bool,
    pub clock_not_synchronized: bool,
    pub accuracy: TimeAccuracy,
}

impl QualityTimestamp {
    /// Decode the 8-byte form. `offset` is only used for error reporting.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        if bytes.len() < QUALITY_TIMESTAMP_LEN {
            return Err(DecodeError::TruncatedField {
                offset,
                needed: QUALITY_TIMESTAMP_LEN,
                available: bytes.len(),
            });
        }
        let seconds = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let fraction = u32::from_be_bytes([0, bytes[4], bytes[5], bytes[6]]);
        let quality = bytes[7];

        Ok(QualityTimestamp {
            seconds,
            fraction,
            fractional_seconds: f64::from(fraction) / FRACTION_SCALE,
            leap_second_known: quality & 0x80 != 0,
            clock_failure: quality & 0x40 != 0,
            clock_not_synchronized: quality & 0x20 != 0,
            accuracy: TimeAccuracy::from_bits(quality),
        })
    }

    /// Calendar time at whole-second precision.
    pub fn utc(&self) -> DateTime<Utc> {
        epoch_seconds_to_utc(self.seconds)
    }

    /// Fraction truncated to microseconds.
    pub fn micros(&self) -> u32 {
        ((u64::from(self.fraction) * 1_000_000) >> 24) as u32
    }
}

impl fmt::Display for QualityTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06} UTC (leap second known: {}, clock failure: {}, clock not synchronized: {}, accuracy: ",
            self.utc().format(CALENDAR_FORMAT),
            self.micros(),
            self.leap_second_known,
            self.clock_failure,
            self.clock_not_synchronized
        )?;
        match self.accuracy {
            TimeAccuracy::Bits(n) => write!(f, "{} bits)", n),
            TimeAccuracy::Invalid => write!(f, "invalid)"),
            TimeAccuracy::Unspecified => write!(f, "unspecified)"),
        }
    }
}

pub fn epoch_seconds_to_utc(seconds: u32) -> DateTime<Utc> {
    // every u32 second count is inside chrono's range
    DateTime::<Utc>::from_timestamp(i64::from(seconds), 0).unwrap_or_default()
}

/// Render epoch seconds as `Sep 13, 2020 12:26:40 UTC`.
pub fn render_utc(seconds: u32) -> String {
    format!("{} UTC", epoch_seconds_to_utc(seconds).format(CALENDAR_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fraction_zero_quality() {
        let ts = QualityTimestamp::decode(&[0x5F, 0x5E, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00], 0)
            .unwrap();
        assert_eq!(ts.seconds, 0x5F5E_1000);
        assert_eq!(ts.fractional_seconds, 0.0);
        assert!(!ts.leap_second_known);
        assert!(!ts.clock_failure);
        assert!(!ts.clock_not_synchronized);
        assert_eq!(ts.accuracy, TimeAccuracy::Bits(0));
        assert_eq!(ts.utc().timestamp(), 1_600_000_000);
    }

    #[test]
    fn half_second_fraction_and_flags() {
        let ts = QualityTimestamp::decode(&[0x5F, 0x5E, 0x10, 0x00, 0x80, 0x00, 0x00, 0xEA], 0)
            .unwrap();
        assert_eq!(ts.fraction, 0x80_0000);
        assert_eq!(ts.fractional_seconds, 0.5);
        assert_eq!(ts.micros(), 500_000);
        assert!(ts.leap_second_known);
        assert!(ts.clock_failure);
        assert!(ts.clock_not_synchronized);
        assert_eq!(ts.accuracy, TimeAccuracy::Bits(10));
    }

    #[test]
    fn fraction_stays_below_one() {
        let ts = QualityTimestamp::decode(&[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0x00], 0).unwrap();
        assert!(ts.fractional_seconds < 1.0);
        assert!(ts.fractional_seconds > 0.999_999);
    }

    #[test]
    fn accuracy_sentinels() {
        assert_eq!(TimeAccuracy::from_bits(0x1F), TimeAccuracy::Unspecified);
        assert_eq!(TimeAccuracy::from_bits(25), TimeAccuracy::Invalid);
        assert_eq!(TimeAccuracy::from_bits(30), TimeAccuracy::Invalid);
        assert_eq!(TimeAccuracy::from_bits(24), TimeAccuracy::Bits(24));
        // flag bits do not leak into the accuracy
        assert_eq!(TimeAccuracy::from_bits(0xE0 | 3), TimeAccuracy::Bits(3));
    }

    #[test]
    fn short_input() {
        let err = QualityTimestamp::decode(&[0; 7], 30).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedField {
                offset: 30,
                needed: 8,
                available: 7
            }
        );
    }

    #[test]
    fn display_keeps_fraction() {
        let ts = QualityTimestamp::decode(&[0x5F, 0x5E, 0x10, 0x00, 0x80, 0x00, 0x00, 0x1F], 0)
            .unwrap();
        assert_eq!(
            ts.to_string(),
            "Sep 13, 2020 12:26:40.500000 UTC (leap second known: false, clock failure: false, \
             clock not synchronized: false, accuracy: unspecified)"
        );
    }

    #[test]
    fn epoch_seconds() {
        assert_eq!(epoch_seconds_to_utc(0x5F5E_1000).timestamp(), 1_600_000_000);
        assert_eq!(epoch_seconds_to_utc(u32::MAX).timestamp(), i64::from(u32::MAX));
    }

    #[test]
    fn render_utc_format() {
        assert_eq!(render_utc(0x5F5E_1000), "Sep 13, 2020 12:26:40 UTC");
        assert_eq!(render_utc(0), "Jan 1, 1970 00:00:00 UTC");
    }
}
