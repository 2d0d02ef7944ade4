use crate::goose::bitstring::{bits_to_string, Quality};
use crate::goose::reader::{format_mac, parse_mac};
use crate::goose::timestamp::QualityTimestamp;
use anyhow::Result;
use serde::Serialize;

/// One entry of the allData sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataValue {
    Boolean(bool),
    BitString {
        bits: Vec<bool>,
        /// `None` when fewer than 13 bits were present.
        quality: Option<Quality>,
    },
    Integer {
        value: u32,
        /// Calendar rendering when the integer is an epoch-seconds timestamp.
        utc: Option<String>,
    },
    Timestamp(QualityTimestamp),
    Unknown {
        tag: u8,
    },
}

impl DataValue {
    pub fn as_quality(&self) -> Option<&Quality> {
        match self {
            DataValue::BitString { quality, .. } => quality.as_ref(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&QualityTimestamp> {
        match self {
            DataValue::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Get the variant name as a string for debugging/logging
    pub fn variant_name(&self) -> &'static str {
        match self {
            DataValue::Boolean(_) => "Boolean",
            DataValue::BitString { .. } => "BitString",
            DataValue::Integer { utc: Some(_), .. } => "Timestamp",
            DataValue::Integer { utc: None, .. } => "Integer",
            DataValue::Timestamp(_) => "Timestamp",
            DataValue::Unknown { .. } => "Unknown",
        }
    }

    /// Short human readable value, used by the text report.
    pub fn describe(&self) -> String {
        match self {
            DataValue::Boolean(b) => b.to_string(),
            DataValue::BitString { bits, quality } => match quality {
                Some(q) => {
                    let flags: Vec<&str> = q
                        .flags()
                        .iter()
                        .filter(|(_, set)| *set)
                        .map(|(name, _)| *name)
                        .collect();
                    format!("{} ({:?} {:?})", bits_to_string(bits), q.validity, flags)
                }
                None => bits_to_string(bits),
            },
            DataValue::Integer { value, utc: None } => value.to_string(),
            DataValue::Integer {
                value,
                utc: Some(utc),
            } => format!("{} ({})", value, utc),
            DataValue::Timestamp(ts) => ts.to_string(),
            DataValue::Unknown { tag } => format!("tag 0x{:02x}", tag),
        }
    }
}

/// A decoded GOOSE message. Built fresh for every captured frame.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooseFrame {
    pub destination: String,
    pub source: String,
    pub ether_type: String,
    /// Present when the frame carried a GOOSE session header.
    pub appid: Option<u16>,
    pub gocb_ref: String,
    pub time_allowed_to_live: u32,
    pub dat_set: String,
    #[serde(rename = "goID")]
    pub go_id: String,
    pub timestamp: Option<QualityTimestamp>,
    pub st_num: u32,
    pub sq_num: u32,
    pub simulation: bool,
    pub conf_rev: u32,
    pub nds_com: bool,
    pub num_dat_set_entries: u32,
    pub all_data: Vec<DataValue>,
}

impl GooseFrame {
    pub fn report_line(&self) -> String {
        format!(
            "goID:{} gocbRef:{} datSet:{} src:{} dst:{} stNum:{} sqNum:{} confRev:{} entries:{}/{}",
            self.go_id,
            self.gocb_ref,
            self.dat_set,
            self.source,
            self.destination,
            self.st_num,
            self.sq_num,
            self.conf_rev,
            self.all_data.len(),
            self.num_dat_set_entries
        )
    }
}

/// Why a frame was not decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IgnoreReason {
    DestinationMismatch { expected: String, actual: String },
    SourceMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Decoded(GooseFrame),
    Ignored(IgnoreReason),
}

impl FrameOutcome {
    pub fn frame(&self) -> Option<&GooseFrame> {
        match self {
            FrameOutcome::Decoded(frame) => Some(frame),
            FrameOutcome::Ignored(_) => None,
        }
    }

    pub fn into_frame(self) -> Option<GooseFrame> {
        match self {
            FrameOutcome::Decoded(frame) => Some(frame),
            FrameOutcome::Ignored(_) => None,
        }
    }
}

/// Subscription filter. Unset addresses match every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    destination: Option<String>,
    source: Option<String>,
}

impl FilterConfig {
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse and canonicalise the optional addresses. Any notation accepted
    /// by `parse_mac` is allowed.
    pub fn new(destination: Option<&str>, source: Option<&str>) -> Result<Self> {
        let canonical = |s: &str| -> Result<String> { Ok(format_mac(&parse_mac(s)?)) };
        Ok(FilterConfig {
            destination: destination.map(canonical).transpose()?,
            source: source.map(canonical).transpose()?,
        })
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub(crate) fn check(&self, destination: &str, source: &str) -> Option<IgnoreReason> {
        if let Some(expected) = &self.destination {
            if expected != destination {
                return Some(IgnoreReason::DestinationMismatch {
                    expected: expected.clone(),
                    actual: destination.to_string(),
                });
            }
        }
        if let Some(expected) = &self.source {
            if expected != source {
                return Some(IgnoreReason::SourceMismatch {
                    expected: expected.clone(),
                    actual: source.to_string(),
                });
            }
        }
        None
    }
}
