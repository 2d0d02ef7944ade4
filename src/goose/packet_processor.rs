// per-packet pipeline: decode, sequence check, hand off to the report sink
use crate::goose::error::DecodeError;
use crate::goose::pdu::decode;
use crate::goose::sequence::{SequenceCheck, SequenceGap, SequenceTracker};
use crate::goose::types::{FilterConfig, FrameOutcome, GooseFrame, IgnoreReason};
use log::{debug, info, warn};
use serde::Serialize;

/// One captured frame as delivered by the capture thread.
pub struct PacketData {
    pub data: Vec<u8>,
}

/// Receiver of decode results. Formatting and persistence live behind this.
pub trait FrameSink: Send + Sync {
    fn frame(&self, frame: &GooseFrame);
    fn ignored(&self, reason: &IgnoreReason);
    fn gap(&self, gap: &SequenceGap);
    fn failure(&self, error: &DecodeError, packet: &[u8]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => anyhow::bail!("unknown report format '{}', expected text or json", other),
        }
    }
}

/// Sink that writes every result through the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink {
    format: ReportFormat,
}

impl LogSink {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl FrameSink for LogSink {
    fn frame(&self, frame: &GooseFrame) {
        match self.format {
            ReportFormat::Text => {
                info!("{}", frame.report_line());
                if let Some(ts) = &frame.timestamp {
                    info!("  t: {}", ts);
                }
                for (i, value) in frame.all_data.iter().enumerate() {
                    info!("  [{}] {}: {}", i, value.variant_name(), value.describe());
                }
            }
            ReportFormat::Json => info!("{}", Self::json(frame)),
        }
    }

    fn ignored(&self, reason: &IgnoreReason) {
        debug!("frame ignored: {:?}", reason);
    }

    fn gap(&self, gap: &SequenceGap) {
        match self.format {
            ReportFormat::Text => warn!(
                "GOOSE sequence GAP from {} - expected sqNum {}, got {}",
                gap.publisher_id, gap.expected, gap.actual
            ),
            ReportFormat::Json => warn!("{}", Self::json(gap)),
        }
    }

    fn failure(&self, error: &DecodeError, packet: &[u8]) {
        warn!(
            "Failed to decode GOOSE frame ({} bytes): {} at offset {}: {}",
            packet.len(),
            error.kind(),
            error.offset(),
            error
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatus {
    Decoded(SequenceCheck),
    Ignored,
    Failed,
}

/// Decode one packet, track its sequence number and report the result.
/// Never fails: a bad frame is reported and the caller moves on.
pub fn process_rx_packet(
    tracker: &SequenceTracker,
    filter: &FilterConfig,
    sink: &dyn FrameSink,
    packet: &PacketData,
) -> PacketStatus {
    match decode(&packet.data, filter) {
        Ok(FrameOutcome::Decoded(frame)) => {
            let check = tracker.gap_check(&frame.go_id, frame.sq_num);
            sink.frame(&frame);
            if let SequenceCheck::Gap(gap) = &check {
                sink.gap(gap);
            }
            PacketStatus::Decoded(check)
        }
        Ok(FrameOutcome::Ignored(reason)) => {
            sink.ignored(&reason);
            PacketStatus::Ignored
        }
        Err(e) => {
            sink.failure(&e, &packet.data);
            PacketStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<GooseFrame>>,
        gaps: Mutex<Vec<SequenceGap>>,
        failures: Mutex<Vec<&'static str>>,
        ignored: Mutex<usize>,
    }

    impl FrameSink for RecordingSink {
        fn frame(&self, frame: &GooseFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
        fn ignored(&self, _reason: &IgnoreReason) {
            *self.ignored.lock().unwrap() += 1;
        }
        fn gap(&self, gap: &SequenceGap) {
            self.gaps.lock().unwrap().push(gap.clone());
        }
        fn failure(&self, error: &DecodeError, _packet: &[u8]) {
            self.failures.lock().unwrap().push(error.kind());
        }
    }

    fn packet(src_last: u8, go_id: &[u8], sq_num: u8) -> PacketData {
        let mut data = vec![0x01, 0x0C, 0xCD, 0x04, 0x00, 0x22];
        data.extend_from_slice(&[0x00, 0x1A, 0x2B, 0x3C, 0x4D, src_last]);
        data.extend_from_slice(&[0x88, 0xB8]);
        data.push(0x83);
        data.push(go_id.len() as u8);
        data.extend_from_slice(go_id);
        data.extend_from_slice(&[0x86, 0x01, sq_num]);
        PacketData { data }
    }

    #[test]
    fn gaps_are_reported_and_decoding_continues() {
        let tracker = SequenceTracker::new();
        let filter = FilterConfig::new(None, Some("00:1A:2B:3C:4D:5E")).unwrap();
        let sink = RecordingSink::default();

        let statuses: Vec<PacketStatus> = [
            packet(0x5E, b"RELAY1", 5),
            packet(0x5E, b"RELAY1", 7),
            PacketData {
                data: vec![0x01, 0x02],
            },
            packet(0x5F, b"RELAY1", 8),
            packet(0x5E, b"RELAY1", 8),
        ]
        .iter()
        .map(|p| process_rx_packet(&tracker, &filter, &sink, p))
        .collect();

        assert_eq!(statuses[0], PacketStatus::Decoded(SequenceCheck::Baseline));
        assert!(matches!(statuses[1], PacketStatus::Decoded(SequenceCheck::Gap(_))));
        assert_eq!(statuses[2], PacketStatus::Failed);
        assert_eq!(statuses[3], PacketStatus::Ignored);
        assert_eq!(statuses[4], PacketStatus::Decoded(SequenceCheck::Continuous));

        assert_eq!(sink.frames.lock().unwrap().len(), 3);
        assert_eq!(
            *sink.gaps.lock().unwrap(),
            vec![SequenceGap {
                publisher_id: "RELAY1".to_string(),
                expected: 6,
                actual: 7
            }]
        );
        assert_eq!(*sink.failures.lock().unwrap(), vec!["TruncatedFrame"]);
        assert_eq!(*sink.ignored.lock().unwrap(), 1);
    }

    #[test]
    fn report_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!(" Text ".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn log_sink_accepts_all_events() {
        let tracker = SequenceTracker::new();
        for format in [ReportFormat::Text, ReportFormat::Json] {
            let sink = LogSink::new(format);
            process_rx_packet(&tracker, &FilterConfig::any(), &sink, &packet(0x5E, b"G", 1));
            process_rx_packet(&tracker, &FilterConfig::any(), &sink, &packet(0x5E, b"G", 9));
        }
    }
}
