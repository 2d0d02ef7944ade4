// decode workers: pull captured frames off the queue and run them through the pipeline
use crate::goose::packet_processor::{FrameSink, PacketData, PacketStatus, process_rx_packet};
use crate::goose::sequence::{SequenceCheck, SequenceTracker};
use crate::goose::types::FilterConfig;
use crossbeam_channel::Receiver;
use log::info;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub decoded: u64,
    pub ignored: u64,
    pub failed: u64,
    pub gaps: u64,
}

impl WorkerStats {
    fn record(&mut self, status: &PacketStatus) {
        match status {
            PacketStatus::Decoded(check) => {
                self.decoded += 1;
                if matches!(check, SequenceCheck::Gap(_)) {
                    self.gaps += 1;
                }
            }
            PacketStatus::Ignored => self.ignored += 1,
            PacketStatus::Failed => self.failed += 1,
        }
    }
}

/// Spawn `num_workers` decode threads sharing one tracker. Each thread runs
/// until the channel is closed and returns its counters.
///
/// With more than one worker, frames of one publisher may be processed out
/// of order and show up as sequence gaps.
pub fn spawn_worker_threads(
    packet_rx: Receiver<PacketData>,
    tracker: Arc<SequenceTracker>,
    filter: Arc<FilterConfig>,
    sink: Arc<dyn FrameSink>,
    num_workers: usize,
) -> Vec<JoinHandle<WorkerStats>> {
    let worker_count = num_workers.max(1);
    info!("Spawning {} decode worker thread(s)", worker_count);

    (0..worker_count)
        .map(|worker_id| {
            let rx = packet_rx.clone();
            let tracker = Arc::clone(&tracker);
            let filter = Arc::clone(&filter);
            let sink = Arc::clone(&sink);

            thread::spawn(move || {
                let mut stats = WorkerStats::default();
                while let Ok(packet) = rx.recv() {
                    let status = process_rx_packet(&tracker, &filter, sink.as_ref(), &packet);
                    stats.record(&status);
                }
                info!(
                    "Decode worker {} shutting down - decoded: {}, ignored: {}, failed: {}, gaps: {}",
                    worker_id, stats.decoded, stats.ignored, stats.failed, stats.gaps
                );
                stats
            })
        })
        .collect()
}
