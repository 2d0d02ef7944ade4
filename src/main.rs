// GOOSE Monitor Main Entry Point - passive subscriber
//
// Flow:
// 1. Load Config.toml, logging and the subscription filter
// 2. Open a promiscuous capture on the configured interface
// 3. Spawn decode workers sharing one sequence tracker
// 4. Spawn the capture thread feeding the decode queue

use anyhow::Result;
use crossbeam_channel::bounded;
use goose_monitor::goose::packet_processor::{FrameSink, LogSink};
use goose_monitor::goose::sequence::SequenceTracker;
use goose_monitor::network::open_capture;
use goose_monitor::threads::{spawn_capture_thread, spawn_worker_threads};
use log::{error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:?}", e);
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let startup = goose_monitor::os::start::start()?;
    let config = &startup.config;

    info!("========================================");
    info!("GOOSE Monitor Starting - Subscriber");
    info!("========================================");

    info!("Step 1: Opening capture on {}", startup.interface.name);
    let rx = open_capture(&startup.interface)?;
    let (packet_tx, packet_rx) = bounded(config.channel_capacity);
    info!("✅ Capture ready, queue capacity {}", config.channel_capacity);

    info!("Step 2: Spawning {} decode worker(s)", config.num_workers);
    let tracker = Arc::new(SequenceTracker::new());
    let sink: Arc<dyn FrameSink> = Arc::new(LogSink::new(config.report_format));
    let worker_handles = spawn_worker_threads(
        packet_rx,
        Arc::clone(&tracker),
        Arc::new(startup.filter.clone()),
        sink,
        config.num_workers,
    );

    info!("Step 3: Starting GOOSE capture thread");
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;
    let capture_handle = spawn_capture_thread(rx, packet_tx, Arc::clone(&running));
    info!("✅ All threads started, monitoring GOOSE traffic (Ctrl+C to stop)");

    if capture_handle.join().is_err() {
        warn!("Capture thread panicked");
    }
    for handle in worker_handles {
        if handle.join().is_err() {
            warn!("Decode worker panicked");
        }
    }

    info!("GOOSE Monitor stopped, {} publisher(s) seen", tracker.len());
    Ok(())
}
