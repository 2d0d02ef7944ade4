// capture thread: filter GOOSE frames off the wire and queue them for the workers
use crate::goose::packet_processor::PacketData;
use crossbeam_channel::{Sender, TrySendError};
use log::{error, info, warn};
use pnet_datalink::DataLinkReceiver;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

const VLAN_TPID: [u8; 2] = [0x81, 0x00];
const GOOSE_ETHER_TYPE: [u8; 2] = [0x88, 0xB8];

/// Untagged or 802.1Q-tagged GOOSE frame.
#[inline(always)]
pub fn is_goose_packet(packet: &[u8]) -> bool {
    (packet.len() >= 14 && packet[12..14] == GOOSE_ETHER_TYPE)
        || (packet.len() >= 18 && packet[12..14] == VLAN_TPID && packet[16..18] == GOOSE_ETHER_TYPE)
}

/// Copy a frame for decoding, dropping an 802.1Q tag so the EtherType sits
/// at offset 12.
pub fn to_packet_data(packet: &[u8]) -> PacketData {
    let mut data = Vec::with_capacity(packet.len());
    if packet.len() >= 18 && packet[12..14] == VLAN_TPID {
        data.extend_from_slice(&packet[..12]);
        data.extend_from_slice(&packet[16..]);
    } else {
        data.extend_from_slice(packet);
    }
    PacketData { data }
}

pub fn spawn_capture_thread(
    mut rx: Box<dyn DataLinkReceiver>,
    packet_tx: Sender<PacketData>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("GOOSE capture thread started");
        let mut dropped: u64 = 0;

        while running.load(Ordering::Relaxed) {
            let packet = match rx.next() {
                Ok(packet) => packet,
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    continue;
                }
                Err(e) => {
                    error!("Capture read failed: {}", e);
                    break;
                }
            };
            if !is_goose_packet(packet) {
                continue;
            }
            match packet_tx.try_send(to_packet_data(packet)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    if dropped.is_power_of_two() {
                        warn!("Decode queue full, {} frame(s) dropped so far", dropped);
                    }
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }

        info!("GOOSE capture thread stopped ({} frame(s) dropped)", dropped);
    })
}
