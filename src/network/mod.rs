use anyhow::Result;
use log::{error, info};
use pnet_datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use std::time::Duration;

/// Read timeout so capture threads can notice shutdown.
pub const CAPTURE_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Open a promiscuous Ethernet capture on `interface`.
///
/// Only the receive half is kept; the monitor never transmits.
pub fn open_capture(interface: &NetworkInterface) -> Result<Box<dyn DataLinkReceiver>> {
    let config = pnet_datalink::Config {
        read_timeout: Some(CAPTURE_READ_TIMEOUT),
        promiscuous: true,
        ..Default::default()
    };

    match pnet_datalink::channel(interface, config) {
        Ok(Channel::Ethernet(_tx, rx)) => {
            info!("Capture channel opened on interface: {}", interface.name);
            Ok(rx)
        }
        Ok(_) => {
            error!("Unhandled channel type on {}", interface.name);
            anyhow::bail!("Unhandled datalink channel type on {}", interface.name)
        }
        Err(e) => {
            error!("Failed to create datalink channel on {}: {}", interface.name, e);
            anyhow::bail!("Failed to open capture on {}: {}", interface.name, e)
        }
    }
}
