use anyhow::Result;
use log::info;
use pnet_datalink::NetworkInterface;

/// Enumerate the interfaces a capture can be opened on. Called on demand at
/// startup, never implicitly.
pub fn list_capture_sources() -> Vec<NetworkInterface> {
    let all = pnet_datalink::interfaces();
    for iface in &all {
        info!(
            "found interface {} (mac: {}, up: {})",
            iface.name,
            iface
                .mac
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            iface.is_up()
        );
    }
    all
}

/// Look up the interface configured as `goose_interface`.
pub fn find_interface(name: &str) -> Result<NetworkInterface> {
    if name.trim().is_empty() {
        anyhow::bail!("No GOOSE capture interface configured");
    }
    pnet_datalink::interfaces()
        .into_iter()
        .find(|i| i.name == name)
        .ok_or_else(|| anyhow::anyhow!("Network interface '{}' not found", name))
}
