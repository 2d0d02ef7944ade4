// start of the program: initialize configuration, logging and the capture interface
use crate::goose::types::FilterConfig;
use crate::os::config::AppConfig;
use crate::os::interfaces::{find_interface, list_capture_sources};
use crate::os::logs::{init_default_logging, init_logging};
use anyhow::{Context, Result};
use log::{LevelFilter, info};
use pnet_datalink::NetworkInterface;

pub struct Startup {
    pub config: AppConfig,
    pub filter: FilterConfig,
    pub interface: NetworkInterface,
}

/// Initialize application subsystems and return an error on fatal failures.
pub fn start() -> Result<Startup> {
    let config = AppConfig::load().context("Failed to load application configuration")?;
    println!("✅ Configuration loaded successfully");

    // non-fatal: fall back to console logging and keep going
    let log_config_path = config.logging_config_path();
    if let Err(e) = init_logging(&log_config_path) {
        eprintln!("WARNING: {e:#}");
        eprintln!("         Falling back to console logging.");
        init_default_logging(LevelFilter::Info)?;
    }

    info!("Application version: {}", config.sw_version);
    info!("GOOSE capture interface: {}", config.goose_interface);

    let filter = config.filter().context("Invalid filter address in configuration")?;
    info!(
        "Subscription filter - destination: {}, source: {}",
        filter.destination().unwrap_or("any"),
        filter.source().unwrap_or("any")
    );

    let available = list_capture_sources();
    info!("{} capture source(s) available", available.len());
    let interface = find_interface(&config.goose_interface)?;

    Ok(Startup {
        config,
        filter,
        interface,
    })
}
