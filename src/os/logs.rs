use anyhow::{Context, Result};
use log::{LevelFilter, info};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const DEFAULT_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

/// Initialize logging from `logging_config.yaml`.
pub fn init_logging<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    if !path.exists() {
        anyhow::bail!("Logging configuration not found: {}", path.display());
    }
    log4rs::init_file(path, Default::default())
        .with_context(|| format!("Failed to load logging config {}", path.display()))?;
    info!("Loaded logging configuration from {}", path.display());
    Ok(())
}

/// Console-only logging, used when no logging file could be loaded.
pub fn init_default_logging(level: LevelFilter) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .context("Failed to build default logging config")?;
    log4rs::init_config(config).context("Failed to install default logger")?;
    Ok(())
}
