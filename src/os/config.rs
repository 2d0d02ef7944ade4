// read configuration from toml file
use crate::goose::packet_processor::ReportFormat;
use crate::goose::types::FilterConfig;
use config::{Config, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_NUM_WORKERS: usize = 1;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sw_version: String,
    /// Directory holding `logging_config.yaml`.
    pub config_file_path: String,

    pub goose_interface: String,
    pub filter_source: Option<String>,
    pub filter_destination: Option<String>,

    pub num_workers: usize,
    pub channel_capacity: usize,
    pub report_format: ReportFormat,
}

impl AppConfig {
    /// Load `Config.toml` from the current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = match Config::builder()
            .add_source(config::File::with_name("Config"))
            .build()
        {
            Ok(cfg) => cfg,
            Err(e) => {
                let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                eprintln!("ERROR: Could not find or load Config.toml: {e}");
                eprintln!("       Current working directory: {}", current_dir.display());
                eprintln!("       Try running from the directory containing Config.toml.");
                return Err(e);
            }
        };
        Self::from_settings(&settings)
    }

    /// Load an explicit configuration file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        let sw_version = settings.get_string("sw_version")?;
        let config_file_path = settings.get_string("config_file_path")?;
        let goose_interface = settings.get_string("goose_interface")?;

        let filter_source = optional_string(settings, "filter_source")?;
        let filter_destination = optional_string(settings, "filter_destination")?;

        let num_workers = optional_usize(settings, "num_workers")?.unwrap_or(DEFAULT_NUM_WORKERS);
        if num_workers == 0 {
            return Err(ConfigError::Message(
                "'num_workers' must be at least 1".to_string(),
            ));
        }

        let channel_capacity =
            optional_usize(settings, "channel_capacity")?.unwrap_or(DEFAULT_CHANNEL_CAPACITY);

        let report_format = match optional_string(settings, "report_format")? {
            Some(s) => s
                .parse::<ReportFormat>()
                .map_err(|e| ConfigError::Message(e.to_string()))?,
            None => ReportFormat::default(),
        };

        Ok(AppConfig {
            sw_version,
            config_file_path,
            goose_interface,
            filter_source,
            filter_destination,
            num_workers,
            channel_capacity,
            report_format,
        })
    }

    /// Subscription filter built from the configured addresses.
    pub fn filter(&self) -> anyhow::Result<FilterConfig> {
        FilterConfig::new(
            self.filter_destination.as_deref(),
            self.filter_source.as_deref(),
        )
    }

    pub fn logging_config_path(&self) -> PathBuf {
        Path::new(&self.config_file_path).join("logging_config.yaml")
    }
}

/// Missing keys and empty strings are both `None`.
fn optional_string(settings: &Config, key: &str) -> Result<Option<String>, ConfigError> {
    match settings.get_string(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val.trim().to_string())),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn optional_usize(settings: &Config, key: &str) -> Result<Option<usize>, ConfigError> {
    match settings.get_int(key) {
        Ok(val) => usize::try_from(val)
            .map(Some)
            .map_err(|_| ConfigError::Message(format!("'{}' must not be negative", key))),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
