use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub domoticz: DomoticzConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub snapshot_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomoticzConfig {
    pub url: String,
    pub gas_consumption_kwh_idx: Option<u32>,
    pub gas_consumption_m3_idx: Option<u32>,
    #[serde(default)]
    pub use_legacy_device_endpoint: bool,
    /// Pause between consecutive counter writes; guarantees the downstream
    /// log sees them in submission order.
    #[serde(default = "default_write_pause_ms")]
    pub write_pause_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_write_pause_ms() -> u64 {
    2000
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                snapshot_url: "http://127.0.0.1:8088/consumption".to_string(),
                poll_interval_secs: default_poll_interval_secs(),
            },
            domoticz: DomoticzConfig {
                url: "http://127.0.0.1:8080".to_string(),
                gas_consumption_kwh_idx: None,
                gas_consumption_m3_idx: None,
                use_legacy_device_endpoint: false,
                write_pause_ms: default_write_pause_ms(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
