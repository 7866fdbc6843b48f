//! Domoticz counter publisher.
//!
//! Talks to the Domoticz JSON API to keep one or two gas counters (kWh and
//! m³) in sync. Historical days need a dual write per Domoticz's counter
//! semantics: a date-only log entry first, then a midnight-timestamped entry
//! whose delta is zeroed for the in-progress day. Writes to one device must
//! arrive strictly ordered, so a pause is inserted between consecutive
//! writes; the pause length is tunable but the ordering is the contract.
//!
//! Reference: <https://wiki.domoticz.com/Domoticz_API/JSON_URL's#Note_on_counters>

pub mod types;

use std::time::Duration;

use base64::Engine;
use chrono::NaiveDate;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::DomoticzConfig;
use crate::consumption::DayTotal;
use crate::units::CounterUnit;
use types::{DeviceInfo, DevicesResponse};

#[derive(Debug, Error)]
pub enum DomoticzError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("device {idx} description is missing the expected fields")]
    DeviceShape { idx: u32 },
}

/// A single `udevice` write. Counters always carry `nvalue=0`; the payload
/// lives entirely in `svalue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterUpdate {
    pub idx: u32,
    pub svalue: String,
}

/// Build the ordered dual-write plan for one counter's daily history.
///
/// Each day yields two writes: the date-only log entry, then the
/// midnight-timestamped entry. The timestamped write carries delta `0` for
/// `today` so the in-progress day is not double-counted.
pub fn daily_history_plan(
    idx: u32,
    unit: CounterUnit,
    series: &[DayTotal],
    today: NaiveDate,
) -> Vec<CounterUpdate> {
    let mut plan = Vec::with_capacity(series.len() * 2);

    for day in series {
        let total = unit.to_counter_units(day.total_on_day);
        let delta = unit.to_counter_units(day.delta);
        let date = day.date.format("%Y-%m-%d");

        plan.push(CounterUpdate {
            idx,
            svalue: format!("{};{};{}", total, delta, date),
        });

        let delta_or_zero = if day.date == today { 0 } else { delta };
        plan.push(CounterUpdate {
            idx,
            svalue: format!("{};{};{} 00:00:00", total, delta_or_zero, date),
        });
    }

    plan
}

/// Client for the Domoticz JSON API.
pub struct Domoticz {
    config: DomoticzConfig,
    http: Client,
    write_pause: Duration,
}

impl Domoticz {
    pub fn new(config: DomoticzConfig) -> Self {
        let write_pause = Duration::from_millis(config.write_pause_ms);
        Self {
            config,
            http: Client::new(),
            write_pause,
        }
    }

    /// The configured counters, with the scaling each one expects.
    fn counters(&self) -> Vec<(u32, CounterUnit)> {
        let mut counters = Vec::new();
        if let Some(idx) = self.config.gas_consumption_kwh_idx {
            counters.push((idx, CounterUnit::KilowattHours));
        }
        if let Some(idx) = self.config.gas_consumption_m3_idx {
            counters.push((idx, CounterUnit::CubicMeters));
        }
        counters
    }

    async fn request(&self, params: &[(&str, String)]) -> Result<String, DomoticzError> {
        let url = format!("{}/json.htm", self.config.url);
        debug!("Requesting Domoticz {} with params {:?}", url, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| DomoticzError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomoticzError::UnexpectedStatus { status, url });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DomoticzError::Transport { url, source: e })?;
        debug!("Response: {}", body);
        Ok(body)
    }

    /// Send one counter update. Failures are logged and swallowed; the
    /// remaining writes of a batch still run.
    async fn send_update(&self, update: &CounterUpdate) {
        let params = [
            ("type", "command".to_string()),
            ("param", "udevice".to_string()),
            ("idx", update.idx.to_string()),
            ("nvalue", "0".to_string()),
            ("svalue", update.svalue.clone()),
        ];

        if let Err(e) = self.request(&params).await {
            error!("Counter update for idx {} failed: {}", update.idx, e);
        }
    }

    /// Push the current cumulative total to every configured counter.
    pub async fn update_current_total(&self, total_consumption: u64) {
        debug!("Updating current total consumption: {}", total_consumption);

        for (idx, unit) in self.counters() {
            let update = CounterUpdate {
                idx,
                svalue: unit.to_counter_units(total_consumption).to_string(),
            };
            self.send_update(&update).await;
        }
    }

    /// Replay a daily series into every configured counter's historical log.
    ///
    /// An empty series issues no writes. `today` decides which day gets the
    /// zeroed timestamped delta.
    pub async fn update_daily_history(&self, series: &[DayTotal], today: NaiveDate) {
        debug!("Updating daily consumption stats for {} day(s)", series.len());

        for (idx, unit) in self.counters() {
            for update in daily_history_plan(idx, unit, series, today) {
                self.send_update(&update).await;
                tokio::time::sleep(self.write_pause).await;
            }
        }
    }

    /// One-time provisioning: flip `AddDBLogEntry` on so historical log
    /// entries become editable. The devices must be of the Counter type.
    pub async fn configure_counters(&self) -> Result<(), DomoticzError> {
        for (idx, _) in self.counters() {
            let device = self.fetch_device(idx).await?;
            self.enable_db_log_entry(idx, device).await?;
        }
        Ok(())
    }

    async fn fetch_device(&self, idx: u32) -> Result<DeviceInfo, DomoticzError> {
        let params = if self.config.use_legacy_device_endpoint {
            vec![("type", "devices".to_string()), ("rid", idx.to_string())]
        } else {
            vec![
                ("type", "command".to_string()),
                ("param", "getdevices".to_string()),
                ("rid", idx.to_string()),
            ]
        };

        let body = self.request(&params).await?;
        let devices: DevicesResponse =
            serde_json::from_str(&body).map_err(|_| DomoticzError::DeviceShape { idx })?;

        devices
            .result
            .into_iter()
            .next()
            .ok_or(DomoticzError::DeviceShape { idx })
    }

    async fn enable_db_log_entry(
        &self,
        idx: u32,
        device: DeviceInfo,
    ) -> Result<(), DomoticzError> {
        let options = base64::engine::general_purpose::STANDARD.encode("AddDBLogEntry:true");

        let params = [
            ("type", "setused".to_string()),
            ("idx", idx.to_string()),
            ("name", device.name),
            ("switchtype", device.switch_type_val.to_string()),
            ("description", device.description),
            ("addjvalue", device.addj_value.to_string()),
            ("addjvalue2", device.addj_value2.to_string()),
            ("used", "true".to_string()),
            ("options", options),
        ];

        self.request(&params).await?;
        info!("Enabled AddDBLogEntry on counter {}", idx);
        Ok(())
    }
}
