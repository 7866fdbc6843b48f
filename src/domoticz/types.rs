//! Typed views of the Domoticz JSON API responses.

use serde::Deserialize;

/// Envelope returned by `getdevices` (and the legacy `devices` endpoint).
#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub result: Vec<DeviceInfo>,
}

/// The device-description fields that have to be echoed back when
/// re-issuing `setused` to flip a device option.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceInfo {
    pub name: String,
    pub switch_type_val: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub addj_value: f64,
    #[serde(default)]
    pub addj_value2: f64,
}
