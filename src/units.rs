//! Gas unit conversion between the upstream kWh readings and the
//! volumetric counters Domoticz displays.

/// Energy content of high-calorific natural gas, in kWh per cubic metre.
pub const GAS_KWH_PER_M3: f64 = 11.2;

/// Convert a kWh consumption reading to milli-m³ (the sub-unit resolution
/// Domoticz counters store), truncating toward zero.
pub fn kwh_to_milli_m3(kwh: u64) -> u64 {
    ((kwh as f64 / GAS_KWH_PER_M3) * 1000.0).floor() as u64
}

/// Which unit a counter device displays; selects the payload scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUnit {
    KilowattHours,
    CubicMeters,
}

impl CounterUnit {
    /// Scale a kWh reading to the milli-unit value the counter stores.
    pub fn to_counter_units(self, kwh: u64) -> u64 {
        match self {
            CounterUnit::KilowattHours => kwh * 1000,
            CounterUnit::CubicMeters => kwh_to_milli_m3(kwh),
        }
    }
}
