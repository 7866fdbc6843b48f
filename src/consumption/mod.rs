//! Consumption snapshot types and the daily-series builder.
//!
//! The upstream API reports a rolling window of daily kWh deltas indexed
//! backward from the most recent reading, plus a cumulative total. The
//! builder expands that window into a date-ordered series and reconstructs
//! the cumulative total as displayed at each day.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Rolling window of daily gas consumption.
///
/// `day[0]` is the delta for `day_readat`'s date, `day[i]` the delta for
/// `day_readat.date - i` days.
#[derive(Debug, Clone)]
pub struct GasConsumption {
    pub day_readat: DateTime<Utc>,
    pub day: Vec<u64>,
}

/// Snapshot consumed by a single reconciliation pass.
///
/// Built fresh each polling cycle; the bridge retains only
/// `previous_consumption_date` across cycles.
#[derive(Debug, Clone)]
pub struct ConsumptionContext {
    /// Cumulative total in kWh, monotonic non-decreasing across cycles.
    pub total_consumption: u64,
    /// Date of the previous cycle's reading, if any.
    pub previous_consumption_date: Option<NaiveDate>,
    pub gas_consumption: Option<GasConsumption>,
}

/// One day of the expanded series: the delta consumed that day and the
/// cumulative total the counter should display for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub delta: u64,
    pub total_on_day: u64,
}

/// Expand the backward-indexed window into an ascending daily series.
///
/// For each day, `total_on_day = total_consumption - Σ(delta(d) for d ≥ day)`.
/// The sum deliberately includes the day itself, so the most recent day
/// displays `total_consumption` minus its own delta; the historical log
/// entries in Domoticz depend on this exact arithmetic.
pub fn daily_series(gas: &GasConsumption, total_consumption: u64) -> Vec<DayTotal> {
    let anchor = gas.day_readat.date_naive();

    let days: BTreeMap<NaiveDate, u64> = gas
        .day
        .iter()
        .enumerate()
        .map(|(i, &delta)| (anchor - Duration::days(i as i64), delta))
        .collect();

    days.iter()
        .map(|(&date, &delta)| {
            let consumption_after_this_day: u64 = days.range(date..).map(|(_, &v)| v).sum();
            DayTotal {
                date,
                delta,
                total_on_day: total_consumption.saturating_sub(consumption_after_this_day),
            }
        })
        .collect()
}
