//! Cycle orchestration: rollover detection and midnight reconciliation.
//!
//! Each polling cycle consumes a fresh snapshot. Normally only the current
//! cumulative total is pushed; when the reading date differs from the
//! previous cycle's date the sampling boundary crossed midnight, and the
//! whole daily window is replayed so yesterday's values settle correctly
//! before today accumulates further.

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::consumption::{daily_series, ConsumptionContext, GasConsumption};
use crate::domoticz::Domoticz;
use crate::upstream::ConsumptionSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("midnight reconciliation requires a previous reading date and a daily window")]
    MissingContext,
}

pub struct Bridge {
    publisher: Domoticz,
    previous_consumption_date: Option<NaiveDate>,
}

impl Bridge {
    pub fn new(publisher: Domoticz) -> Self {
        Self {
            publisher,
            previous_consumption_date: None,
        }
    }

    /// Run one polling cycle against a fresh snapshot.
    pub async fn run_cycle(&mut self, snapshot: &ConsumptionSnapshot) -> Result<(), BridgeError> {
        self.run_cycle_at(snapshot, Local::now().date_naive()).await
    }

    async fn run_cycle_at(
        &mut self,
        snapshot: &ConsumptionSnapshot,
        today: NaiveDate,
    ) -> Result<(), BridgeError> {
        let read_date = snapshot.day_readat.date_naive();
        let context = ConsumptionContext {
            total_consumption: snapshot.total_consumption,
            previous_consumption_date: self.previous_consumption_date,
            gas_consumption: Some(GasConsumption {
                day_readat: snapshot.day_readat,
                day: snapshot.day.clone(),
            }),
        };

        match self.previous_consumption_date {
            Some(previous) if previous != read_date => {
                info!(
                    "Reading date moved {} -> {}, replaying daily history",
                    previous, read_date
                );
                let previous_day_final = snapshot.day.get(1).copied().unwrap_or(0);
                let current_day = snapshot.day.first().copied().unwrap_or(0);
                self.reconcile_midnight(
                    &context,
                    previous_day_final,
                    0,
                    current_day,
                    snapshot.total_consumption,
                    today,
                )
                .await?;
            }
            _ => {
                self.publisher
                    .update_current_total(snapshot.total_consumption)
                    .await;
            }
        }

        self.previous_consumption_date = Some(read_date);
        Ok(())
    }

    /// Replay the daily window after the sampling boundary crossed midnight.
    ///
    /// Publishes the new cumulative total first, then rebuilds and
    /// republishes the full series: the window's historical deltas may have
    /// shifted, so every day is reprocessed, not only the boundary day.
    /// Fails fast, issuing no writes, if the context lacks the previous
    /// reading date or the daily window.
    pub async fn reconcile_midnight(
        &self,
        context: &ConsumptionContext,
        previous_day_new_value: u64,
        offset_previous_day: u64,
        current_day_value: u64,
        total_counter: u64,
        today: NaiveDate,
    ) -> Result<(), BridgeError> {
        debug!(
            previous_day_new_value,
            offset_previous_day, current_day_value, total_counter, "Handling midnight rollover"
        );

        if context.previous_consumption_date.is_none() {
            return Err(BridgeError::MissingContext);
        }
        let gas = context
            .gas_consumption
            .as_ref()
            .ok_or(BridgeError::MissingContext)?;

        self.publisher.update_current_total(total_counter).await;

        let series = daily_series(gas, context.total_consumption);
        debug!("Daily series: {:?}", series);
        self.publisher.update_daily_history(&series, today).await;

        info!("Midnight rollover reconciled");
        Ok(())
    }
}
