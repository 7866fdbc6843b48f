//! Client for the heating-cloud snapshot endpoint.
//!
//! The upstream side serves a JSON snapshot with the cumulative total, the
//! timestamp of the last reading, and the backward-indexed daily deltas.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Latest consumption snapshot as served upstream.
///
/// `day[0]` is the delta for `day_readat`'s date; `day[i]` reaches `i` days
/// further back.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumptionSnapshot {
    pub total_consumption: u64,
    pub day_readat: DateTime<Utc>,
    #[serde(default)]
    pub day: Vec<u64>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("snapshot request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct SnapshotClient {
    url: String,
    http: Client,
}

impl SnapshotClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }

    pub async fn fetch(&self) -> Result<ConsumptionSnapshot, UpstreamError> {
        debug!("Fetching consumption snapshot from {}", self.url);
        let snapshot = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<ConsumptionSnapshot>()
            .await?;
        debug!("Snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_parses_snapshot() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/consumption")
            .with_status(200)
            .with_body(
                r#"{
                    "total_consumption": 100,
                    "day_readat": "2024-01-10T21:30:00Z",
                    "day": [10, 20, 5]
                }"#,
            )
            .create_async()
            .await;

        let client = SnapshotClient::new(format!("{}/consumption", server.url()));
        let snapshot = client.fetch().await.unwrap();

        assert_eq!(snapshot.total_consumption, 100);
        assert_eq!(snapshot.day, vec![10, 20, 5]);
        assert_eq!(
            snapshot.day_readat.date_naive(),
            "2024-01-10".parse::<chrono::NaiveDate>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/consumption")
            .with_status(503)
            .create_async()
            .await;

        let client = SnapshotClient::new(format!("{}/consumption", server.url()));
        assert!(client.fetch().await.is_err());
    }
}
