//! FRED API integration for Treasury constant-maturity series (`DGS*`).

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::provider::{RawSeries, SeriesProvider};
use crate::domain::DATE_FORMAT;
use crate::error::ProviderError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100000;

/// Placeholder shipped in the sample config; treated as "no key".
pub const PLACEHOLDER_KEY: &str = "YOUR_FRED_API_KEY_HERE";

pub struct FredClient {
    client: Client,
    api_key: String,
    timeout_secs: u64,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if !is_usable_key(&api_key) {
            return Err(ProviderError::MissingCredential);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            timeout_secs,
        })
    }
}

impl SeriesProvider for FredClient {
    fn name(&self) -> &str {
        "FRED"
    }

    fn get_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, ProviderError> {
        let limit = OBS_LIMIT.to_string();
        let observation_start = start.format(DATE_FORMAT).to_string();
        let observation_end = end.format(DATE_FORMAT).to_string();

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("limit", limit.as_str()),
                ("observation_start", observation_start.as_str()),
                ("observation_end", observation_end.as_str()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(ProviderError::Status(resp.status().as_u16()));
        }

        let body: ObservationsResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::Parse(e.to_string())
            }
        })?;

        parse_observations(body.observations)
    }
}

/// Whether `key` looks like a real credential (non-empty, not the placeholder).
pub fn is_usable_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed != PLACEHOLDER_KEY
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn parse_observations(observations: Vec<Observation>) -> Result<RawSeries, ProviderError> {
    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        // FRED reports holidays/missing days as ".".
        let Some(value) = parse_value(&obs.value) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&obs.date, DATE_FORMAT)
            .map_err(|e| ProviderError::Parse(format!("invalid FRED date '{}': {e}", obs.date)))?;
        out.push((date, value));
    }
    Ok(out)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
