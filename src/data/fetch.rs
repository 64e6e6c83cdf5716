//! Single-maturity remote fetch with per-series normalization.
//!
//! A failure here is always folded into a `FetchOutcome`; the batch carries on.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::provider::{RawSeries, SeriesProvider};
use crate::domain::{DateRange, FetchOutcome, Frequency, Maturity};
use crate::error::ProviderError;

/// One maturity's normalized series plus the outcome that describes it.
#[derive(Debug, Clone)]
pub struct FetchedSeries {
    pub outcome: FetchOutcome,
    pub series: RawSeries,
}

/// Fetch one maturity from `provider` and resample it to `frequency`.
pub fn fetch(
    provider: &dyn SeriesProvider,
    maturity: Maturity,
    range: DateRange,
    frequency: Frequency,
) -> FetchedSeries {
    let series_id = maturity.series_id();
    log::info!(
        "Fetching {} yields ({series_id}) from {}",
        maturity.display_name(),
        provider.name()
    );

    match provider.get_series(series_id, range.start, range.end) {
        Ok(raw) => {
            let series = resample_last(raw, frequency);
            if series.is_empty() {
                log::warn!("No data available for {} ({series_id})", maturity.display_name());
            } else {
                log::info!("{}: {} data points", maturity.display_name(), series.len());
            }
            FetchedSeries {
                outcome: FetchOutcome {
                    maturity,
                    succeeded: !series.is_empty(),
                    observation_count: series.len(),
                    error_message: None,
                },
                series,
            }
        }
        Err(err) => {
            log::warn!("Error fetching {} ({series_id}): {err}", maturity.display_name());
            FetchedSeries {
                outcome: FetchOutcome {
                    maturity,
                    succeeded: false,
                    observation_count: 0,
                    error_message: Some(err.to_string()),
                },
                series: Vec::new(),
            }
        }
    }
}

/// Latest raw observation per maturity, for connection checks.
///
/// Unlike `fetch`, no resampling is applied: the value reported is the most
/// recent daily print the provider returned.
pub fn probe(
    provider: &dyn SeriesProvider,
    maturities: &[Maturity],
    range: DateRange,
) -> Vec<(Maturity, Result<Option<(NaiveDate, f64)>, ProviderError>)> {
    maturities
        .iter()
        .map(|&m| {
            let latest = provider
                .get_series(m.series_id(), range.start, range.end)
                .map(|raw| {
                    raw.into_iter()
                        .filter(|(_, v)| v.is_finite())
                        .max_by_key(|&(date, _)| date)
                });
            if let Err(err) = &latest {
                log::warn!("Probe of {} failed: {err}", m.series_id());
            }
            (m, latest)
        })
        .collect()
}

/// Resample to `frequency` by taking the last observation in each period.
///
/// Periods between the first and last observed period that have no data take
/// the previous period's value. Non-finite values are dropped first. Output is
/// sorted ascending and labelled by period start.
pub fn resample_last(raw: RawSeries, frequency: Frequency) -> RawSeries {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in raw {
        if value.is_finite() {
            by_date.insert(date, value);
        }
    }

    // BTreeMap iterates in date order, so the last insert per period wins.
    let mut by_period: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, value) in by_date {
        by_period.insert(frequency.period_start(date), value);
    }

    let (Some(&first), Some(&last)) = (by_period.keys().next(), by_period.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(by_period.len());
    let mut carried = None;
    for period in frequency.grid(first, last) {
        if let Some(&v) = by_period.get(&period) {
            carried = Some(v);
        }
        if let Some(v) = carried {
            out.push((period, v));
        }
    }
    out
}
