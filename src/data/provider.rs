//! Series provider abstraction.
//!
//! The pipeline only needs "give me series `id` between two dates". Keeping it
//! behind a trait lets tests swap FRED for an in-memory stub.

use chrono::NaiveDate;

use crate::error::ProviderError;

/// A raw date-indexed series as returned by a provider (any order, any gaps).
pub type RawSeries = Vec<(NaiveDate, f64)>;

pub trait SeriesProvider: Send + Sync {
    /// Human-readable name used in logs and status lines.
    fn name(&self) -> &str;

    /// Fetch observations for `series_id` with `start <= date <= end`.
    ///
    /// An empty vector means the provider has no data for the window; that is
    /// not an error.
    fn get_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, ProviderError>;
}
