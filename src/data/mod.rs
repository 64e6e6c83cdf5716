//! Data sources: FRED (remote) and the synthetic generator.

pub mod fetch;
pub mod fred;
pub mod provider;
pub mod sample;

pub use fetch::{FetchedSeries, fetch, probe};
pub use fred::FredClient;
pub use provider::{RawSeries, SeriesProvider};
pub use sample::{GeneratorConfig, generate};
