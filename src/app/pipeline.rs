//! Shared data-assembly pipeline used by the CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! choose source -> fetch or generate -> coverage check -> align -> drop empty
//! rows -> forward fill -> sort.
//!
//! The front-ends then only deal with presentation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::config::Settings;
use crate::data::{FetchedSeries, FredClient, GeneratorConfig, SeriesProvider, fetch, generate};
use crate::domain::{
    DateRange, FetchOutcome, Frequency, Maturity, ObservationRow, SourcePreference, YieldTable,
    normalize_keys,
};
use crate::error::PipelineError;

/// How many remote series must succeed before a batch counts as real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveragePolicy {
    pub min_series: usize,
}

impl Default for CoveragePolicy {
    fn default() -> Self {
        Self { min_series: 5 }
    }
}

impl CoveragePolicy {
    pub fn new(min_series: usize) -> Self {
        Self { min_series }
    }

    /// Effective requirement for a request of `requested` series.
    ///
    /// Capped at the request size so small requests can still be real; never
    /// below one.
    pub fn required(&self, requested: usize) -> usize {
        self.min_series.min(requested).max(1)
    }
}

/// Why the pipeline returned synthetic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    PreferredSynthetic,
    RemoteUnavailable,
    InsufficientCoverage { succeeded: usize, required: usize },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::PreferredSynthetic => write!(f, "synthetic data requested"),
            FallbackReason::RemoteUnavailable => write!(f, "no FRED API key configured"),
            FallbackReason::InsufficientCoverage { succeeded, required } => write!(
                f,
                "only {succeeded} series loaded from FRED (need {required})"
            ),
        }
    }
}

/// Result of one pipeline call.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub table: YieldTable,
    /// One outcome per requested maturity when a remote fetch was attempted.
    pub outcomes: Vec<FetchOutcome>,
    pub fallback: Option<FallbackReason>,
}

pub struct Pipeline {
    provider: Option<Box<dyn SeriesProvider>>,
    coverage: CoveragePolicy,
    generator: GeneratorConfig,
    frequency: Frequency,
    fetch_workers: usize,
}

impl Pipeline {
    pub fn new(provider: Option<Box<dyn SeriesProvider>>, settings: &Settings) -> Self {
        Self {
            provider,
            coverage: settings.coverage,
            generator: settings.generator.clone(),
            frequency: settings.frequency,
            fetch_workers: settings.fetch_workers.max(1),
        }
    }

    /// Build a pipeline with a FRED client when an API key is configured.
    pub fn from_settings(settings: &Settings) -> Self {
        let provider: Option<Box<dyn SeriesProvider>> = match &settings.fred_api_key {
            Some(key) => match FredClient::new(key.clone(), settings.fetch_timeout_secs) {
                Ok(client) => Some(Box::new(client)),
                Err(err) => {
                    log::warn!("FRED client unavailable: {err}");
                    None
                }
            },
            None => None,
        };
        Self::new(provider, settings)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }

    /// Assemble a table for `keys` over `range`.
    ///
    /// Network and provider failures never surface here; they degrade to
    /// synthetic data. Only bad input (unknown key, inverted range, no keys)
    /// is an error.
    pub fn assemble<S: AsRef<str>>(
        &self,
        keys: &[S],
        range: DateRange,
        preference: SourcePreference,
    ) -> Result<Assembly, PipelineError> {
        let keys = normalize_keys(keys)?;
        self.assemble_maturities(&keys, range, preference)
    }

    pub fn assemble_table<S: AsRef<str>>(
        &self,
        keys: &[S],
        range: DateRange,
        preference: SourcePreference,
    ) -> Result<YieldTable, PipelineError> {
        self.assemble(keys, range, preference).map(|a| a.table)
    }

    pub fn assemble_maturities(
        &self,
        keys: &[Maturity],
        range: DateRange,
        preference: SourcePreference,
    ) -> Result<Assembly, PipelineError> {
        let range = DateRange::validated(range.start, range.end)?;
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Err(PipelineError::NoMaturities);
        }

        let provider = match (preference, &self.provider) {
            (SourcePreference::Remote, Some(provider)) => provider.as_ref(),
            (SourcePreference::Remote, None) => {
                log::warn!("FRED API key not provided. Using sample data instead.");
                return Ok(self.synthetic(&keys, range, Vec::new(), FallbackReason::RemoteUnavailable));
            }
            (SourcePreference::Synthetic, _) => {
                return Ok(self.synthetic(&keys, range, Vec::new(), FallbackReason::PreferredSynthetic));
            }
        };

        log::info!("Fetching real yield curve data from {}...", provider.name());
        let fetched = self.fetch_all(provider, &keys, range);
        let outcomes: Vec<FetchOutcome> = fetched.iter().map(|f| f.outcome.clone()).collect();

        let succeeded = outcomes.iter().filter(|o| o.has_coverage()).count();
        let required = self.coverage.required(keys.len());
        if succeeded < required {
            log::warn!("Only {succeeded}/{} series loaded (need {required}). Using sample data instead.", keys.len());
            let reason = FallbackReason::InsufficientCoverage { succeeded, required };
            return Ok(self.synthetic(&keys, range, outcomes, reason));
        }

        let table = align(&keys, &fetched, range, self.frequency, self.generator.floor);
        log::info!(
            "Loaded REAL yield curve data: {} observations ({} to {})",
            table.len(),
            table.first_date().map(|d| d.to_string()).unwrap_or_default(),
            table.last_date().map(|d| d.to_string()).unwrap_or_default(),
        );
        Ok(Assembly {
            table,
            outcomes,
            fallback: None,
        })
    }

    /// Fetch every key on a bounded worker pool.
    ///
    /// `collect` on an indexed parallel iterator keeps input order, so the
    /// result is ordered by maturity whatever order the requests finish in.
    fn fetch_all(&self, provider: &dyn SeriesProvider, keys: &[Maturity], range: DateRange) -> Vec<FetchedSeries> {
        let frequency = self.frequency;
        let fetch_one = |&m: &Maturity| fetch(provider, m, range, frequency);

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.fetch_workers.min(keys.len()).max(1))
            .build()
        {
            Ok(pool) => pool.install(|| keys.par_iter().map(fetch_one).collect()),
            Err(err) => {
                log::warn!("Fetch pool unavailable ({err}); fetching sequentially");
                keys.iter().map(fetch_one).collect()
            }
        }
    }

    fn synthetic(
        &self,
        keys: &[Maturity],
        range: DateRange,
        outcomes: Vec<FetchOutcome>,
        reason: FallbackReason,
    ) -> Assembly {
        let mut table = generate(keys, range.start, range.end, self.frequency, &self.generator);
        table.sort_by_date();
        log::info!("Generated sample yield curve data: {} observations", table.len());
        Assembly {
            table,
            outcomes,
            fallback: Some(reason),
        }
    }
}

/// Outer-join per-maturity series on date into one table.
///
/// Only period labels inside `range` are kept, so a real table covers the same
/// grid a generated one would; the partial period before a mid-period start is
/// dropped. Values are floored at `floor` (FRED prints `0.00` for bills), rows
/// where every column is absent are dropped, remaining gaps are forward filled
/// column-wise, and rows are sorted ascending.
pub fn align(
    columns: &[Maturity],
    fetched: &[FetchedSeries],
    range: DateRange,
    frequency: Frequency,
    floor: f64,
) -> YieldTable {
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (col, maturity) in columns.iter().enumerate() {
        let Some(series) = fetched.iter().find(|f| f.outcome.maturity == *maturity) else {
            continue;
        };
        for &(date, value) in series.series.iter().filter(|(date, _)| range.contains(*date)) {
            let row = by_date
                .entry(date)
                .or_insert_with(|| vec![None; columns.len()]);
            row[col] = Some(value.max(floor));
        }
    }

    let mut table = YieldTable::empty(columns.to_vec(), range, frequency, false);
    table.rows = by_date
        .into_iter()
        .map(|(date, values)| ObservationRow { date, values })
        .collect();
    table.drop_empty_rows();
    table.forward_fill();
    table.sort_by_date();
    table
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::data::RawSeries;
    use crate::error::ProviderError;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// In-memory provider keyed by series id. Unknown ids fail with a transport error.
    struct StubProvider {
        series: HashMap<&'static str, RawSeries>,
        delays_ms: HashMap<&'static str, u64>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
                delays_ms: HashMap::new(),
            }
        }

        fn with(mut self, m: Maturity, data: RawSeries) -> Self {
            self.series.insert(m.series_id(), data);
            self
        }

        fn delayed(mut self, m: Maturity, ms: u64) -> Self {
            self.delays_ms.insert(m.series_id(), ms);
            self
        }
    }

    impl SeriesProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn get_series(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<RawSeries, ProviderError> {
            if let Some(ms) = self.delays_ms.get(id) {
                std::thread::sleep(Duration::from_millis(*ms));
            }
            match self.series.get(id) {
                Some(data) => Ok(data
                    .iter()
                    .copied()
                    .filter(|(date, _)| start <= *date && *date <= end)
                    .collect()),
                None => Err(ProviderError::Transport(format!("connection refused for {id}"))),
            }
        }
    }

    /// Business-day-ish observations in each month of the first half of 2020.
    fn h1_2020(level: f64) -> RawSeries {
        (1..=6)
            .flat_map(|m| [(d(2020, m, 2), level), (d(2020, m, 20), level + m as f64 * 0.01)])
            .collect()
    }

    fn pipeline(provider: Option<StubProvider>) -> Pipeline {
        let provider = provider.map(|p| Box::new(p) as Box<dyn SeriesProvider>);
        Pipeline::new(provider, &Settings::default())
    }

    const SIX: [&str; 6] = ["1yr", "5yr", "10yr", "30yr", "2yr", "3yr"];

    fn h1_range() -> DateRange {
        DateRange::parse("2020-01-01", "2020-06-01").unwrap()
    }

    #[test]
    fn two_of_six_falls_back_to_synthetic() {
        let provider = StubProvider::new()
            .with(Maturity::Y1, h1_2020(1.5))
            .with(Maturity::Y10, h1_2020(1.8));
        let p = pipeline(Some(provider));

        let got = p.assemble(&SIX, h1_range(), SourcePreference::Remote).unwrap();
        let t = &got.table;
        assert!(t.is_synthetic);
        assert_eq!(
            got.fallback,
            Some(FallbackReason::InsufficientCoverage { succeeded: 2, required: 5 })
        );
        assert_eq!(got.outcomes.len(), 6);
        assert_eq!(
            t.columns,
            vec![Maturity::Y1, Maturity::Y2, Maturity::Y3, Maturity::Y5, Maturity::Y10, Maturity::Y30]
        );
        assert_eq!(
            t.dates(),
            vec![d(2020, 1, 1), d(2020, 2, 1), d(2020, 3, 1), d(2020, 4, 1), d(2020, 5, 1), d(2020, 6, 1)]
        );

        // Entirely generated: identical to the generator's own output.
        let expected = generate(&t.columns, h1_range().start, h1_range().end, Frequency::Monthly, p.generator());
        assert_eq!(t.rows, expected.rows);

        for (col, &m) in t.columns.iter().enumerate() {
            let upper = p.generator().upper_bound(m, h1_range());
            for row in &t.rows {
                let v = row.values[col].unwrap();
                assert!(v > 0.0 && v <= upper, "{m}: {v} outside (0, {upper}]");
            }
        }
    }

    #[test]
    fn five_of_six_is_real_with_one_empty_column() {
        let provider = StubProvider::new()
            .with(Maturity::Y1, h1_2020(1.5))
            .with(Maturity::Y2, h1_2020(1.6))
            .with(Maturity::Y3, h1_2020(1.65))
            .with(Maturity::Y5, h1_2020(1.7))
            .with(Maturity::Y10, h1_2020(1.8));
        let p = pipeline(Some(provider));

        let got = p.assemble(&SIX, h1_range(), SourcePreference::Remote).unwrap();
        let t = &got.table;
        assert!(!t.is_synthetic);
        assert_eq!(got.fallback, None);
        assert_eq!(t.columns.len(), 6);

        let failed = got.outcomes.iter().find(|o| o.maturity == Maturity::Y30).unwrap();
        assert!(!failed.succeeded);
        assert!(failed.error_message.as_deref().unwrap().contains("DGS30"));

        assert!(t.column(Maturity::Y30).iter().all(Option::is_none));
        for m in [Maturity::Y1, Maturity::Y2, Maturity::Y3, Maturity::Y5, Maturity::Y10] {
            assert!(t.column(m).iter().all(Option::is_some), "{m} should be populated");
        }
        // Last observation per month. The window ends on 2020-06-01, before
        // any June observation.
        assert_eq!(t.value(0, Maturity::Y10), Some(1.8 + 0.01));
        assert_eq!(t.last_date(), Some(d(2020, 5, 1)));
    }

    #[test]
    fn zero_prints_are_floored_on_the_real_path() {
        let zeros: RawSeries = (1..=6).map(|m| (d(2020, m, 15), 0.0)).collect();
        let mut provider = StubProvider::new();
        for m in [Maturity::M1, Maturity::M3, Maturity::M6, Maturity::Y1, Maturity::Y2] {
            provider = provider.with(m, zeros.clone());
        }
        let p = pipeline(Some(provider));

        let t = p
            .assemble_table(&["1mo", "3mo", "6mo", "1yr", "2yr"], h1_range(), SourcePreference::Remote)
            .unwrap();
        assert!(!t.is_synthetic);
        let floor = p.generator().floor;
        assert_eq!(t.value_range(), Some((floor, floor)));
        assert!(t.rows.iter().flat_map(|r| r.values.iter().flatten()).all(|&v| v > 0.0));
    }

    #[test]
    fn mid_month_start_matches_synthetic_dates() {
        let flat: RawSeries = (1..=3)
            .flat_map(|m| [(d(2020, m, 3), 1.5), (d(2020, m, 16), 1.6), (d(2020, m, 27), 1.7)])
            .collect();
        let mut provider = StubProvider::new();
        for m in [Maturity::Y1, Maturity::Y2, Maturity::Y5, Maturity::Y10, Maturity::Y30] {
            provider = provider.with(m, flat.clone());
        }
        let p = pipeline(Some(provider));
        let keys = ["1yr", "2yr", "5yr", "10yr", "30yr"];
        let range = DateRange::parse("2020-01-15", "2020-03-31").unwrap();

        let real = p.assemble_table(&keys, range, SourcePreference::Remote).unwrap();
        let synthetic = p.assemble_table(&keys, range, SourcePreference::Synthetic).unwrap();
        assert!(!real.is_synthetic);
        assert_eq!(real.dates(), vec![d(2020, 2, 1), d(2020, 3, 1)]);
        assert_eq!(real.dates(), synthetic.dates());
        assert!(real.dates().iter().all(|&date| range.contains(date)));
        assert_eq!(real.value(0, Maturity::Y10), Some(1.7));
    }

    #[test]
    fn gaps_are_forward_filled_and_empty_rows_dropped() {
        let provider = StubProvider::new()
            .with(Maturity::Y1, vec![(d(2020, 1, 10), 1.0), (d(2020, 3, 10), 3.0)])
            .with(Maturity::Y2, vec![(d(2020, 2, 10), 2.0)]);
        let settings = Settings {
            coverage: CoveragePolicy::new(2),
            ..Settings::default()
        };
        let p = Pipeline::new(Some(Box::new(provider)), &settings);

        let range = DateRange::parse("2020-01-01", "2020-04-30").unwrap();
        let t = p
            .assemble_table(&["1yr", "2yr"], range, SourcePreference::Remote)
            .unwrap();
        assert!(!t.is_synthetic);
        assert_eq!(t.dates(), vec![d(2020, 1, 1), d(2020, 2, 1), d(2020, 3, 1)]);
        assert_eq!(t.column(Maturity::Y1), vec![Some(1.0), Some(1.0), Some(3.0)]);
        assert_eq!(t.column(Maturity::Y2), vec![None, Some(2.0), Some(2.0)]);
    }

    #[test]
    fn unsorted_provider_output_is_sorted() {
        let mut data = h1_2020(2.0);
        data.reverse();
        let provider = StubProvider::new().with(Maturity::Y5, data);
        let settings = Settings {
            coverage: CoveragePolicy::new(1),
            ..Settings::default()
        };
        let p = Pipeline::new(Some(Box::new(provider)), &settings);
        let range = DateRange::parse("2020-01-01", "2020-06-30").unwrap();
        let t = p.assemble_table(&["5yr"], range, SourcePreference::Remote).unwrap();
        let dates = t.dates();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dates.len(), 6);
    }

    #[test]
    fn outcomes_follow_key_order_not_completion_order() {
        let mut provider = StubProvider::new();
        for (i, m) in Maturity::ALL.iter().enumerate() {
            provider = provider
                .with(*m, h1_2020(1.0 + i as f64 * 0.1))
                .delayed(*m, (Maturity::ALL.len() - i) as u64 * 3);
        }
        let p = pipeline(Some(provider));
        let got = p
            .assemble(&Maturity::ALL.map(|m| m.key()), h1_range(), SourcePreference::Remote)
            .unwrap();
        let order: Vec<Maturity> = got.outcomes.iter().map(|o| o.maturity).collect();
        assert_eq!(order, Maturity::ALL.to_vec());
        assert_eq!(got.table.columns, Maturity::ALL.to_vec());
    }

    #[test]
    fn no_provider_or_synthetic_preference_generates() {
        let p = pipeline(None);
        let got = p.assemble(&["10yr"], h1_range(), SourcePreference::Remote).unwrap();
        assert!(got.table.is_synthetic);
        assert_eq!(got.fallback, Some(FallbackReason::RemoteUnavailable));
        assert!(got.outcomes.is_empty());

        let p = pipeline(Some(StubProvider::new().with(Maturity::Y10, h1_2020(1.0))));
        let got = p.assemble(&["10yr"], h1_range(), SourcePreference::Synthetic).unwrap();
        assert!(got.table.is_synthetic);
        assert_eq!(got.fallback, Some(FallbackReason::PreferredSynthetic));
    }

    #[test]
    fn single_day_range() {
        let p = pipeline(None);
        let on_grid = DateRange::parse("2020-03-01", "2020-03-01").unwrap();
        let t = p.assemble_table(&["2yr"], on_grid, SourcePreference::Synthetic).unwrap();
        assert_eq!(t.len(), 1);

        let off_grid = DateRange::parse("2020-03-02", "2020-03-02").unwrap();
        let t = p.assemble_table(&["2yr"], off_grid, SourcePreference::Synthetic).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.columns, vec![Maturity::Y2]);
    }

    #[test]
    fn bad_input_is_rejected() {
        let p = pipeline(None);
        let inverted = DateRange { start: d(2020, 6, 1), end: d(2020, 1, 1) };
        assert!(matches!(
            p.assemble(&["2yr"], inverted, SourcePreference::Synthetic),
            Err(PipelineError::InvalidRange(_))
        ));
        assert!(matches!(
            p.assemble(&["2yr", "4yr"], h1_range(), SourcePreference::Synthetic),
            Err(PipelineError::UnknownMaturity(k)) if k == "4yr"
        ));
        let none: [&str; 0] = [];
        assert_eq!(
            p.assemble(&none, h1_range(), SourcePreference::Synthetic).unwrap_err(),
            PipelineError::NoMaturities
        );
    }

    #[test]
    fn coverage_requirement_is_capped_by_request() {
        let policy = CoveragePolicy::default();
        assert_eq!(policy.required(11), 5);
        assert_eq!(policy.required(3), 3);
        assert_eq!(CoveragePolicy::new(0).required(4), 1);
    }

    fn key_subset() -> impl Strategy<Value = Vec<Maturity>> {
        proptest::sample::subsequence(Maturity::ALL.to_vec(), 1..=Maturity::ALL.len())
    }

    proptest! {
        #[test]
        fn synthetic_tables_are_well_formed(
            keys in key_subset(),
            start_days in 0i64..9_000,
            len_days in 0i64..1_500,
        ) {
            let start = d(1995, 1, 1) + chrono::Duration::days(start_days);
            let end = start + chrono::Duration::days(len_days);
            let range = DateRange::validated(start, end).unwrap();
            let p = pipeline(None);
            let got = p.assemble_maturities(&keys, range, SourcePreference::Synthetic).unwrap();
            let t = got.table;

            prop_assert_eq!(&t.columns, &keys);
            prop_assert!(t.dates().windows(2).all(|w| w[0] < w[1]));
            for row in &t.rows {
                prop_assert_eq!(row.values.len(), keys.len());
                prop_assert!(row.values.iter().all(|v| v.is_some_and(|v| v > 0.0)));
            }
        }

        #[test]
        fn real_tables_never_regress_to_absent(
            present in proptest::collection::vec(proptest::option::of(0.5f64..6.0), 1..40),
        ) {
            let series: RawSeries = present
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (d(2000, 1, 1) + chrono::Duration::days(i as i64 * 31), v)))
                .collect();
            let provider = StubProvider::new()
                .with(Maturity::Y5, series)
                .with(Maturity::Y10, vec![(d(2000, 1, 15), 4.0)]);
            let settings = Settings { coverage: CoveragePolicy::new(1), ..Settings::default() };
            let p = Pipeline::new(Some(Box::new(provider)), &settings);
            let range = DateRange::parse("2000-01-01", "2004-12-31").unwrap();
            let t = p.assemble_table(&["5yr", "10yr"], range, SourcePreference::Remote).unwrap();

            prop_assert!(!t.is_synthetic);
            for col in 0..t.columns.len() {
                let mut seen = false;
                for row in &t.rows {
                    match row.values[col] {
                        Some(_) => seen = true,
                        None => prop_assert!(!seen, "gap after first observation"),
                    }
                }
            }
            prop_assert!(t.rows.iter().all(|r| !r.is_all_absent()));
        }
    }
}
