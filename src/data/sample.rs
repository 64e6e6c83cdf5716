//! Synthetic Treasury yield generation.
//!
//! `rate(t) = base_rate(m) + trend(t) + cycle(t) + noise(t)`, floored at a small
//! positive value. Trend and cycle depend on the absolute date and the noise
//! stream is seeded per `(seed, date)`, so any value is a pure function of
//! `(config, maturity, date)`. Generating a sub-range therefore reproduces the
//! matching rows of a larger table exactly.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DateRange, Frequency, Maturity, ObservationRow, YieldTable};

/// Base level used for a maturity missing from `base_rates`.
const DEFAULT_BASE_RATE: f64 = 3.0;

const DAYS_PER_YEAR: f64 = 365.25;

/// Knobs of the synthetic model. The seed is explicit; nothing global.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Upward-sloping baseline level (percent) per maturity.
    pub base_rates: BTreeMap<Maturity, f64>,
    /// Date at which the linear trend reaches zero.
    pub trend_anchor: NaiveDate,
    /// Trend slope in points per year before the anchor.
    pub trend_per_year: f64,
    pub cycle_origin: NaiveDate,
    pub cycle_amplitude: f64,
    pub cycle_period_years: f64,
    pub noise_sd: f64,
    pub floor: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            base_rates: default_base_rates(),
            trend_anchor: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or_default(),
            // 1.5 points spread over 1990-01..2025-06.
            trend_per_year: 1.5 / 35.5,
            cycle_origin: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            cycle_amplitude: 1.0,
            // Three full cycles over the same window.
            cycle_period_years: 35.5 / 3.0,
            noise_sd: 0.2,
            floor: 0.01,
        }
    }
}

pub fn default_base_rates() -> BTreeMap<Maturity, f64> {
    use Maturity::*;
    BTreeMap::from([
        (M1, 1.5),
        (M3, 2.0),
        (M6, 2.2),
        (Y1, 2.5),
        (Y2, 2.8),
        (Y3, 3.0),
        (Y5, 3.2),
        (Y7, 3.4),
        (Y10, 3.5),
        (Y20, 3.7),
        (Y30, 3.8),
    ])
}

impl GeneratorConfig {
    pub fn base_rate(&self, maturity: Maturity) -> f64 {
        self.base_rates
            .get(&maturity)
            .copied()
            .unwrap_or(DEFAULT_BASE_RATE)
    }

    fn trend(&self, date: NaiveDate) -> f64 {
        self.trend_per_year * years_between(date, self.trend_anchor)
    }

    fn cycle(&self, date: NaiveDate) -> f64 {
        if self.cycle_period_years <= 0.0 {
            return 0.0;
        }
        let phase = 2.0 * PI * years_between(self.cycle_origin, date) / self.cycle_period_years;
        self.cycle_amplitude * phase.sin()
    }

    /// Loose upper bound for any value generated in `range`.
    pub fn upper_bound(&self, maturity: Maturity, range: DateRange) -> f64 {
        let trend = self.trend(range.start).max(self.trend(range.end));
        self.base_rate(maturity) + trend + self.cycle_amplitude.abs() + 6.0 * self.noise_sd
    }
}

/// Generate a synthetic table for `keys` over `[start, end]`.
///
/// `start > end` yields an empty table that still carries the requested columns.
pub fn generate(
    keys: &[Maturity],
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
    config: &GeneratorConfig,
) -> YieldTable {
    let mut columns = keys.to_vec();
    columns.sort();
    columns.dedup();

    let mut table = YieldTable::empty(columns, DateRange { start, end }, frequency, true);
    for date in frequency.grid(start, end) {
        let noise = noise_draws(config, date);
        let values = table
            .columns
            .iter()
            .map(|&m| Some(rate_with_noise(config, m, date, noise[m.index()])))
            .collect();
        table.rows.push(ObservationRow { date, values });
    }
    table
}

/// The generated yield for one maturity on one date.
pub fn rate_at(config: &GeneratorConfig, maturity: Maturity, date: NaiveDate) -> f64 {
    let noise = noise_draws(config, date);
    rate_with_noise(config, maturity, date, noise[maturity.index()])
}

fn rate_with_noise(config: &GeneratorConfig, maturity: Maturity, date: NaiveDate, noise: f64) -> f64 {
    let rate = config.base_rate(maturity) + config.trend(date) + config.cycle(date) + noise;
    if rate.is_finite() {
        rate.max(config.floor)
    } else {
        config.floor
    }
}

/// One normal draw per registered maturity (registry order) for `date`.
fn noise_draws(config: &GeneratorConfig, date: NaiveDate) -> [f64; Maturity::COUNT] {
    let mut draws = [0.0; Maturity::COUNT];
    let Ok(normal) = Normal::new(0.0, config.noise_sd.abs()) else {
        return draws;
    };
    let mut rng = StdRng::seed_from_u64(date_seed(config.seed, date));
    for slot in &mut draws {
        *slot = normal.sample(&mut rng);
    }
    draws
}

/// Per-date RNG seed: SplitMix64 finalizer over `seed ^ day number`.
///
/// Fixed arithmetic, so seeds do not shift between toolchains the way
/// `std` hasher output may.
fn date_seed(seed: u64, date: NaiveDate) -> u64 {
    let day = i64::from(date.num_days_from_ce()) as u64;
    let mut z = (seed ^ day).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}
