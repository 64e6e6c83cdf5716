//! Run settings.
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. a JSON config file (`config.json` layout: `fred_api_key`, `data_sources`,
//!    `default_settings`, `fetch`, `synthetic`)
//! 3. `FRED_API_KEY` from the environment / `.env` (via `dotenvy`)
//! 4. CLI flags (applied by `app`)

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::app::pipeline::CoveragePolicy;
use crate::data::GeneratorConfig;
use crate::data::fred::is_usable_key;
use crate::domain::{DateRange, Frequency, Maturity, SourcePreference, normalize_keys, parse_date};
use crate::error::{AppError, PipelineError};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub fred_api_key: Option<String>,
    pub start_date: NaiveDate,
    /// `None` means "today".
    pub end_date: Option<NaiveDate>,
    pub source: SourcePreference,
    pub maturities: Vec<Maturity>,
    pub frequency: Frequency,
    pub coverage: CoveragePolicy,
    pub generator: GeneratorConfig,
    pub fetch_workers: usize,
    pub fetch_timeout_secs: u64,
    pub animation_speed_ms: u64,
    pub max_trails: usize,
    pub fade_trails: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fred_api_key: None,
            start_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            end_date: None,
            source: SourcePreference::Remote,
            maturities: Maturity::ALL.to_vec(),
            frequency: Frequency::Monthly,
            coverage: CoveragePolicy::default(),
            generator: GeneratorConfig::default(),
            fetch_workers: 4,
            fetch_timeout_secs: 30,
            animation_speed_ms: 200,
            max_trails: 20,
            fade_trails: true,
        }
    }
}

impl Settings {
    /// Defaults, then the config file (explicit path, or `config.json` if it
    /// exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut settings = Settings::default();

        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };
        if let Some(p) = candidate {
            let file = ConfigFile::read(&p)?;
            settings.apply_file(file)?;
            log::info!("Loaded settings from {}", p.display());
        }

        dotenvy::dotenv().ok();
        if let Ok(key) = std::env::var("FRED_API_KEY") {
            settings.set_api_key(key);
        }

        Ok(settings)
    }

    pub fn set_api_key(&mut self, key: String) {
        if is_usable_key(&key) {
            self.fred_api_key = Some(key.trim().to_string());
        }
    }

    /// Resolve the configured window, using `today` for an open end.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, PipelineError> {
        DateRange::validated(self.start_date, self.end_date.unwrap_or(today))
    }

    pub fn apply_file(&mut self, file: ConfigFile) -> Result<(), AppError> {
        let sources = file.data_sources.unwrap_or_default();
        let defaults = file.default_settings.unwrap_or_default();
        let fetch = file.fetch.unwrap_or_default();
        let synthetic = file.synthetic.unwrap_or_default();

        if let Some(key) = file.fred_api_key.or(sources.fred_api_key) {
            self.set_api_key(key);
        }
        if let Some(primary) = sources.primary {
            self.source = primary;
        }
        if let Some(min) = sources.min_series {
            self.coverage = CoveragePolicy::new(min);
        }

        if let Some(start) = defaults.start_date {
            self.start_date = parse_date(&start)?;
        }
        if let Some(end) = defaults.end_date {
            self.end_date = Some(parse_date(&end)?);
        }
        if let Some(keys) = defaults.maturities {
            let keys = normalize_keys(&keys)?;
            if keys.is_empty() {
                return Err(AppError::new(2, "Config lists no maturities."));
            }
            self.maturities = keys;
        }
        if let Some(freq) = defaults.frequency {
            self.frequency = freq;
        }
        if let Some(speed) = defaults.animation_speed {
            self.animation_speed_ms = speed;
        }
        if let Some(n) = defaults.max_trails {
            self.max_trails = n;
        }
        if let Some(fade) = defaults.fade_trails {
            self.fade_trails = fade;
        }

        if let Some(workers) = fetch.workers {
            self.fetch_workers = workers.max(1);
        }
        if let Some(secs) = fetch.timeout_secs {
            self.fetch_timeout_secs = secs.max(1);
        }

        if let Some(seed) = synthetic.seed.or(defaults.seed) {
            self.generator.seed = seed;
        }
        if let Some(noise) = synthetic.noise_sd {
            if !(noise.is_finite() && noise >= 0.0) {
                return Err(AppError::new(2, "synthetic.noise_sd must be a non-negative number."));
            }
            self.generator.noise_sd = noise;
        }
        for (key, rate) in synthetic.base_rates.unwrap_or_default() {
            let maturity = key.parse::<Maturity>()?;
            if !rate.is_finite() {
                return Err(AppError::new(2, format!("Invalid base rate for {maturity}.")));
            }
            self.generator.base_rates.insert(maturity, rate);
        }

        Ok(())
    }
}

/// On-disk config document. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub fred_api_key: Option<String>,
    pub data_sources: Option<DataSourcesSection>,
    pub default_settings: Option<DefaultSettingsSection>,
    pub fetch: Option<FetchSection>,
    pub synthetic: Option<SyntheticSection>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(2, format!("Failed to open config '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self, AppError> {
        serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid config: {e}")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DataSourcesSection {
    pub primary: Option<SourcePreference>,
    pub fred_api_key: Option<String>,
    pub min_series: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultSettingsSection {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub maturities: Option<Vec<String>>,
    pub frequency: Option<Frequency>,
    pub animation_speed: Option<u64>,
    pub max_trails: Option<usize>,
    pub fade_trails: Option<bool>,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchSection {
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyntheticSection {
    pub seed: Option<u64>,
    pub noise_sd: Option<f64>,
    pub base_rates: Option<BTreeMap<String, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_config_layout_is_understood() {
        let file = ConfigFile::from_json(
            r#"{
                "fred_api_key": "abc123",
                "data_sources": { "primary": "FRED", "min_series": 3 },
                "default_settings": {
                    "start_date": "2000-01-01",
                    "animation_speed": 100,
                    "max_trails": 10,
                    "fade_trails": false
                }
            }"#,
        )
        .unwrap();
        let mut s = Settings::default();
        s.apply_file(file).unwrap();

        assert_eq!(s.fred_api_key.as_deref(), Some("abc123"));
        assert_eq!(s.source, SourcePreference::Remote);
        assert_eq!(s.coverage.min_series, 3);
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(s.animation_speed_ms, 100);
        assert_eq!(s.max_trails, 10);
        assert!(!s.fade_trails);
    }

    #[test]
    fn placeholder_key_and_sample_source() {
        let file = ConfigFile::from_json(
            r#"{
                "data_sources": {
                    "primary": "sample_data",
                    "fred_api_key": "YOUR_FRED_API_KEY_HERE"
                }
            }"#,
        )
        .unwrap();
        let mut s = Settings::default();
        s.apply_file(file).unwrap();
        assert_eq!(s.fred_api_key, None);
        assert_eq!(s.source, SourcePreference::Synthetic);
    }

    #[test]
    fn synthetic_overrides_and_bad_keys() {
        let file = ConfigFile::from_json(
            r#"{ "synthetic": { "seed": 9, "base_rates": { "10yr": 4.25 } } }"#,
        )
        .unwrap();
        let mut s = Settings::default();
        s.apply_file(file).unwrap();
        assert_eq!(s.generator.seed, 9);
        assert_eq!(s.generator.base_rate(Maturity::Y10), 4.25);

        let bad = ConfigFile::from_json(r#"{ "default_settings": { "maturities": ["10yr", "11yr"] } }"#)
            .unwrap();
        let err = Settings::default().apply_file(bad).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn open_end_resolves_to_today() {
        let s = Settings::default();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let range = s.date_range(today).unwrap();
        assert_eq!(range.end, today);

        let inverted = Settings {
            start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            ..Settings::default()
        };
        assert!(inverted.date_range(today).is_err());
    }
}
