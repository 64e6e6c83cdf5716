//! Maturity registry: the fixed set of Treasury constant-maturity tenors.
//!
//! Declaration order is canonical. It drives column order in every table,
//! chart legend, and export, so `Maturity::ALL` must stay sorted by tenor.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Immutable description of one registered maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaturityDescriptor {
    pub key: &'static str,
    pub tenor_years: f64,
    pub upstream_series_id: &'static str,
    pub display_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Maturity {
    #[serde(rename = "1mo")]
    #[value(name = "1mo")]
    M1,
    #[serde(rename = "3mo")]
    #[value(name = "3mo")]
    M3,
    #[serde(rename = "6mo")]
    #[value(name = "6mo")]
    M6,
    #[serde(rename = "1yr")]
    #[value(name = "1yr")]
    Y1,
    #[serde(rename = "2yr")]
    #[value(name = "2yr")]
    Y2,
    #[serde(rename = "3yr")]
    #[value(name = "3yr")]
    Y3,
    #[serde(rename = "5yr")]
    #[value(name = "5yr")]
    Y5,
    #[serde(rename = "7yr")]
    #[value(name = "7yr")]
    Y7,
    #[serde(rename = "10yr")]
    #[value(name = "10yr")]
    Y10,
    #[serde(rename = "20yr")]
    #[value(name = "20yr")]
    Y20,
    #[serde(rename = "30yr")]
    #[value(name = "30yr")]
    Y30,
}

impl Maturity {
    pub const COUNT: usize = 11;

    pub const ALL: [Maturity; Maturity::COUNT] = [
        Maturity::M1,
        Maturity::M3,
        Maturity::M6,
        Maturity::Y1,
        Maturity::Y2,
        Maturity::Y3,
        Maturity::Y5,
        Maturity::Y7,
        Maturity::Y10,
        Maturity::Y20,
        Maturity::Y30,
    ];

    pub fn descriptor(self) -> MaturityDescriptor {
        let (key, tenor_years, upstream_series_id, display_label) = match self {
            Maturity::M1 => ("1mo", 1.0 / 12.0, "DGS1MO", "1 Month"),
            Maturity::M3 => ("3mo", 0.25, "DGS3MO", "3 Month"),
            Maturity::M6 => ("6mo", 0.5, "DGS6MO", "6 Month"),
            Maturity::Y1 => ("1yr", 1.0, "DGS1", "1 Year"),
            Maturity::Y2 => ("2yr", 2.0, "DGS2", "2 Year"),
            Maturity::Y3 => ("3yr", 3.0, "DGS3", "3 Year"),
            Maturity::Y5 => ("5yr", 5.0, "DGS5", "5 Year"),
            Maturity::Y7 => ("7yr", 7.0, "DGS7", "7 Year"),
            Maturity::Y10 => ("10yr", 10.0, "DGS10", "10 Year"),
            Maturity::Y20 => ("20yr", 20.0, "DGS20", "20 Year"),
            Maturity::Y30 => ("30yr", 30.0, "DGS30", "30 Year"),
        };
        MaturityDescriptor {
            key,
            tenor_years,
            upstream_series_id,
            display_label,
        }
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn tenor_years(self) -> f64 {
        self.descriptor().tenor_years
    }

    pub fn series_id(self) -> &'static str {
        self.descriptor().upstream_series_id
    }

    pub fn display_name(self) -> &'static str {
        self.descriptor().display_label
    }

    /// Position in the canonical registry order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Maturity {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Maturity::ALL
            .iter()
            .copied()
            .find(|m| m.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PipelineError::UnknownMaturity(wanted.to_string()))
    }
}

/// Look up a maturity descriptor by key.
pub fn describe(key: &str) -> Result<MaturityDescriptor, PipelineError> {
    key.parse::<Maturity>().map(Maturity::descriptor)
}

/// All registered keys, in canonical order.
pub fn all_keys() -> Vec<&'static str> {
    Maturity::ALL.iter().map(|m| m.key()).collect()
}

/// Parse, deduplicate, and sort keys into registry order.
pub fn normalize_keys<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Maturity>, PipelineError> {
    let mut out = keys
        .iter()
        .map(|k| k.as_ref().parse::<Maturity>())
        .collect::<Result<Vec<_>, _>>()?;
    out.sort();
    out.dedup();
    Ok(out)
}
