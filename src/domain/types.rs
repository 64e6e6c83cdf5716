//! Small shared types: source preference, provenance, fetch outcomes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Maturity;

/// Which data source the caller would like the pipeline to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourcePreference {
    /// FRED first, synthetic fallback.
    #[default]
    #[serde(alias = "fred", alias = "FRED")]
    Remote,
    /// Generated sample data only.
    #[serde(alias = "sample", alias = "sample_data")]
    Synthetic,
}

impl SourcePreference {
    pub fn toggled(self) -> Self {
        match self {
            SourcePreference::Remote => SourcePreference::Synthetic,
            SourcePreference::Synthetic => SourcePreference::Remote,
        }
    }
}

/// Whether a table holds real market data or generated stand-in data.
///
/// Every presentation surface must show this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Real,
    Synthetic,
}

impl Provenance {
    pub fn from_synthetic(is_synthetic: bool) -> Self {
        if is_synthetic {
            Provenance::Synthetic
        } else {
            Provenance::Real
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Provenance::Real => "REAL FRED API DATA",
            Provenance::Synthetic => "SAMPLE DATA (Not real market data)",
        }
    }
}

/// Result of one remote fetch attempt for a single maturity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub maturity: Maturity,
    pub succeeded: bool,
    pub observation_count: usize,
    pub error_message: Option<String>,
}

impl FetchOutcome {
    /// Counts toward the coverage threshold.
    pub fn has_coverage(&self) -> bool {
        self.succeeded && self.observation_count > 0
    }
}
