//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the maturity registry (`Maturity`, `MaturityDescriptor`)
//! - the assembled table (`YieldTable`, `ObservationRow`, `DateRange`, `Frequency`)
//! - source preference, provenance, and per-series fetch outcomes

pub mod maturity;
pub mod table;
pub mod types;

pub use maturity::*;
pub use table::*;
pub use types::*;
