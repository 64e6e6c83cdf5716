//! Input/output helpers.
//!
//! - table and statistics CSV exports (`export`)
//! - animation frames JSON (`frames`)

pub mod export;
pub mod frames;

pub use export::*;
pub use frames::*;
