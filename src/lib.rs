//! `yield-curves` library crate.
//!
//! The binary (`yc`) is a thin wrapper around this library so that:
//!
//! - the loading and fallback pipeline is testable without spawning processes
//! - presentation adapters are reusable by any front end
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod present;
pub mod report;
pub mod tui;
