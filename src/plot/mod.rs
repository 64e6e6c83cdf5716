//! Terminal plotting.

pub mod ascii;

pub use ascii::render_curve_plot;
