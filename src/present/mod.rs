//! Presentation adapters.
//!
//! Pure functions from a borrowed `YieldTable` to renderable data. None of them
//! mutate the table, and every artifact carries the table's `Provenance` so a
//! front end cannot render data without knowing where it came from.
//!
//! Long tables are thinned to an evenly spaced subset of rows (first and last
//! always kept) so a 35-year daily history stays drawable.

pub mod animation;
pub mod heatmap;
pub mod surface;

pub use animation::{AnimationFrames, CurveFrame, MAX_FRAMES, TrailFrame, frames, frames_with_limit};
pub use heatmap::{HeatmapMatrix, MAX_HEATMAP_DATES, matrix, matrix_with_limit};
pub use surface::{MAX_SURFACE_ROWS, SurfaceMesh, mesh, mesh_with_limit};

/// `2024-03` style label used on time axes.
pub const MONTH_LABEL_FORMAT: &str = "%Y-%m";

/// Indices of at most `max` rows out of `n`, evenly spaced, ascending, always
/// including the first and last row.
///
/// `max == 0` means no limit; `max == 1` keeps only the last (latest) row.
pub fn sample_rows(n: usize, max: usize) -> Vec<usize> {
    if max == 0 || n <= max {
        return (0..n).collect();
    }
    if max == 1 {
        return vec![n - 1];
    }
    // n > max >= 2, so the stride is at least 1 and the indices are distinct.
    (0..max).map(|i| i * (n - 1) / (max - 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tables_keep_every_row() {
        assert_eq!(sample_rows(4, 10), vec![0, 1, 2, 3]);
        assert_eq!(sample_rows(4, 0), vec![0, 1, 2, 3]);
        assert!(sample_rows(0, 5).is_empty());
    }

    #[test]
    fn long_tables_are_thinned_evenly() {
        assert_eq!(sample_rows(10, 4), vec![0, 3, 6, 9]);
        assert_eq!(sample_rows(10, 1), vec![9]);

        let idx = sample_rows(9_000, 150);
        assert_eq!(idx.len(), 150);
        assert_eq!(idx[0], 0);
        assert_eq!(idx[149], 8_999);
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
    }
}
