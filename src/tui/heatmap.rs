//! Heatmap widget: one terminal row per maturity, one cell column per date.
//!
//! When there are more dates than columns the dates are sampled evenly; when
//! there are fewer, each date spans several cells.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::present::HeatmapMatrix;

/// Low, mid and high anchors of the colour scale (blue, pale yellow, red).
const LOW: (f64, f64, f64) = (49.0, 54.0, 149.0);
const MID: (f64, f64, f64) = (255.0, 255.0, 191.0);
const HIGH: (f64, f64, f64) = (165.0, 0.0, 38.0);

pub struct HeatmapWidget<'a> {
    pub matrix: &'a HeatmapMatrix,
    /// Matrix date column to mark (the current frame's date).
    pub highlight: Option<usize>,
}

impl Widget for HeatmapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let m = self.matrix;
        let label_w = m
            .y_labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as u16
            + 1;
        let n_dates = m.x_labels.len();

        if area.width <= label_w + 2 || area.height < 2 || n_dates == 0 {
            buf.set_string(area.x, area.y, "No heatmap to show.", Style::default().fg(Color::Yellow));
            return;
        }

        let cells = area.width - label_w;
        let rows = (area.height - 1).min(m.y_labels.len() as u16);
        let date_at = |x: u16| (x as usize * n_dates) / cells as usize;
        let highlight_x = self
            .highlight
            .and_then(|h| (0..cells).find(|&x| date_at(x) >= h));

        for r in 0..rows {
            let y = area.y + r;
            let label = &m.y_labels[r as usize];
            buf.set_string(area.x, y, label, Style::default().fg(Color::Gray));

            for x in 0..cells {
                let Some(cell) = buf.cell_mut((area.x + label_w + x, y)) else {
                    continue;
                };
                match m.values[r as usize][date_at(x)] {
                    Some(v) => {
                        cell.set_char(' ').set_bg(heat_color(m.normalized(v)));
                    }
                    None => {
                        cell.set_char('·').set_fg(Color::DarkGray);
                    }
                }
                if Some(x) == highlight_x {
                    cell.set_char('│').set_fg(Color::White);
                }
            }
        }

        let y = area.y + rows;
        let style = Style::default().fg(Color::Gray);
        let first = &m.x_labels[0];
        let last = &m.x_labels[n_dates - 1];
        buf.set_string(area.x + label_w, y, first, style);
        let last_x = (area.x + area.width).saturating_sub(last.chars().count() as u16);
        if last_x > area.x + label_w + first.chars().count() as u16 {
            buf.set_string(last_x, y, last, style);
        }
    }
}

/// Map `u` in `[0, 1]` onto the blue-yellow-red scale.
pub fn heat_color(u: f64) -> Color {
    let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.5 };
    let (from, to, t) = if u <= 0.5 { (LOW, MID, u * 2.0) } else { (MID, HIGH, (u - 0.5) * 2.0) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    Color::Rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Maturity, Provenance};

    fn matrix() -> HeatmapMatrix {
        HeatmapMatrix {
            provenance: Provenance::Real,
            maturities: vec![Maturity::Y2, Maturity::Y10],
            dates: vec![
                chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            ],
            x_labels: vec!["2020-01".into(), "2020-02".into()],
            y_labels: vec!["2 Year".into(), "10 Year".into()],
            values: vec![vec![Some(1.0), Some(2.0)], vec![None, Some(3.0)]],
            value_range: Some((1.0, 3.0)),
        }
    }

    #[test]
    fn scale_endpoints() {
        assert_eq!(heat_color(0.0), Color::Rgb(49, 54, 149));
        assert_eq!(heat_color(0.5), Color::Rgb(255, 255, 191));
        assert_eq!(heat_color(1.0), Color::Rgb(165, 0, 38));
        assert_eq!(heat_color(f64::NAN), heat_color(0.5));
    }

    #[test]
    fn renders_cells_and_labels() {
        let m = matrix();
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        HeatmapWidget { matrix: &m, highlight: None }.render(area, &mut buf);

        // Label column is 8 wide ("10 Year" + 1); 4 cells, 2 per date.
        assert_eq!(buf[(0, 1)].symbol(), "1");
        assert_eq!(buf[(8, 0)].bg, heat_color(0.0));
        assert_eq!(buf[(10, 0)].bg, heat_color(0.5));
        assert_eq!(buf[(8, 1)].symbol(), "·");
        assert_eq!(buf[(11, 1)].bg, heat_color(1.0));
        assert_eq!(buf[(8, 2)].symbol(), "2");
    }

    #[test]
    fn tiny_area_shows_hint() {
        let m = matrix();
        let area = Rect::new(0, 0, 25, 1);
        let mut buf = Buffer::empty(area);
        HeatmapWidget { matrix: &m, highlight: Some(1) }.render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "N");
    }
}
