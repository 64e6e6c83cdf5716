//! Yield-curve chart drawn by Plotters into the Ratatui buffer.
//!
//! The current curve is drawn over its fading trail; the terminal backend comes
//! from `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct CurvePlottersChart<'a> {
    /// The curve for the current frame.
    pub curve: &'a [(f64, f64)],
    /// Earlier frames with their opacity, oldest first.
    pub trails: Vec<(&'a [(f64, f64)], f64)>,
    /// X bounds (tenor in years).
    pub x_bounds: [f64; 2],
    /// Y bounds (yield, percent).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    /// Current curve colour; green for real data, red for sample data.
    pub curve_color: RGBColor,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for CurvePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out axes in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Terminal cells have no alpha channel; fade trails by dimming.
            for (points, alpha) in &self.trails {
                let color = trail_color(*alpha);
                chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
            }

            chart.draw_series(LineSeries::new(self.curve.iter().copied(), &self.curve_color))?;

            // `Circle` markers come out oversized through the ratatui backend;
            // a white `Pixel` marks each observed tenor instead.
            chart.draw_series(self.curve.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Blue trail colour dimmed by `alpha` (0.1 oldest, up to 0.5 newest).
pub fn trail_color(alpha: f64) -> RGBColor {
    let k = (alpha.clamp(0.0, 1.0) * 2.0).min(1.0);
    let scale = |c: f64| (c * (0.25 + 0.75 * k)).round() as u8;
    RGBColor(scale(70.0), scale(110.0), scale(255.0))
}
