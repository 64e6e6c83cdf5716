//! Ratatui-based terminal UI.
//!
//! Plays the assembled yield curve through time, with a heatmap view, a view
//! range that re-slices the loaded table, and a banner that always says
//! whether the data on screen is real or generated.

use std::io;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{Assembly, Pipeline};
use crate::config::Settings;
use crate::domain::{DateRange, Frequency, Provenance, SourcePreference, YieldTable, parse_date};
use crate::error::AppError;
use crate::present::{AnimationFrames, HeatmapMatrix};

mod heatmap;
mod playback;
mod plotters_chart;

use heatmap::HeatmapWidget;
use playback::Playback;
use plotters_chart::CurvePlottersChart;

const FIELD_COUNT: usize = 4;

/// Start the TUI.
pub fn run(settings: Settings) -> Result<(), AppError> {
    // Load before taking over the terminal so fetch logging stays readable.
    let mut app = App::new(settings)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
///
/// Logging is muted while the guard is alive; stderr output would tear the
/// alternate screen.
struct TerminalGuard {
    log_level: log::LevelFilter,
}

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        let log_level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        Ok(Self { log_level })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        log::set_max_level(self.log_level);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Curve,
    Heatmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeField {
    Start,
    End,
}

struct App {
    settings: Settings,
    pipeline: Pipeline,
    source: SourcePreference,
    /// Everything loaded for the configured range. Never modified; the view
    /// works on slices of it.
    assembly: Assembly,
    view_range: DateRange,
    view_table: YieldTable,
    animation: AnimationFrames,
    heatmap: HeatmapMatrix,
    playback: Playback,
    show_trails: bool,
    view: View,
    selected_field: usize,
    editing: Option<RangeField>,
    input: String,
    status: String,
}

impl App {
    fn new(settings: Settings) -> Result<Self, AppError> {
        let pipeline = Pipeline::from_settings(&settings);
        let source = settings.source;
        let range = settings.date_range(crate::app::today())?;
        let assembly = pipeline.assemble_maturities(&settings.maturities, range, source)?;

        let view_table = assembly.table.clone();
        let animation = crate::present::frames(&view_table);
        let heatmap = crate::present::matrix(&view_table);
        let playback = Playback::new(animation.len(), settings.animation_speed_ms);

        let mut app = Self {
            show_trails: settings.fade_trails,
            settings,
            pipeline,
            source,
            view_range: range,
            view_table,
            animation,
            heatmap,
            playback,
            assembly,
            view: View::Curve,
            selected_field: 0,
            editing: None,
            input: String::new(),
            status: String::new(),
        };
        app.status = app.load_status();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        let mut last_tick = Instant::now();
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            let timeout = if self.playback.is_playing() {
                self.playback
                    .interval()
                    .saturating_sub(last_tick.elapsed())
                    .min(Duration::from_millis(100))
            } else {
                Duration::from_millis(100)
            };

            if event::poll(timeout).map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                    Event::Key(key) => {
                        if key.kind == KeyEventKind::Press {
                            if self.handle_key(key.code) {
                                break;
                            }
                            needs_redraw = true;
                        }
                    }
                    Event::Resize(_, _) => {
                        needs_redraw = true;
                    }
                    _ => {}
                }
            }

            if self.playback.is_playing() && last_tick.elapsed() >= self.playback.interval() {
                self.playback.tick();
                last_tick = Instant::now();
                needs_redraw = true;
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_range_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(' ') => {
                self.playback.toggle();
                self.status = if self.playback.is_playing() { "Playing." } else { "Paused." }.to_string();
            }
            KeyCode::Left => self.playback.step(-1),
            KeyCode::Right => self.playback.step(1),
            KeyCode::Home => self.playback.first(),
            KeyCode::End => self.playback.last(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.playback.faster();
                self.status = format!("speed: {}ms/frame", self.playback.speed_ms());
            }
            KeyCode::Char('-') => {
                self.playback.slower();
                self.status = format!("speed: {}ms/frame", self.playback.speed_ms());
            }
            KeyCode::Char('t') => {
                self.show_trails = !self.show_trails;
                self.status = format!("trails: {}", on_off(self.show_trails));
            }
            KeyCode::Char('h') => {
                self.view = match self.view {
                    View::Curve => View::Heatmap,
                    View::Heatmap => View::Curve,
                };
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('o') => {
                self.source = self.source.toggled();
                self.reload();
            }
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                self.selected_field = (self.selected_field + 1).min(FIELD_COUNT - 1);
            }
            KeyCode::Enter => self.activate_field(),
            _ => {}
        }

        false
    }

    fn activate_field(&mut self) {
        match self.selected_field {
            0 => self.begin_edit(RangeField::Start),
            1 => self.begin_edit(RangeField::End),
            2 => {
                self.source = self.source.toggled();
                self.reload();
            }
            3 => {
                self.settings.frequency = next_frequency(self.settings.frequency);
                self.pipeline = Pipeline::from_settings(&self.settings);
                self.reload();
            }
            _ => {}
        }
    }

    fn begin_edit(&mut self, field: RangeField) {
        let current = match field {
            RangeField::Start => self.view_range.start,
            RangeField::End => self.view_range.end,
        };
        self.input = current.to_string();
        self.editing = Some(field);
        self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
    }

    fn handle_range_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(field) = self.editing.take() {
                    self.apply_range_input(field);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_range_input(&mut self, field: RangeField) {
        let date = match parse_date(&self.input) {
            Ok(d) => d,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        let (start, end) = match field {
            RangeField::Start => (date, self.view_range.end),
            RangeField::End => (self.view_range.start, date),
        };
        match DateRange::validated(start, end) {
            Ok(range) => self.set_view_range(range),
            Err(err) => self.status = err.to_string(),
        }
    }

    /// Re-slice the loaded table; the loaded table itself is left untouched.
    fn set_view_range(&mut self, range: DateRange) {
        let sliced = self.assembly.table.slice(range.start, range.end);
        if sliced.is_empty() {
            self.status = format!("No rows between {} and {}.", range.start, range.end);
            return;
        }
        self.view_range = range;
        self.install_view(sliced);
        self.status = format!("view: {}", crate::report::describe_table(&self.view_table));
    }

    fn install_view(&mut self, table: YieldTable) {
        self.animation = crate::present::frames(&table);
        self.heatmap = crate::present::matrix(&table);
        self.playback.reset(self.animation.len());
        self.view_table = table;
    }

    fn reload(&mut self) {
        let range = match self.settings.date_range(crate::app::today()) {
            Ok(r) => r,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        match self
            .pipeline
            .assemble_maturities(&self.settings.maturities, range, self.source)
        {
            Ok(assembly) => {
                self.assembly = assembly;
                let view = DateRange::validated(
                    self.view_range.start.max(range.start),
                    self.view_range.end.min(range.end),
                )
                .unwrap_or(range);
                let sliced = self.assembly.table.slice(view.start, view.end);
                self.view_range = view;
                self.install_view(sliced);
                self.status = self.load_status();
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn load_status(&self) -> String {
        let table = crate::report::describe_table(&self.assembly.table);
        match &self.assembly.fallback {
            Some(reason) => format!("Loaded sample data ({reason}): {table}"),
            None => format!("Loaded FRED data: {table}"),
        }
    }

    fn current_date(&self) -> Option<NaiveDate> {
        self.animation.get(self.playback.index()).map(|f| f.date)
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let provenance = self.view_table.provenance();
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("yc", Style::default().fg(Color::Cyan)),
            Span::raw(" US Treasury yield curves  "),
            Span::styled(format!(" {} ", provenance.label()), banner_style(provenance)),
        ]));

        let position = match self.current_date() {
            Some(d) => format!("{} ({}/{})", d.format("%Y-%m-%d"), self.playback.index() + 1, self.animation.len()),
            None => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "source: {:?} | {:?} | view: {} → {} | frame: {position} | speed: {}ms | trails: {}",
                self.source,
                self.view_table.frequency,
                self.view_range.start,
                self.view_range.end,
                self.playback.speed_ms(),
                on_off(self.show_trails),
            ),
            Style::default().fg(Color::Gray),
        )));

        let outcomes = &self.assembly.outcomes;
        if !outcomes.is_empty() {
            let ok = outcomes.iter().filter(|o| o.has_coverage()).count();
            let failed: Vec<&str> = outcomes
                .iter()
                .filter(|o| !o.has_coverage())
                .map(|o| o.maturity.key())
                .collect();
            let mut text = format!("FRED: {ok}/{} series loaded", outcomes.len());
            if !failed.is_empty() {
                text.push_str(&format!(" | missing: {}", failed.join(", ")));
            }
            lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(FIELD_COUNT as u16 + 2)])
            .split(area);

        match self.view {
            View::Curve => self.draw_chart(frame, chunks[0]),
            View::Heatmap => self.draw_heatmap(frame, chunks[0]),
        }
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self
            .animation
            .get(self.playback.index())
            .map(|f| f.title.clone())
            .unwrap_or_else(|| "US Treasury Yield Curve".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(current) = self.animation.get(self.playback.index()) else {
            let msg = Paragraph::new("No observations in the selected range.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let trails = if self.show_trails {
            self.animation
                .trail(self.playback.index(), self.settings.max_trails)
                .into_iter()
                .map(|t| (t.frame.points.as_slice(), t.alpha))
                .collect()
        } else {
            Vec::new()
        };

        let x_bounds = self.animation.x_bounds;
        let y_bounds = self.animation.y_bounds;
        let (chart_rect, insets) = chart_layout(inner);
        let widget = CurvePlottersChart {
            curve: &current.points,
            trails,
            x_bounds,
            y_bounds,
            x_label: "tenor (yrs)",
            y_label: "yield (%)".to_string(),
            curve_color: curve_color(self.animation.provenance),
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_heatmap(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match self.heatmap.value_range {
            Some((lo, hi)) => format!("Yield heatmap ({lo:.2}% to {hi:.2}%)"),
            None => "Yield heatmap".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);
        frame.render_widget(
            HeatmapWidget {
                matrix: &self.heatmap,
                highlight: self.current_date().and_then(|d| self.heatmap.date_index(d)),
            },
            inner,
        );
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let field_value = |field: RangeField, value: NaiveDate| match self.editing {
            Some(f) if f == field => format!("{}_", self.input),
            _ => value.to_string(),
        };

        let items = vec![
            ListItem::new(format!("Start: {}", field_value(RangeField::Start, self.view_range.start))),
            ListItem::new(format!("End: {}", field_value(RangeField::End, self.view_range.end))),
            ListItem::new(format!("Source: {:?}", self.source)),
            ListItem::new(format!("Frequency: {:?}", self.settings.frequency)),
        ];

        let list = List::new(items)
            .block(Block::default().title("View").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "space play  ←/→ step  +/- speed  t trails  h heatmap  ↑/↓ Enter edit  r reload  o source  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn banner_style(provenance: Provenance) -> Style {
    match provenance {
        Provenance::Real => Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Provenance::Synthetic => Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

fn curve_color(provenance: Provenance) -> RGBColor {
    match provenance {
        Provenance::Real => RGBColor(0, 220, 90),
        Provenance::Synthetic => RGBColor(255, 70, 70),
    }
}

fn next_frequency(cur: Frequency) -> Frequency {
    match cur {
        Frequency::Monthly => Frequency::Weekly,
        Frequency::Weekly => Frequency::Daily,
        Frequency::Daily => Frequency::Monthly,
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.1}")
}

/// Room left around the Plotters canvas for tick labels drawn by Ratatui.
#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

const AXIS_INSETS: AxisInsets = AxisInsets {
    left: 8,
    right: 2,
    top: 1,
    bottom: 2,
};

const AXIS_TICKS: usize = 5;

/// Shrink `inner` to make room for tick labels; no insets when too small.
fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let i = AXIS_INSETS;
    let too_narrow = inner.width <= i.left + i.right + 10;
    let too_short = inner.height <= i.top + i.bottom + 5;
    if too_narrow || too_short {
        return (inner, None);
    }
    let rect = Rect::new(
        inner.x + i.left,
        inner.y + i.top,
        inner.width - i.left - i.right,
        inner.height - i.top - i.bottom,
    );
    (rect, Some(i))
}

/// Evenly spaced `(fraction, value)` pairs across `bounds`, ends included.
fn ticks(bounds: [f64; 2]) -> impl Iterator<Item = (f64, f64)> {
    (0..AXIS_TICKS).map(move |i| {
        let u = i as f64 / (AXIS_TICKS - 1) as f64;
        (u, bounds[0] + u * (bounds[1] - bounds[0]))
    })
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);
    let mut put = |label: String, x: u16, y: u16| {
        let width = label.len() as u16;
        frame.render_widget(Paragraph::new(label).style(style), Rect::new(x, y, width, 1));
    };

    // Tenor ticks sit on the row just under the canvas.
    let x_row = chart.y + chart.height;
    if x_row < inner.bottom().saturating_sub(1) {
        for (u, v) in ticks(x_bounds) {
            let label = fmt_axis_x(v);
            let centre = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            put(label.clone(), centre.saturating_sub(label.len() as u16 / 2), x_row);
        }
    }

    // Yield ticks are right-aligned against the canvas, top = max.
    let right_edge = inner.x + insets.left.saturating_sub(1);
    for (u, v) in ticks(y_bounds) {
        let label = fmt_axis_y(v);
        let Some(start) = right_edge.checked_sub(label.len() as u16).filter(|&s| s >= inner.x) else {
            continue;
        };
        let row = chart.bottom() - 1 - ((chart.height - 1) as f64 * u).round() as u16;
        put(label, start, row);
    }

    let caption_row = chart.y + chart.height + 1;
    if caption_row < inner.bottom() {
        frame.render_widget(
            Paragraph::new("tenor (yrs)").alignment(Alignment::Center).style(style),
            Rect::new(chart.x, caption_row, chart.width, 1),
        );
    }
    frame.render_widget(
        Paragraph::new("yield %").style(style.add_modifier(Modifier::BOLD)),
        Rect::new(inner.x, inner.y, insets.left.saturating_sub(1), 1),
    );
}
