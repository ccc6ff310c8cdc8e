// Plot item registrations and their draw strategies
use crate::domain::render::{AxisTick, BarRect, LinePath, RenderSurface};
use crate::domain::time_point::TimePoint;
use crate::domain::viewport::{LinearScale, TimeScale};
use chrono::{DateTime, Timelike, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

const AXIS_TICK_COUNT: usize = 4;

/// Read-only view of the graph handed to a draw strategy.
pub struct DrawContext<'a> {
    pub series: &'a str,
    pub visible: &'a [TimePoint],
    pub x_scale: TimeScale,
    pub y_scale: LinearScale,
    pub bar_width: f64,
    pub height_px: f64,
}

pub trait DrawStrategy: Send + Sync {
    fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn RenderSurface, animated: bool);

    /// Removes whatever `draw` produced.
    fn clear(&self, _series: &str, _surface: &mut dyn RenderSurface) {}
}

pub struct LineStrategy;

impl DrawStrategy for LineStrategy {
    fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn RenderSurface, animated: bool) {
        let mut path = LinePath::default();
        let mut segment = Vec::new();

        for point in ctx.visible {
            match point.value(ctx.series) {
                Some(v) if v > 0.0 => {
                    segment.push((ctx.x_scale.to_px(point.time_ms), ctx.y_scale.to_px(v)));
                }
                _ => {
                    if !segment.is_empty() {
                        path.segments.push(std::mem::take(&mut segment));
                    }
                }
            }
        }
        if !segment.is_empty() {
            path.segments.push(segment);
        }

        surface.draw_line(ctx.series, path, animated);
    }

    fn clear(&self, series: &str, surface: &mut dyn RenderSurface) {
        surface.clear_line(series);
    }
}

pub struct BarStrategy;

impl DrawStrategy for BarStrategy {
    fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn RenderSurface, animated: bool) {
        let bars = ctx
            .visible
            .iter()
            .filter_map(|point| {
                let value = point.value(ctx.series)?;
                let y = ctx.y_scale.to_px(value);
                Some(BarRect {
                    x: ctx.x_scale.to_px(point.time_ms),
                    y,
                    width: ctx.bar_width,
                    height: ctx.height_px - y,
                })
            })
            .collect();

        surface.draw_bars(ctx.series, bars, animated);
    }

    fn clear(&self, series: &str, surface: &mut dyn RenderSurface) {
        surface.remove_bars(series);
    }
}

pub struct AxisStrategy;

impl DrawStrategy for AxisStrategy {
    fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn RenderSurface, _animated: bool) {
        let domain = ctx.x_scale.domain;
        let step = domain.duration_ms() / AXIS_TICK_COUNT as i64;
        let ticks = (0..AXIS_TICK_COUNT as i64)
            .map(|i| domain.start_ms + step / 2 + i * step)
            .map(|time_ms| AxisTick {
                x_px: ctx.x_scale.to_px(time_ms),
                label: format_tick(time_ms),
            })
            .collect();
        surface.draw_axis(ticks);
    }
}

/// Short 12-hour tick label, e.g. `7:05a` or `12:30p`.
pub fn format_tick(time_ms: i64) -> String {
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(time_ms) else {
        return String::new();
    };
    let (hours, am_pm) = match time.hour() {
        0 => (12, "a"),
        h @ 1..=11 => (h, "a"),
        12 => (12, "p"),
        h => (h - 12, "p"),
    };
    format!("{}:{:02}{}", hours, time.minute(), am_pm)
}

#[derive(Clone)]
pub enum SeriesKind {
    Line,
    Bar,
    Axis,
    Custom(Arc<dyn DrawStrategy>),
}

impl SeriesKind {
    fn strategy(&self) -> &dyn DrawStrategy {
        match self {
            SeriesKind::Line => &LineStrategy,
            SeriesKind::Bar => &BarStrategy,
            SeriesKind::Axis => &AxisStrategy,
            SeriesKind::Custom(strategy) => strategy.as_ref(),
        }
    }

    pub fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn RenderSurface, animated: bool) {
        self.strategy().draw(ctx, surface, animated);
    }

    pub fn clear(&self, series: &str, surface: &mut dyn RenderSurface) {
        self.strategy().clear(series, surface);
    }

    /// Whether the series reads a named field from the samples.
    pub fn carries_data(&self) -> bool {
        !matches!(self, SeriesKind::Axis)
    }
}

impl fmt::Debug for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Line => write!(f, "Line"),
            SeriesKind::Bar => write!(f, "Bar"),
            SeriesKind::Axis => write!(f, "Axis"),
            SeriesKind::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// How a series value is shown in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum LegendFormat {
    #[default]
    Plain,
    OneDecimal,
    Scientific {
        divisor: f64,
    },
}

#[derive(Debug, Clone)]
pub struct PlotItem {
    pub name: String,
    pub kind: SeriesKind,
    pub y_scale: LinearScale,
    pub legend_format: LegendFormat,
    /// Show `--` for zero, which means "no signal" for this series.
    pub blank_zero: bool,
    pub visible: bool,
}

impl PlotItem {
    pub fn new(name: impl Into<String>, kind: SeriesKind, y_scale: LinearScale) -> Self {
        Self {
            name: name.into(),
            kind,
            y_scale,
            legend_format: LegendFormat::Plain,
            blank_zero: false,
            visible: true,
        }
    }

    pub fn with_legend(mut self, legend_format: LegendFormat, blank_zero: bool) -> Self {
        self.legend_format = legend_format;
        self.blank_zero = blank_zero;
        self
    }
}
