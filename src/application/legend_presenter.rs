// Legend presenter - Legend rows, value formatting and activity overlays
use crate::application::scheduler::TaskHandle;
use crate::domain::activity::ActivityRegion;
use crate::domain::plot_item::{LegendFormat, PlotItem};
use crate::domain::render::{ActivityOverlay, LegendLayout, LegendRow};
use crate::domain::time_point::{TimePoint, TimestampMs};
use crate::domain::viewport::TimeScale;
use chrono::{DateTime, Utc};

const HEADER_FORMAT: &str = "%I:%M%p";
const BLANK_VALUE: &str = "--";

/// Sample shown for a pointer time: the last one at or before it, or the
/// first sample when the pointer sits left of all data.
pub fn sample_at(points: &[TimePoint], time_ms: TimestampMs) -> Option<&TimePoint> {
    let after = points.partition_point(|p| p.time_ms <= time_ms);
    points.get(after.saturating_sub(1))
}

pub fn format_value(value: f64, format: LegendFormat, blank_zero: bool) -> String {
    if blank_zero && value == 0.0 {
        return BLANK_VALUE.to_string();
    }

    match format {
        LegendFormat::Plain => value.to_string(),
        LegendFormat::OneDecimal => format!("{:.1}", value),
        LegendFormat::Scientific { divisor } => exponential(value / divisor),
    }
}

/// `12345.0` -> `1.23e+4`
fn exponential(value: f64) -> String {
    let formatted = format!("{:.2e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// One row per visible data series, read from the sample under the pointer.
pub fn legend_rows(visible: &[TimePoint], time_ms: TimestampMs, items: &[PlotItem]) -> Vec<LegendRow> {
    let sample = sample_at(visible, time_ms);

    items
        .iter()
        .filter(|item| item.visible && item.kind.carries_data())
        .map(|item| {
            let value = sample
                .and_then(|s| s.value(&item.name))
                .map(|v| format_value(v, item.legend_format, item.blank_zero))
                .unwrap_or_else(|| BLANK_VALUE.to_string());
            LegendRow {
                name: item.name.clone(),
                value,
            }
        })
        .collect()
}

pub fn legend_layout(
    x_px: f64,
    time_ms: TimestampMs,
    rows: Vec<LegendRow>,
    box_width: f64,
    top: f64,
) -> LegendLayout {
    let header = DateTime::<Utc>::from_timestamp_millis(time_ms)
        .map(|t| t.format(HEADER_FORMAT).to_string())
        .unwrap_or_default();

    LegendLayout {
        line_x: x_px,
        box_left: x_px - box_width / 2.0,
        top,
        header,
        rows,
    }
}

/// Projects the regions intersecting the visible domain, clamped to the plot.
pub fn activity_overlays(
    activities: &[ActivityRegion],
    x_scale: &TimeScale,
    selected: Option<&str>,
) -> Vec<ActivityOverlay> {
    activities
        .iter()
        .filter(|activity| activity.intersects(x_scale.domain))
        .map(|activity| ActivityOverlay {
            id: activity.id.clone(),
            label: activity.kind.clone(),
            left_px: x_scale.to_px(activity.start_ms).max(0.0),
            right_px: x_scale.to_px(activity.end_ms).min(x_scale.width_px),
            selected: selected == Some(activity.id.as_str()),
        })
        .collect()
}

/// First overlay under the pointer.
pub fn hit_test(overlays: &[ActivityOverlay], x_px: f64) -> Option<&ActivityOverlay> {
    overlays.iter().find(|overlay| overlay.contains(x_px))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPhase {
    #[default]
    Hidden,
    FadingIn,
    Pinned,
    FadingOut,
}

/// Tap-hold legend lifecycle. Zoom stays disabled while the legend is pinned.
#[derive(Debug, Clone, Default)]
pub struct LegendState {
    pub phase: LegendPhase,
    pub x_px: f64,
    pub touch_origin_px: Option<f64>,
    pub hide_task: Option<TaskHandle>,
}

impl LegendState {
    pub fn is_visible(&self) -> bool {
        self.phase != LegendPhase::Hidden
    }

    /// Whether the pointer stayed within `slop_px` of where the touch started.
    pub fn held_still(&self, x_px: f64, slop_px: f64) -> bool {
        self.touch_origin_px
            .map(|origin| (x_px - origin).abs() <= slop_px)
            .unwrap_or(true)
    }
}
