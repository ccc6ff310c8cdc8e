// Logging render surface - Reports drawn geometry through tracing
use crate::domain::render::{
    ActivityOverlay, AxisTick, BarRect, LegendLayout, LinePath, RenderSurface,
};
use serde::Serialize;

/// Running totals of what was drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCounts {
    pub lines: u64,
    pub bars: u64,
    pub clears: u64,
    pub legends: u64,
    pub overlays: u64,
}

#[derive(Debug, Default)]
pub struct LogSurface {
    counts: DrawCounts,
}

impl LogSurface {
    pub fn counts(&self) -> DrawCounts {
        self.counts
    }
}

fn trace_geometry<T: Serialize + ?Sized>(kind: &str, series: &str, geometry: &T) {
    if tracing::enabled!(tracing::Level::TRACE) {
        match serde_json::to_string(geometry) {
            Ok(json) => tracing::trace!("{} {}: {}", kind, series, json),
            Err(e) => tracing::trace!("{} {}: unserializable geometry: {}", kind, series, e),
        }
    }
}

impl RenderSurface for LogSurface {
    fn draw_line(&mut self, series: &str, path: LinePath, animated: bool) {
        self.counts.lines += 1;
        tracing::debug!(
            "line {}: {} points in {} segments{}",
            series,
            path.point_count(),
            path.segments.len(),
            if animated { " (animated)" } else { "" }
        );
        trace_geometry("line", series, &path);
    }

    fn clear_line(&mut self, series: &str) {
        self.counts.clears += 1;
        tracing::debug!("clear line {}", series);
    }

    fn draw_bars(&mut self, series: &str, bars: Vec<BarRect>, animated: bool) {
        self.counts.bars += 1;
        tracing::debug!(
            "bars {}: {} rects, width {:.2}{}",
            series,
            bars.len(),
            bars.first().map(|b| b.width).unwrap_or_default(),
            if animated { " (animated)" } else { "" }
        );
        trace_geometry("bars", series, &bars);
    }

    fn remove_bars(&mut self, series: &str) {
        self.counts.clears += 1;
        tracing::debug!("remove bars {}", series);
    }

    fn draw_axis(&mut self, ticks: Vec<AxisTick>) {
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        tracing::debug!("axis {}", labels.join(" "));
    }

    fn draw_legend(&mut self, legend: Option<&LegendLayout>) {
        match legend {
            Some(layout) => {
                self.counts.legends += 1;
                let rows: Vec<String> = layout
                    .rows
                    .iter()
                    .map(|row| format!("{}={}", row.name, row.value))
                    .collect();
                tracing::info!("legend at {:.0}px {}: {}", layout.line_x, layout.header, rows.join(", "));
            }
            None => tracing::debug!("legend hidden"),
        }
    }

    fn draw_activities(&mut self, overlays: &[ActivityOverlay]) {
        self.counts.overlays += 1;
        for overlay in overlays {
            tracing::debug!(
                "activity {} [{:.0}, {:.0}]px{}",
                overlay.label,
                overlay.left_px,
                overlay.right_px,
                if overlay.selected { " selected" } else { "" }
            );
        }
        trace_geometry("activities", "", overlays);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_draw_calls() {
        let mut surface = LogSurface::default();
        surface.draw_line("heart_rate", LinePath::default(), false);
        surface.clear_line("heart_rate");
        surface.draw_bars("steps", vec![], true);
        surface.remove_bars("steps");
        surface.draw_legend(None);

        assert_eq!(
            surface.counts(),
            DrawCounts {
                lines: 1,
                bars: 1,
                clears: 2,
                legends: 0,
                overlays: 0,
            }
        );
    }
}
