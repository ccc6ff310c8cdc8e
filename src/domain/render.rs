// Render output handed to the host surface
use serde::Serialize;

/// A polyline split into segments wherever a sample has no drawable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinePath {
    pub segments: Vec<Vec<(f64, f64)>>,
}

impl LinePath {
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub x_px: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendLayout {
    pub line_x: f64,
    pub box_left: f64,
    pub top: f64,
    pub header: String,
    pub rows: Vec<LegendRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityOverlay {
    pub id: String,
    pub label: String,
    pub left_px: f64,
    pub right_px: f64,
    pub selected: bool,
}

impl ActivityOverlay {
    pub fn contains(&self, x_px: f64) -> bool {
        x_px >= self.left_px && x_px <= self.right_px
    }
}

/// Drawing backend owned by the host. Everything the graph shows goes through here.
pub trait RenderSurface {
    fn draw_line(&mut self, series: &str, path: LinePath, animated: bool);
    fn clear_line(&mut self, series: &str);
    fn draw_bars(&mut self, series: &str, bars: Vec<BarRect>, animated: bool);
    fn remove_bars(&mut self, series: &str);
    fn draw_axis(&mut self, ticks: Vec<AxisTick>);
    fn draw_legend(&mut self, legend: Option<&LegendLayout>);
    fn draw_activities(&mut self, overlays: &[ActivityOverlay]);
}
