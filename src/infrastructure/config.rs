use crate::application::graph_controller::{FetchPolicy, GraphSettings};
use crate::domain::plot_item::{LegendFormat, PlotItem, SeriesKind};
use crate::domain::tier::{DownsamplingTier, TierTable};
use crate::domain::time_point::TimeDomain;
use crate::domain::viewport::LinearScale;
use crate::infrastructure::bridge_codec::parse_date;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    pub view: ViewSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    pub fetch: FetchConfig,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    pub session: SessionConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewSettings {
    pub width_px: f64,
    pub height_px: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
    #[serde(default = "default_legend_box_width")]
    pub legend_box_width: f64,
    #[serde(default)]
    pub legend_top: f64,
    /// Series requested from the provider; all of them when absent.
    pub metrics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingSettings {
    pub double_tap_ms: i64,
    pub fling_window_ms: i64,
    pub fling_step_ms: i64,
    pub fling_decay: f64,
    pub fling_stop_ratio: f64,
    pub fling_max_ms: i64,
    pub legend_hide_ms: i64,
    pub legend_fade_ms: i64,
    pub tap_hold_slop_px: f64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        let defaults = GraphSettings::default();
        Self {
            double_tap_ms: defaults.double_tap_ms,
            fling_window_ms: defaults.fling_window_ms,
            fling_step_ms: defaults.fling_step_ms,
            fling_decay: defaults.fling_decay,
            fling_stop_ratio: defaults.fling_stop_ratio,
            fling_max_ms: defaults.fling_max_ms,
            legend_hide_ms: defaults.legend_hide_ms,
            legend_fade_ms: defaults.legend_fade_ms,
            tap_hold_slop_px: defaults.tap_hold_slop_px,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FetchConfig {
    TwoPhase {
        reduced_points: u32,
        full_points: u32,
        zoom_threshold_minutes: f64,
    },
    Tiered {
        tiers: Vec<DownsamplingTier>,
    },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKindConfig {
    Line,
    Bar,
    Axis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub name: String,
    pub kind: SeriesKindConfig,
    #[serde(default)]
    pub y_min: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
    #[serde(default)]
    pub legend: LegendFormat,
    #[serde(default)]
    pub blank_zero: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Fixture {
        data_path: String,
        activities_path: Option<String>,
        #[serde(default)]
        latency_ms: u64,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_max_scale() -> f64 {
    1000.0
}

fn default_legend_box_width() -> f64 {
    120.0
}

fn default_y_max() -> f64 {
    100.0
}

fn default_visible() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_view_config() -> anyhow::Result<ViewConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/graph"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn parse_view_config(toml: &str) -> anyhow::Result<ViewConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl ViewConfig {
    /// Rejects settings the graph cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.view.width_px <= 0.0 || self.view.height_px <= 0.0 {
            bail!(
                "view size must be positive, got {}x{}",
                self.view.width_px,
                self.view.height_px
            );
        }
        if self.view.max_scale < 1.0 {
            bail!("max_scale must be at least 1, got {}", self.view.max_scale);
        }
        if self.timing.fling_decay <= 0.0 || self.timing.fling_decay >= 1.0 {
            bail!("fling_decay must be in (0, 1), got {}", self.timing.fling_decay);
        }
        if self.series.is_empty() {
            bail!("no series configured");
        }

        let mut names = HashSet::new();
        for series in &self.series {
            if !names.insert(series.name.as_str()) {
                bail!("series {} is configured twice", series.name);
            }
            if series.y_max <= series.y_min {
                bail!("series {} has an empty y range", series.name);
            }
            if let LegendFormat::Scientific { divisor } = series.legend {
                if divisor == 0.0 {
                    bail!("series {} has a zero legend divisor", series.name);
                }
            }
        }

        let range = self.session_range()?;
        if range.end_ms <= range.start_ms {
            bail!("session end {} is not after start {}", self.session.end, self.session.start);
        }

        self.fetch_policy()?;
        Ok(())
    }

    pub fn session_range(&self) -> anyhow::Result<TimeDomain> {
        let start = parse_date(&self.session.start)
            .with_context(|| format!("Invalid session start: {}", self.session.start))?;
        let end = parse_date(&self.session.end)
            .with_context(|| format!("Invalid session end: {}", self.session.end))?;
        Ok(TimeDomain::new(start, end))
    }

    pub fn fetch_policy(&self) -> anyhow::Result<FetchPolicy> {
        match &self.fetch {
            FetchConfig::TwoPhase {
                reduced_points,
                full_points,
                zoom_threshold_minutes,
            } => {
                if *reduced_points == 0 || full_points < reduced_points {
                    bail!(
                        "two-phase point counts must satisfy 0 < reduced ({}) <= full ({})",
                        reduced_points,
                        full_points
                    );
                }
                Ok(FetchPolicy::TwoPhase {
                    reduced_points: *reduced_points,
                    full_points: *full_points,
                    zoom_threshold_minutes: *zoom_threshold_minutes,
                })
            }
            FetchConfig::Tiered { tiers } => {
                let table = TierTable::new(tiers.clone()).context("Invalid tier table")?;
                Ok(FetchPolicy::Tiered(table))
            }
        }
    }

    pub fn graph_settings(&self) -> anyhow::Result<GraphSettings> {
        Ok(GraphSettings {
            width_px: self.view.width_px,
            height_px: self.view.height_px,
            max_scale: self.view.max_scale,
            metrics: self.view.metrics.clone(),
            double_tap_ms: self.timing.double_tap_ms,
            fling_window_ms: self.timing.fling_window_ms,
            fling_step_ms: self.timing.fling_step_ms,
            fling_decay: self.timing.fling_decay,
            fling_stop_ratio: self.timing.fling_stop_ratio,
            fling_max_ms: self.timing.fling_max_ms,
            legend_hide_ms: self.timing.legend_hide_ms,
            legend_fade_ms: self.timing.legend_fade_ms,
            legend_box_width: self.view.legend_box_width,
            legend_top: self.view.legend_top,
            tap_hold_slop_px: self.timing.tap_hold_slop_px,
            policy: self.fetch_policy()?,
        })
    }

    pub fn plot_items(&self) -> Vec<PlotItem> {
        self.series
            .iter()
            .map(|series| {
                let kind = match series.kind {
                    SeriesKindConfig::Line => SeriesKind::Line,
                    SeriesKindConfig::Bar => SeriesKind::Bar,
                    SeriesKindConfig::Axis => SeriesKind::Axis,
                };
                let y_scale =
                    LinearScale::new((series.y_min, series.y_max), self.view.height_px, 0.0);
                let mut item = PlotItem::new(series.name.to_lowercase(), kind, y_scale)
                    .with_legend(series.legend, series.blank_zero);
                item.visible = series.visible;
                item
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [view]
        width_px = 800
        height_px = 400

        [timing]
        legend_hide_ms = 1000

        [fetch]
        policy = "two_phase"
        reduced_points = 100
        full_points = 10000
        zoom_threshold_minutes = 100

        [[series]]
        name = "heart_rate"
        kind = "line"
        y_max = 200
        blank_zero = true

        [[series]]
        name = "Steps"
        kind = "bar"
        y_max = 250
        legend = { style = "scientific", divisor = 1000.0 }

        [session]
        start = "2015-03-03 00:00Z"
        end = "2015-03-04 00:00Z"

        [provider]
        kind = "fixture"
        data_path = "config/fixtures/health.json"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config = parse_view_config(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.view.max_scale, 1000.0);
        assert_eq!(config.timing.legend_hide_ms, 1000);
        assert_eq!(config.timing.double_tap_ms, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.session_range().unwrap().duration_ms(),
            86_400_000
        );
        assert!(matches!(config.provider, ProviderConfig::Fixture { latency_ms: 0, .. }));

        let items = config.plot_items();
        assert_eq!(items[1].name, "steps");
        assert_eq!(
            items[1].legend_format,
            LegendFormat::Scientific { divisor: 1000.0 }
        );
        assert!(items[0].blank_zero);
    }

    #[test]
    fn test_tiered_policy_from_config() {
        let toml = SAMPLE.replace(
            r#"policy = "two_phase"
        reduced_points = 100
        full_points = 10000
        zoom_threshold_minutes = 100"#,
            r#"policy = "tiered"
        tiers = [
            { threshold_ms = 2629746000, point_count = 31 },
            { threshold_ms = 31556952000, point_count = 70, granularity = "second" },
        ]"#,
        );
        let config = parse_view_config(&toml).unwrap();

        let FetchPolicy::Tiered(table) = config.fetch_policy().unwrap() else {
            panic!("expected a tiered policy");
        };
        assert_eq!(table.tiers().len(), 2);
    }

    #[test]
    fn test_unsorted_tiers_fail_validation() {
        let toml = SAMPLE.replace(
            r#"policy = "two_phase"
        reduced_points = 100
        full_points = 10000
        zoom_threshold_minutes = 100"#,
            r#"policy = "tiered"
        tiers = [
            { threshold_ms = 31556952000, point_count = 70 },
            { threshold_ms = 2629746000, point_count = 31 },
        ]"#,
        );
        let config = parse_view_config(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_session_fails_validation() {
        let toml = SAMPLE.replace(
            r#"end = "2015-03-04 00:00Z""#,
            r#"end = "2015-03-02 00:00Z""#,
        );
        let config = parse_view_config(&toml).unwrap();
        assert!(config.validate().is_err());
    }
}
