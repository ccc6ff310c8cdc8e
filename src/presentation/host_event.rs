// Host events - Gestures, touches and commands sent by the embedding view
use crate::application::graph_controller::GraphController;
use crate::domain::render::RenderSurface;
use crate::domain::time_point::TimeDomain;
use crate::domain::viewport::ZoomTransform;
use crate::infrastructure::bridge_codec::parse_date;
use anyhow::Context;
use serde::Deserialize;

/// One line of host input, e.g. `{"event": "touch_start", "x_px": 120.0}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    GestureStart,
    GestureUpdate {
        scale: f64,
        translate_px: f64,
    },
    GestureEnd,
    TouchStart {
        x_px: f64,
        #[serde(default = "single_touch")]
        touches: usize,
    },
    TouchMove {
        x_px: f64,
    },
    TouchEnd,
    TapHold {
        x_px: f64,
    },
    Click {
        x_px: f64,
    },
    SetSeriesVisible {
        name: String,
        visible: bool,
    },
    SetZoomEnabled {
        enabled: bool,
    },
    LoadRange {
        start: String,
        end: String,
    },
    ShiftRange {
        steps: i64,
    },
    ZoomToDomain {
        start: String,
        end: String,
    },
    ZoomToFull,
}

fn single_touch() -> usize {
    1
}

fn parse_domain(start: &str, end: &str) -> anyhow::Result<TimeDomain> {
    let start_ms = parse_date(start).with_context(|| format!("Invalid start date: {}", start))?;
    let end_ms = parse_date(end).with_context(|| format!("Invalid end date: {}", end))?;
    if end_ms <= start_ms {
        anyhow::bail!("End {} is not after start {}", end, start);
    }
    Ok(TimeDomain::new(start_ms, end_ms))
}

/// Feeds one host event to the controller.
pub fn apply_event<S: RenderSurface>(
    controller: &mut GraphController<S>,
    event: HostEvent,
    now_ms: i64,
) -> anyhow::Result<()> {
    match event {
        HostEvent::GestureStart => controller.gesture_start(),
        HostEvent::GestureUpdate {
            scale,
            translate_px,
        } => controller.gesture_update(ZoomTransform::new(scale, translate_px), now_ms),
        HostEvent::GestureEnd => controller.gesture_end(now_ms),
        HostEvent::TouchStart { x_px, touches } => controller.touch_start(x_px, touches, now_ms),
        HostEvent::TouchMove { x_px } => controller.touch_move(x_px),
        HostEvent::TouchEnd => controller.touch_end(now_ms),
        HostEvent::TapHold { x_px } => controller.tap_hold(x_px, now_ms),
        HostEvent::Click { x_px } => controller.click(x_px),
        HostEvent::SetSeriesVisible { name, visible } => {
            controller.set_series_visible(&name, visible)?
        }
        HostEvent::SetZoomEnabled { enabled } => controller.set_zoom_enabled(enabled),
        HostEvent::LoadRange { start, end } => {
            controller.load_range(parse_domain(&start, &end)?, now_ms)
        }
        HostEvent::ShiftRange { steps } => controller.shift_range(steps, now_ms),
        HostEvent::ZoomToDomain { start, end } => {
            controller.zoom_to_domain(parse_domain(&start, &end)?, now_ms)
        }
        HostEvent::ZoomToFull => controller.zoom_to_full(now_ms),
    }
    Ok(())
}
