// Graph controller - Owns the view state and reacts to gestures, touches and data
use crate::application::data_provider::{ActivityRequest, DataRequest};
use crate::application::fetch_orchestrator::{
    ActivityTicket, FetchOrchestrator, FetchOutcome, FetchPlan, FetchTicket,
};
use crate::application::gesture::GestureTracker;
use crate::application::legend_presenter::{
    activity_overlays, hit_test, legend_layout, legend_rows, LegendPhase, LegendState,
};
use crate::application::scheduler::{Scheduler, TaskHandle};
use crate::application::tier_resolver::{resolve_tier, target_point_count};
use crate::application::windower::{bar_width, window_visible};
use crate::domain::activity::ActivityRegion;
use crate::domain::error::GraphError;
use crate::domain::interaction::{InteractionState, Signal};
use crate::domain::plot_item::{DrawContext, PlotItem};
use crate::domain::render::{ActivityOverlay, RenderSurface};
use crate::domain::tier::{DateGranularity, TierTable};
use crate::domain::time_point::{Dataset, DatasetTag, TimeDomain, TimePoint};
use crate::domain::viewport::{Viewport, ZoomTransform};
use std::collections::HashSet;
use std::time::Instant;

/// How datasets are fetched for the view.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPolicy {
    /// A coarse dataset for the whole range followed by a dense one. The dense
    /// set is shown once fewer than `zoom_threshold_minutes` are visible.
    TwoPhase {
        reduced_points: u32,
        full_points: u32,
        zoom_threshold_minutes: f64,
    },
    /// One dataset for the visible range, refetched when the zoom level
    /// crosses a tier threshold.
    Tiered(TierTable),
}

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub width_px: f64,
    pub height_px: f64,
    pub max_scale: f64,
    /// `None` asks the provider for every series.
    pub metrics: Option<Vec<String>>,
    pub double_tap_ms: i64,
    pub fling_window_ms: i64,
    pub fling_step_ms: i64,
    pub fling_decay: f64,
    pub fling_stop_ratio: f64,
    pub fling_max_ms: i64,
    pub legend_hide_ms: i64,
    pub legend_fade_ms: i64,
    pub legend_box_width: f64,
    pub legend_top: f64,
    pub tap_hold_slop_px: f64,
    pub policy: FetchPolicy,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            width_px: 800.0,
            height_px: 400.0,
            max_scale: 1000.0,
            metrics: None,
            double_tap_ms: 500,
            fling_window_ms: 250,
            fling_step_ms: 16,
            fling_decay: 0.85,
            fling_stop_ratio: 0.01,
            fling_max_ms: 800,
            legend_hide_ms: 3000,
            legend_fade_ms: 500,
            legend_box_width: 120.0,
            legend_top: 10.0,
            tap_hold_slop_px: 5.0,
            policy: FetchPolicy::TwoPhase {
                reduced_points: 100,
                full_points: 10_000,
                zoom_threshold_minutes: 100.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    FlingStep,
    LegendHide,
    LegendFadeComplete,
}

/// Work the controller hands back to whoever drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchData(FetchTicket, DataRequest),
    FetchActivities(ActivityTicket, ActivityRequest),
    Emit(Signal),
}

#[derive(Debug, Clone, Copy)]
struct Fling {
    velocity_ms: f64,
    initial_ms: f64,
    direction: f64,
    started_ms: i64,
}

pub struct GraphController<S: RenderSurface> {
    surface: S,
    settings: GraphSettings,
    items: Vec<PlotItem>,
    reduced: Option<Dataset>,
    full: Option<Dataset>,
    session_range: TimeDomain,
    viewport: Viewport,
    gestures: GestureTracker,
    fetches: FetchOrchestrator,
    scheduler: Scheduler<TimedAction>,
    fling: Option<Fling>,
    fling_task: Option<TaskHandle>,
    bar_width: f64,
    window_len: usize,
    last_end_scale: f64,
    zoom_enabled: bool,
    saved_transform: ZoomTransform,
    legend: LegendState,
    fade_task: Option<TaskHandle>,
    activities: Vec<ActivityRegion>,
    overlays: Vec<ActivityOverlay>,
    selected_activity: Option<String>,
    outbox: Vec<Command>,
    ready_sent: bool,
}

impl<S: RenderSurface> GraphController<S> {
    pub fn new(
        surface: S,
        settings: GraphSettings,
        items: Vec<PlotItem>,
        range: TimeDomain,
    ) -> Result<Self, GraphError> {
        if settings.width_px <= 0.0 || settings.height_px <= 0.0 {
            return Err(GraphError::Configuration(format!(
                "viewport size must be positive, got {}x{}",
                settings.width_px, settings.height_px
            )));
        }
        if settings.max_scale < 1.0 {
            return Err(GraphError::Configuration(format!(
                "max zoom scale must be at least 1, got {}",
                settings.max_scale
            )));
        }
        let mut names = HashSet::new();
        if let Some(item) = items.iter().find(|item| !names.insert(item.name.as_str())) {
            return Err(GraphError::Configuration(format!(
                "series {} is registered twice",
                item.name
            )));
        }

        let current_tier = match &settings.policy {
            FetchPolicy::Tiered(table) => Some(*table.coarsest()),
            FetchPolicy::TwoPhase { .. } => None,
        };

        Ok(Self {
            surface,
            viewport: Viewport::new(range, settings.width_px, settings.max_scale),
            gestures: GestureTracker::new(settings.double_tap_ms, settings.fling_window_ms),
            fetches: FetchOrchestrator::new(current_tier),
            bar_width: settings.width_px,
            settings,
            items,
            reduced: None,
            full: None,
            session_range: range,
            scheduler: Scheduler::default(),
            fling: None,
            fling_task: None,
            window_len: 0,
            last_end_scale: 1.0,
            zoom_enabled: true,
            saved_transform: ZoomTransform::default(),
            legend: LegendState::default(),
            fade_task: None,
            activities: Vec::new(),
            overlays: Vec::new(),
            selected_activity: None,
            outbox: Vec::new(),
            ready_sent: false,
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn items(&self) -> &[PlotItem] {
        &self.items
    }

    pub fn state(&self) -> InteractionState {
        self.gestures.state()
    }

    pub fn session_range(&self) -> TimeDomain {
        self.session_range
    }

    pub fn visible_domain(&self) -> TimeDomain {
        self.viewport.visible_domain()
    }

    pub fn transform(&self) -> ZoomTransform {
        self.viewport.transform()
    }

    pub fn reduced(&self) -> Option<&Dataset> {
        self.reduced.as_ref()
    }

    pub fn full(&self) -> Option<&Dataset> {
        self.full.as_ref()
    }

    pub fn zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    pub fn legend_phase(&self) -> LegendPhase {
        self.legend.phase
    }

    pub fn selected_activity(&self) -> Option<&str> {
        self.selected_activity.as_deref()
    }

    pub fn fetch_latency_ms(&self, tag: DatasetTag) -> Option<i64> {
        self.fetches.last_latency_ms(tag)
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.scheduler.next_deadline()
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    /// Announces the view and loads the session range.
    pub fn start(&mut self, now_ms: i64) {
        if !self.ready_sent {
            self.ready_sent = true;
            self.outbox.push(Command::Emit(Signal::ViewReady));
        }
        self.load_range(self.session_range, now_ms);
    }

    /// Replaces the session range and starts loading it from scratch.
    pub fn load_range(&mut self, range: TimeDomain, now_ms: i64) {
        tracing::info!(
            "Loading range {} - {}",
            range.start_ms,
            range.end_ms
        );

        self.clear_graph();
        self.session_range = range;
        self.viewport.reset(range);
        self.fetches.invalidate();
        self.scheduler.clear();
        self.fling = None;
        self.fling_task = None;
        self.fade_task = None;
        self.gestures.set_state(InteractionState::Idle);
        self.last_end_scale = 1.0;
        self.window_len = 0;
        self.zoom_enabled = true;
        self.legend = LegendState::default();
        self.surface.draw_legend(None);
        self.activities.clear();
        self.overlays.clear();
        self.selected_activity = None;
        self.surface.draw_activities(&[]);
        self.reduced = None;
        self.full = None;

        let plan = match &self.settings.policy {
            FetchPolicy::TwoPhase { reduced_points, .. } => self.fetches.request_range(
                range,
                self.settings.metrics.as_deref(),
                *reduced_points,
                DatasetTag::Reduced,
                DateGranularity::Minute,
                now_ms,
            ),
            FetchPolicy::Tiered(table) => {
                let tier = *table.coarsest();
                self.fetches.set_current_tier(tier);
                self.fetches.request_range(
                    range,
                    self.settings.metrics.as_deref(),
                    tier.point_count,
                    DatasetTag::Tier(tier.threshold_ms),
                    tier.granularity,
                    now_ms,
                )
            }
        };
        self.dispatch(plan, now_ms);

        let (ticket, request) = self.fetches.request_activities(range);
        self.outbox.push(Command::FetchActivities(ticket, request));
    }

    /// Moves the session range by whole spans, `-1` for the previous one.
    pub fn shift_range(&mut self, steps: i64, now_ms: i64) {
        let range = self.session_range;
        self.load_range(range.shifted(range.duration_ms() * steps), now_ms);
    }

    fn clear_graph(&mut self) {
        for item in &self.items {
            item.kind.clear(&item.name, &mut self.surface);
        }
    }

    fn dispatch(&mut self, plan: FetchPlan, now_ms: i64) {
        match plan {
            FetchPlan::Immediate(ticket, payload) => {
                let result = self.fetches.accept_payload(&ticket, payload, now_ms);
                self.handle_outcome(ticket, result, now_ms);
            }
            FetchPlan::Dispatch(ticket, request) => {
                self.outbox.push(Command::FetchData(ticket, request));
            }
        }
    }

    pub fn on_data_response(&mut self, ticket: FetchTicket, result: anyhow::Result<String>, now_ms: i64) {
        let json = match result {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Data provider failed for {} fetch: {:#}", ticket.tag, e);
                return;
            }
        };
        let outcome = self.fetches.accept(&ticket, &json, now_ms);
        self.handle_outcome(ticket, outcome, now_ms);
    }

    fn handle_outcome(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<FetchOutcome, GraphError>,
        now_ms: i64,
    ) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e @ GraphError::StaleResponse { .. }) => {
                tracing::debug!("Discarding {}", e);
                return;
            }
            Err(e) => {
                tracing::warn!("Dropping {} response: {}", ticket.tag, e);
                return;
            }
        };

        // The dense request goes out before the coarse data is shown.
        let chained = match (&self.settings.policy, ticket.tag) {
            (FetchPolicy::TwoPhase { full_points, .. }, DatasetTag::Reduced) => {
                Some(self.fetches.request_range(
                    ticket.range,
                    self.settings.metrics.as_deref(),
                    *full_points,
                    DatasetTag::Full,
                    DateGranularity::Minute,
                    now_ms,
                ))
            }
            _ => None,
        };

        match outcome {
            FetchOutcome::Empty(range) => self.apply_empty(range),
            FetchOutcome::Loaded(dataset) => {
                match dataset.tag {
                    DatasetTag::Reduced => self.reduced = Some(dataset),
                    DatasetTag::Full | DatasetTag::Tier(_) => self.full = Some(dataset),
                }
                self.redraw(true);
            }
        }

        if let Some(plan) = chained {
            self.dispatch(plan, now_ms);
        }
    }

    /// Zero-valued two point datasets spanning `range`, so axes and
    /// interactions keep working without data. Only a load of the whole
    /// session range resets the zoom; an empty zoomed-in tier keeps it.
    fn apply_empty(&mut self, range: TimeDomain) {
        tracing::debug!("Empty result for {} - {}", range.start_ms, range.end_ms);

        let names: Vec<&str> = self
            .items
            .iter()
            .filter(|item| item.kind.carries_data())
            .map(|item| item.name.as_str())
            .collect();
        let reduced = Dataset::placeholder(range, DatasetTag::Reduced, names.iter().copied());
        let full = Dataset::placeholder(range, DatasetTag::Full, names.iter().copied());
        self.reduced = Some(reduced);
        self.full = Some(full);

        if range == self.session_range {
            self.viewport.reset(range);
            self.last_end_scale = 1.0;
        }
        self.redraw(false);
    }

    pub fn on_activities_response(&mut self, ticket: ActivityTicket, result: anyhow::Result<String>) {
        let json = match result {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Data provider failed for activity fetch: {:#}", e);
                return;
            }
        };

        match self.fetches.accept_activities(&ticket, &json) {
            Ok(activities) => {
                tracing::debug!("Loaded {} activities", activities.len());
                self.activities = activities;
                self.draw_overlays();
            }
            Err(e @ GraphError::StaleActivities { .. }) => tracing::debug!("Discarding {}", e),
            Err(e) => tracing::warn!("Dropping activity response: {}", e),
        }
    }

    fn shows_reduced(&self, domain: TimeDomain) -> bool {
        let has_points = |dataset: &Option<Dataset>| dataset.as_ref().is_some_and(|d| !d.is_empty());

        match &self.settings.policy {
            FetchPolicy::TwoPhase {
                zoom_threshold_minutes,
                ..
            } => {
                has_points(&self.reduced)
                    && (domain.duration_minutes() > *zoom_threshold_minutes
                        || !has_points(&self.full))
            }
            FetchPolicy::Tiered(_) => false,
        }
    }

    fn visible_points(&self) -> &[TimePoint] {
        let domain = self.viewport.visible_domain();
        let dataset = if self.shows_reduced(domain) {
            &self.reduced
        } else {
            &self.full
        };
        dataset
            .as_ref()
            .map(|d| window_visible(d.points(), domain).slice(d.points()))
            .unwrap_or(&[])
    }

    fn redraw(&mut self, animated: bool) {
        self.render(None, animated);
        self.draw_overlays();
        self.draw_legend();
    }

    /// Draws every visible item, or just `only`.
    fn render(&mut self, only: Option<usize>, animated: bool) {
        let started = Instant::now();
        let x_scale = self.viewport.time_scale();
        let dataset = if self.shows_reduced(x_scale.domain) {
            self.reduced.as_ref()
        } else {
            self.full.as_ref()
        };
        let Some(dataset) = dataset else {
            self.window_len = 0;
            return;
        };

        let window = window_visible(dataset.points(), x_scale.domain);
        if !self.gestures.is_panning() {
            self.bar_width = bar_width(self.viewport.width_px(), &window);
        }
        self.window_len = window.len();
        let visible = window.slice(dataset.points());

        for (index, item) in self.items.iter().enumerate() {
            if !item.visible || only.is_some_and(|i| i != index) {
                continue;
            }
            let ctx = DrawContext {
                series: &item.name,
                visible,
                x_scale,
                y_scale: item.y_scale,
                bar_width: self.bar_width,
                height_px: self.settings.height_px,
            };
            item.kind.draw(&ctx, &mut self.surface, animated);
        }

        tracing::debug!(
            "Drew {} of {} {} points in {:?}",
            window.len(),
            dataset.len(),
            dataset.tag,
            started.elapsed()
        );
    }

    fn draw_overlays(&mut self) {
        let x_scale = self.viewport.time_scale();
        self.overlays = activity_overlays(
            &self.activities,
            &x_scale,
            self.selected_activity.as_deref(),
        );
        self.surface.draw_activities(&self.overlays);
    }

    fn draw_legend(&mut self) {
        if !self.legend.is_visible() {
            self.surface.draw_legend(None);
            return;
        }

        let x_px = self.legend.x_px;
        let time_ms = self.viewport.time_scale().invert(x_px);
        let rows = legend_rows(self.visible_points(), time_ms, &self.items);
        let layout = legend_layout(
            x_px,
            time_ms,
            rows,
            self.settings.legend_box_width,
            self.settings.legend_top,
        );
        self.surface.draw_legend(Some(&layout));
    }

    pub fn set_series_visible(&mut self, name: &str, visible: bool) -> Result<(), GraphError> {
        let index = self
            .items
            .iter()
            .position(|item| item.name == name)
            .ok_or_else(|| GraphError::UnknownSeries(name.to_string()))?;

        if self.items[index].visible == visible {
            return Ok(());
        }
        self.items[index].visible = visible;

        if visible {
            self.render(Some(index), false);
        } else {
            let item = &self.items[index];
            item.kind.clear(&item.name, &mut self.surface);
        }
        if self.legend.is_visible() {
            self.draw_legend();
        }
        Ok(())
    }

    pub fn set_zoom_enabled(&mut self, enabled: bool) {
        if !enabled && self.zoom_enabled {
            self.saved_transform = self.viewport.transform();
        }
        self.zoom_enabled = enabled;
    }

    pub fn gesture_start(&mut self) {
        if self.fling.is_some() {
            self.stop_fling();
        }
        let transform = self.viewport.transform();
        self.gestures
            .start(transform.scale, self.viewport.visible_domain().start_ms);
    }

    pub fn gesture_update(&mut self, requested: ZoomTransform, now_ms: i64) {
        if !self.zoom_enabled {
            self.viewport.apply(self.saved_transform);
            return;
        }

        let previous = self.viewport.transform();
        let transform = self.viewport.apply(requested);
        self.gestures.update(
            transform.scale,
            self.viewport.visible_domain().start_ms,
            now_ms,
        );

        if !transform.is_identity_scale() || transform != previous {
            self.redraw(false);
        }
    }

    pub fn gesture_end(&mut self, now_ms: i64) {
        match self.gestures.end(now_ms) {
            Some(start) => {
                tracing::debug!(
                    "Fling at {:.0} ms per step, direction {}",
                    start.velocity_ms,
                    start.direction
                );
                self.fling = Some(Fling {
                    velocity_ms: start.velocity_ms,
                    initial_ms: start.velocity_ms,
                    direction: start.direction,
                    started_ms: now_ms,
                });
                self.fling_task = Some(self.scheduler.schedule(
                    now_ms,
                    self.settings.fling_step_ms,
                    TimedAction::FlingStep,
                ));
            }
            None => self.redraw(false),
        }

        self.switch_tier(now_ms);
    }

    /// Refetches for the visible range when the zoom level calls for another tier.
    fn switch_tier(&mut self, now_ms: i64) {
        let FetchPolicy::Tiered(table) = &self.settings.policy else {
            return;
        };

        let scale = self.viewport.transform().scale;
        let zoom_factor = scale / self.last_end_scale;
        self.last_end_scale = scale;

        let domain = self.viewport.visible_domain();
        let visible_ms = domain.duration_ms().max(0) as u64;
        let current = self
            .fetches
            .current_tier()
            .copied()
            .unwrap_or(*table.coarsest());
        let tier = *resolve_tier(table, visible_ms, zoom_factor, &current);

        let covered = self.full.as_ref().is_some_and(|d| d.range.covers(domain));
        if tier == current && zoom_factor <= 1.0 && self.window_len > 0 && covered {
            return;
        }

        tracing::debug!(
            "Tier {} -> {} for {} ms visible (zoom factor {:.2})",
            current.threshold_ms,
            tier.threshold_ms,
            visible_ms,
            zoom_factor
        );
        self.fetches.set_current_tier(tier);
        let plan = self.fetches.request_range(
            domain,
            self.settings.metrics.as_deref(),
            target_point_count(visible_ms, &tier),
            DatasetTag::Tier(tier.threshold_ms),
            tier.granularity,
            now_ms,
        );
        self.dispatch(plan, now_ms);
    }

    fn fling_step(&mut self, now_ms: i64) {
        let Some(fling) = self.fling.as_mut() else {
            return;
        };

        let settled = fling.velocity_ms < fling.initial_ms * self.settings.fling_stop_ratio;
        if settled || now_ms - fling.started_ms >= self.settings.fling_max_ms {
            self.stop_fling();
            self.switch_tier(now_ms);
            return;
        }

        let delta_ms = fling.velocity_ms * fling.direction;
        fling.velocity_ms *= self.settings.fling_decay;

        self.viewport.shift_by(delta_ms);
        self.redraw(false);
        self.fling_task = Some(self.scheduler.schedule(
            now_ms,
            self.settings.fling_step_ms,
            TimedAction::FlingStep,
        ));
    }

    fn stop_fling(&mut self) {
        if let Some(task) = self.fling_task.take() {
            self.scheduler.cancel(task);
        }
        self.fling = None;
        self.gestures.set_state(InteractionState::Idle);
        self.redraw(false);
    }

    /// Sets the transform so `target` is visible, clamped to the zoom bounds.
    pub fn zoom_to_domain(&mut self, target: TimeDomain, now_ms: i64) {
        self.gestures.set_state(InteractionState::Zooming);
        self.viewport.zoom_to(target);
        self.redraw(true);
        self.gestures.set_state(InteractionState::Idle);
        self.switch_tier(now_ms);
    }

    pub fn zoom_to_full(&mut self, now_ms: i64) {
        self.zoom_to_domain(self.viewport.base(), now_ms);
    }

    /// Runs every timed action due at `now_ms`.
    pub fn advance(&mut self, now_ms: i64) {
        for action in self.scheduler.take_due(now_ms) {
            match action {
                TimedAction::FlingStep => self.fling_step(now_ms),
                TimedAction::LegendHide => self.begin_legend_fade_out(now_ms),
                TimedAction::LegendFadeComplete => self.complete_legend_fade(),
            }
        }
    }

    pub fn touch_start(&mut self, x_px: f64, touches: usize, now_ms: i64) {
        let double_tap = self.gestures.register_touch(now_ms, touches);

        if let Some(task) = self.legend.hide_task.take() {
            self.scheduler.cancel(task);
        }
        if self.legend.is_visible() {
            self.close_legend();
        }
        self.legend.touch_origin_px = Some(x_px);

        if double_tap {
            tracing::debug!("Double tap, zooming to full range");
            self.zoom_to_full(now_ms);
        }
    }

    pub fn touch_move(&mut self, x_px: f64) {
        self.gestures.cancel_tap();
        if matches!(self.legend.phase, LegendPhase::FadingIn | LegendPhase::Pinned) {
            self.legend.x_px = x_px;
            self.draw_legend();
        }
    }

    pub fn touch_end(&mut self, now_ms: i64) {
        self.legend.touch_origin_px = None;
        if matches!(self.legend.phase, LegendPhase::FadingIn | LegendPhase::Pinned) {
            self.legend.hide_task = Some(self.scheduler.schedule(
                now_ms,
                self.settings.legend_hide_ms,
                TimedAction::LegendHide,
            ));
        }
    }

    /// Shows the legend unless the finger wandered since the touch began.
    pub fn tap_hold(&mut self, x_px: f64, now_ms: i64) {
        if !self.legend.held_still(x_px, self.settings.tap_hold_slop_px) {
            return;
        }

        self.gestures.cancel_tap();
        self.legend.phase = LegendPhase::FadingIn;
        self.legend.x_px = x_px;
        self.draw_legend();
        self.schedule_fade(now_ms);
    }

    fn schedule_fade(&mut self, now_ms: i64) {
        if let Some(task) = self.fade_task.take() {
            self.scheduler.cancel(task);
        }
        self.fade_task = Some(self.scheduler.schedule(
            now_ms,
            self.settings.legend_fade_ms,
            TimedAction::LegendFadeComplete,
        ));
    }

    fn begin_legend_fade_out(&mut self, now_ms: i64) {
        self.legend.hide_task = None;
        if self.legend.is_visible() {
            self.legend.phase = LegendPhase::FadingOut;
            self.schedule_fade(now_ms);
        }
    }

    fn complete_legend_fade(&mut self) {
        self.fade_task = None;
        match self.legend.phase {
            LegendPhase::FadingIn => {
                self.legend.phase = LegendPhase::Pinned;
                self.set_zoom_enabled(false);
            }
            LegendPhase::FadingOut => self.close_legend(),
            LegendPhase::Hidden | LegendPhase::Pinned => {}
        }
    }

    fn close_legend(&mut self) {
        if let Some(task) = self.fade_task.take() {
            self.scheduler.cancel(task);
        }
        self.legend.phase = LegendPhase::Hidden;
        self.surface.draw_legend(None);
        self.set_zoom_enabled(true);
    }

    /// Selects the activity under the pointer, or clears the selection.
    pub fn click(&mut self, x_px: f64) {
        match hit_test(&self.overlays, x_px).map(|overlay| overlay.id.clone()) {
            Some(id) => {
                tracing::debug!("Selected {}", id);
                self.selected_activity = Some(id.clone());
                self.outbox.push(Command::Emit(Signal::ItemSelected(id)));
            }
            None => self.selected_activity = None,
        }
        self.draw_overlays();
    }
}
