// Session runtime - Drives one graph controller from host events, provider replies and timers
use crate::application::data_provider::DataProvider;
use crate::application::fetch_orchestrator::{ActivityTicket, FetchTicket};
use crate::application::graph_controller::{Command, GraphController};
use crate::domain::interaction::Signal;
use crate::domain::render::RenderSurface;
use crate::presentation::host_event::{apply_event, HostEvent};
use futures::future::OptionFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

enum ProviderReply {
    Data(FetchTicket, anyhow::Result<String>),
    Activities(ActivityTicket, anyhow::Result<String>),
}

pub struct Session<S: RenderSurface> {
    controller: GraphController<S>,
    provider: Arc<dyn DataProvider>,
    epoch: Instant,
    in_flight: usize,
}

impl<S: RenderSurface> Session<S> {
    pub fn new(controller: GraphController<S>, provider: Arc<dyn DataProvider>) -> Self {
        Self {
            controller,
            provider,
            epoch: Instant::now(),
            in_flight: 0,
        }
    }

    fn now_ms(&self) -> i64 {
        self.epoch.elapsed().as_millis() as i64
    }

    fn deadline(&self, ms: i64) -> Instant {
        self.epoch + Duration::from_millis(ms.max(0) as u64)
    }

    /// Runs until the host closes its event channel and every fetch and
    /// timer has settled. Returns the controller for inspection.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<HostEvent>,
        signals: mpsc::Sender<Signal>,
    ) -> anyhow::Result<GraphController<S>> {
        let (reply_tx, mut replies) = mpsc::unbounded_channel();
        let mut events_open = true;

        tracing::info!("Graph session started");
        let now = self.now_ms();
        self.controller.start(now);
        self.flush(&reply_tx, &signals).await;

        loop {
            let deadline = self.controller.next_deadline();
            if !events_open && self.in_flight == 0 && deadline.is_none() {
                break;
            }
            let timer: OptionFuture<_> = deadline.map(|ms| sleep_until(self.deadline(ms))).into();

            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        tracing::debug!("Host event {:?}", event);
                        let now = self.now_ms();
                        if let Err(e) = apply_event(&mut self.controller, event, now) {
                            tracing::warn!("Rejected host event: {:#}", e);
                        }
                    }
                    None => {
                        tracing::debug!("Host closed the event channel");
                        events_open = false;
                    }
                },
                Some(reply) = replies.recv() => {
                    self.in_flight -= 1;
                    let now = self.now_ms();
                    match reply {
                        ProviderReply::Data(ticket, result) => {
                            self.controller.on_data_response(ticket, result, now)
                        }
                        ProviderReply::Activities(ticket, result) => {
                            self.controller.on_activities_response(ticket, result)
                        }
                    }
                },
                Some(()) = timer => {
                    let now = self.now_ms();
                    self.controller.advance(now);
                },
            }

            self.flush(&reply_tx, &signals).await;
        }

        tracing::info!("Graph session finished");
        Ok(self.controller)
    }

    /// Starts provider calls and forwards signals queued by the controller.
    async fn flush(
        &mut self,
        replies: &mpsc::UnboundedSender<ProviderReply>,
        signals: &mpsc::Sender<Signal>,
    ) {
        for command in self.controller.drain_commands() {
            match command {
                Command::FetchData(ticket, request) => {
                    self.in_flight += 1;
                    let provider = self.provider.clone();
                    let tx = replies.clone();
                    tokio::spawn(async move {
                        let result = provider.load_data(&request).await;
                        let _ = tx.send(ProviderReply::Data(ticket, result));
                    });
                }
                Command::FetchActivities(ticket, request) => {
                    self.in_flight += 1;
                    let provider = self.provider.clone();
                    let tx = replies.clone();
                    tokio::spawn(async move {
                        let result = provider.load_activities(&request).await;
                        let _ = tx.send(ProviderReply::Activities(ticket, result));
                    });
                }
                Command::Emit(signal) => {
                    if signals.send(signal).await.is_err() {
                        tracing::debug!("Signal receiver dropped");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_provider::{ActivityRequest, DataRequest};
    use crate::application::graph_controller::GraphSettings;
    use crate::domain::plot_item::{PlotItem, SeriesKind};
    use crate::domain::render::{ActivityOverlay, AxisTick, BarRect, LegendLayout, LinePath};
    use crate::domain::time_point::{DatasetTag, TimeDomain, TimePoint};
    use crate::domain::viewport::LinearScale;
    use crate::infrastructure::fixture_provider::FixtureProvider;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // 2015-03-03 00:00Z
    const MARCH_3: i64 = 1_425_340_800_000;
    const DAY_MS: i64 = 86_400_000;

    #[derive(Default)]
    struct NullSurface;

    impl RenderSurface for NullSurface {
        fn draw_line(&mut self, _series: &str, _path: LinePath, _animated: bool) {}
        fn clear_line(&mut self, _series: &str) {}
        fn draw_bars(&mut self, _series: &str, _bars: Vec<BarRect>, _animated: bool) {}
        fn remove_bars(&mut self, _series: &str) {}
        fn draw_axis(&mut self, _ticks: Vec<AxisTick>) {}
        fn draw_legend(&mut self, _legend: Option<&LegendLayout>) {}
        fn draw_activities(&mut self, _overlays: &[ActivityOverlay]) {}
    }

    /// Counts calls and delegates to a fixture.
    struct CountingProvider {
        inner: FixtureProvider,
        data_calls: AtomicUsize,
        activity_calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new(inner: FixtureProvider) -> Self {
            Self {
                inner,
                data_calls: AtomicUsize::new(0),
                activity_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DataProvider for CountingProvider {
        async fn load_data(&self, request: &DataRequest) -> anyhow::Result<String> {
            self.data_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load_data(request).await
        }

        async fn load_activities(&self, request: &ActivityRequest) -> anyhow::Result<String> {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load_activities(request).await
        }
    }

    fn samples() -> Vec<TimePoint> {
        (0..24 * 60)
            .map(|i| {
                TimePoint::new(
                    MARCH_3 + i * 60_000,
                    BTreeMap::from([("heart_rate".to_string(), 70.0)]),
                )
            })
            .collect()
    }

    fn controller(settings: GraphSettings) -> GraphController<NullSurface> {
        let items = vec![PlotItem::new(
            "heart_rate",
            SeriesKind::Line,
            LinearScale::new((0.0, 200.0), 400.0, 0.0),
        )];
        GraphController::new(
            NullSurface,
            settings,
            items,
            TimeDomain::new(MARCH_3, MARCH_3 + DAY_MS),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_loads_both_phases_and_announces_view() {
        let provider = Arc::new(CountingProvider::new(FixtureProvider::new(samples(), Vec::new())));
        let session = Session::new(controller(GraphSettings::default()), provider.clone());
        let (event_tx, event_rx) = mpsc::channel(8);
        let (signal_tx, mut signal_rx) = mpsc::channel(8);
        drop(event_tx);

        let controller = session.run(event_rx, signal_tx).await.unwrap();

        assert_eq!(signal_rx.recv().await, Some(Signal::ViewReady));
        assert_eq!(provider.data_calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.activity_calls.load(Ordering::SeqCst), 1);
        // 1440 samples in buckets of 15
        assert_eq!(controller.reduced().map(|d| d.len()), Some(96));
        assert_eq!(controller.full().map(|d| d.len()), Some(24 * 60));
        assert!(controller.fetch_latency_ms(DatasetTag::Full).is_some());
    }

    #[tokio::test]
    async fn test_empty_metrics_never_call_the_provider() {
        let provider = Arc::new(CountingProvider::new(FixtureProvider::default()));
        let settings = GraphSettings {
            metrics: Some(vec![]),
            ..GraphSettings::default()
        };
        let session = Session::new(controller(settings), provider.clone());
        let (event_tx, event_rx) = mpsc::channel(8);
        let (signal_tx, _signal_rx) = mpsc::channel(8);
        drop(event_tx);

        let controller = session.run(event_rx, signal_tx).await.unwrap();

        assert_eq!(provider.data_calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.full().map(|d| d.len()), Some(2));
    }

    #[tokio::test]
    async fn test_timers_fire_before_session_ends() {
        let provider = Arc::new(FixtureProvider::new(samples(), Vec::new()));
        let settings = GraphSettings {
            legend_hide_ms: 30,
            legend_fade_ms: 10,
            ..GraphSettings::default()
        };
        let session = Session::new(controller(settings), provider);
        let (event_tx, event_rx) = mpsc::channel(8);
        let (signal_tx, _signal_rx) = mpsc::channel(8);

        for event in [
            HostEvent::TouchStart {
                x_px: 100.0,
                touches: 1,
            },
            HostEvent::TapHold { x_px: 100.0 },
            HostEvent::TouchEnd,
            HostEvent::SetSeriesVisible {
                name: "glucose".to_string(),
                visible: true,
            },
        ] {
            event_tx.send(event).await.unwrap();
        }
        drop(event_tx);

        let controller = session.run(event_rx, signal_tx).await.unwrap();

        assert_eq!(
            controller.legend_phase(),
            crate::application::legend_presenter::LegendPhase::Hidden
        );
        assert!(controller.zoom_enabled());
    }
}
