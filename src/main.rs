// Main entry point - Configuration, tracing and session wiring
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use tsdv_graph::application::data_provider::DataProvider;
use tsdv_graph::application::graph_controller::GraphController;
use tsdv_graph::domain::interaction::Signal;
use tsdv_graph::infrastructure::config::{load_view_config, LoggingConfig, ProviderConfig};
use tsdv_graph::infrastructure::fixture_provider::FixtureProvider;
use tsdv_graph::infrastructure::http_provider::HttpProvider;
use tsdv_graph::infrastructure::log_surface::LogSurface;
use tsdv_graph::presentation::host_event::HostEvent;
use tsdv_graph::presentation::session::Session;

fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn build_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn DataProvider>> {
    let provider: Arc<dyn DataProvider> = match config {
        ProviderConfig::Http {
            base_url,
            timeout_secs,
        } => Arc::new(HttpProvider::new(
            base_url.clone(),
            Duration::from_secs(*timeout_secs),
        )?),
        ProviderConfig::Fixture {
            data_path,
            activities_path,
            latency_ms,
        } => Arc::new(
            FixtureProvider::from_files(data_path, activities_path.as_deref())?
                .with_latency(Duration::from_millis(*latency_ms)),
        ),
    };
    Ok(provider)
}

/// Forwards JSON-lines host events from stdin until EOF.
async fn read_host_events(events: mpsc::Sender<HostEvent>) -> anyhow::Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    while let Some(line) = lines.next().await {
        let line = line.context("Failed to read host events")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostEvent>(&line) {
            Ok(event) => {
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("Ignoring host event {:?}: {}", line, e),
        }
    }

    Ok(())
}

async fn print_signals(mut signals: mpsc::Receiver<Signal>) {
    while let Some(signal) = signals.recv().await {
        match serde_json::to_string(&signal) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!("Failed to encode signal {:?}: {}", signal, e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_view_config()?;
    config.validate()?;

    init_tracing(&config.logging)?;

    let provider = build_provider(&config.provider)?;
    let controller = GraphController::new(
        LogSurface::default(),
        config.graph_settings()?,
        config.plot_items(),
        config.session_range()?,
    )?;

    let (event_tx, event_rx) = mpsc::channel(64);
    let (signal_tx, signal_rx) = mpsc::channel(64);

    let reader = tokio::spawn(read_host_events(event_tx));
    let printer = tokio::spawn(print_signals(signal_rx));

    let controller = Session::new(controller, provider)
        .run(event_rx, signal_tx)
        .await?;

    reader.await??;
    printer.await?;

    let counts = controller.surface().counts();
    tracing::info!(
        "Drew {} lines and {} bar sets, {} legends",
        counts.lines,
        counts.bars,
        counts.legends
    );

    Ok(())
}
