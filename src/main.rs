use std::time::Duration;

use navbot::config::LoggingSettings;
use navbot::device::Simulator;
use navbot::ui::catalog::{self, LOGIN_ANNOUNCE, PAGE_MAIN};
use navbot::{AppError, CoordinatorBuilder, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Level};

const DEFAULT_DESTINATION: &str = "page_meowfficer";

fn init_logging(settings: &LoggingSettings) {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(settings.ansi)
        .init();
}

/// Drives the standard pages on a simulated device: navigates to the page
/// named by the first argument, then lets the interrupt daemon run for a bit.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let destination = args
        .next()
        .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
    let settings = Settings::load(args.next().as_deref())?;
    init_logging(&settings.logging);
    if let Ok(json) = serde_json::to_string(&settings) {
        debug!(settings = %json, "Loaded settings");
    }

    let graph = catalog::standard_graph()?;
    let destination = graph
        .find(&destination)
        .ok_or(AppError::UndeclaredPage(destination))?;

    let simulator = Simulator::from_graph(&graph, PAGE_MAIN)
        .overlay("announce", [LOGIN_ANNOUNCE], LOGIN_ANNOUNCE)
        .overlay_at(2, "announce")
        .build()?;
    let mut coordinator = CoordinatorBuilder::new(settings)
        .device(simulator.device())
        .matcher(simulator.matcher())
        .build()?;

    coordinator.navigate(destination).await?;
    info!(
        "Arrived at {} after {} clicks: {:?}",
        destination,
        simulator.clicks().len(),
        simulator.clicked_buttons()
    );

    let cancel_token = CancellationToken::new();
    let stop = cancel_token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        stop.cancel();
    });
    coordinator.run_daemon(cancel_token).await?;

    Ok(())
}
