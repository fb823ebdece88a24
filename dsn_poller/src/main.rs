use anyhow::{Context, Result};
use lib_dsn::utils::clock::SystemClock;
use lib_dsn::{ApiCallDsn, Dispatcher, DsnPollingPlugin};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod config;
mod logger;
mod sensors;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    let console = logger::Console::for_output(config.machine_output());
    let log_path = logger::setup_logging(config.log_dir(), config.log_level(), console)?;
    log::info!("Logging to {}", log_path.display());
    log::debug!("Effective configuration: {:?}", config);

    let feed = ApiCallDsn::new(config.base_url(), config.client_options(), Arc::new(SystemClock))
        .with_context(|| format!("Invalid base URL {}", config.base_url()))?;
    let mut poller = DsnPollingPlugin::new(feed);

    if config.once() {
        let batch = poller.poll_once().await.context("DSN poll failed")?;
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let mut dispatcher = Dispatcher::new();
    let tracker = tokio::spawn(sensors::track(dispatcher.add_client("sensors")));
    let printer = config
        .json()
        .then(|| tokio::spawn(sensors::print_json(dispatcher.add_client("stdout"))));

    poller.run(config.poll_interval(), &mut dispatcher, shutdown).await;

    // Dropping the dispatcher closes every subscriber channel.
    drop(dispatcher);
    let board = tracker.await?;
    if let Some(printer) = printer {
        printer.await?;
    }

    let stats = poller.stats();
    log::info!(
        "Shutdown complete. {} sensors, {} polls ok, {} failed, {} signals skipped.",
        board.len(),
        stats.succeeded,
        stats.failed,
        stats.skipped_signals
    );
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = terminate() => {
            log::info!("SIGTERM received, initiating shutdown.");
        }
    }
    shutdown.cancel();
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            log::warn!("Could not install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
