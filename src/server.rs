//! Server initialization and startup logic for Portico.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use portico_api::{BridgeServer, BridgeState};
use portico_config::{Config, LoggingConfig};
use portico_core::StateKernel;

/// Initialize tracing with console and file output.
///
/// Log files are written under `logging.directory` with daily rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("portico")
        .filename_suffix("log")
        .max_log_files(logging.max_log_files)
        .build(&logging.directory)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer stops flushing once the guard drops.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let console = if logging.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Run the server in foreground until Ctrl-C or SIGTERM.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Portico v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let max_workers = config.kernel.max_workers;
    let state = BridgeState::builder(config, Arc::new(StateKernel::new()))
        .shutdown(shutdown)
        .build();
    let server = BridgeServer::new(Arc::new(state));

    info!("Portico ready:");
    info!("  Page:      http://{}/", server.addr());
    info!("  Kernel:    ws://{}/jupyter/api/kernels/{{id}}/{{name}}", server.addr());
    info!("  Readiness: http://{}/readyz", server.addr());
    info!("  Workers:   {}", max_workers);

    server.run().await?;

    info!("Shutting down...");
    Ok(())
}

/// Drive `future` to completion, then shut the runtime down.
///
/// Kernel threads still running afterwards get `grace` to finish; the runtime
/// is then abandoned instead of waiting on them.
pub(crate) fn block_on_with_grace<F: Future>(
    runtime: tokio::runtime::Runtime,
    grace: Duration,
    future: F,
) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    output
}

async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
    shutdown.cancel();
}
