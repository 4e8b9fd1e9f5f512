//! Serve command - Run the DStats server
//!
//! Every HTTP request is observed, aggregated and pushed live to dashboards.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use dstats_api::{AppState, RouterOptions, build_router_with_options, spawn_ticker};
use dstats_config::Config;

use crate::tunnel;

/// Config files tried, in order, when none is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/config.toml", "config.toml"];

/// How long background tasks get to stop after the server exits
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Expose the server publicly through a Cloudflare quick tunnel
    #[arg(long)]
    pub tunnel: bool,
}

/// Explicit path if given, otherwise the first default path that exists
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    })
}

/// Run the serve command
pub async fn run(config_path: Option<PathBuf>, args: ServeArgs) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(default)".to_string()),
        "DStats starting"
    );

    let config = load_config(config_path, &args)?;

    // Run the server
    if let Err(e) = run_server(config, args.tunnel).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("DStats shutdown complete");
    Ok(())
}

/// Load the config file (or defaults) and apply CLI overrides
fn load_config(config_path: Option<PathBuf>, args: &ServeArgs) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => {
            // User explicitly provided config path - must exist
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "config file not found: {}",
                    path.display()
                ));
            }
            info!(config = %path.display(), "using config file");
            Config::from_file(&path).context("failed to load configuration")?
        }
        None => {
            info!("no config file found, using defaults");
            Config::default()
        }
    };

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Main server run loop
async fn run_server(config: Config, tunnel: bool) -> Result<()> {
    // Create cancellation token for coordinated shutdown
    let cancel = CancellationToken::new();

    let state = AppState::from_config(&config).with_shutdown(cancel.clone());

    // Background tasks: one RPS sample per second, stale observer cleanup
    let ticker = spawn_ticker(&state, config.stats.tick_interval, cancel.clone());
    let maintenance = state.hub.spawn_maintenance(cancel.clone());

    let router_options = RouterOptions {
        static_dir: config.server.static_dir.clone(),
    };
    if let Some(dir) = &router_options.static_dir
        && !dir.is_dir()
    {
        warn!(dir = %dir.display(), "static directory not found, unknown paths will 404");
    }

    let app = build_router_with_options(state, router_options).layer(TraceLayer::new_for_http());

    // Bind
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    let port = config.server.port;
    info!(
        addr = %addr,
        tick_interval_ms = config.stats.tick_interval.as_millis() as u64,
        max_observers = config.hub.max_observers,
        "DStats server running"
    );
    info!("Dashboard: http://localhost:{}/", port);
    info!("Test endpoint: http://localhost:{}/test", port);
    info!("Stress test: http://localhost:{}/stress", port);
    info!("API Stats: http://localhost:{}/api/stats", port);
    info!("Live feed: ws://localhost:{}/ws", port);

    let tunnel_task = if tunnel {
        tunnel::spawn_tunnel(port, cancel.clone())
    } else {
        None
    };

    // Translate signals into cancellation
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("shutdown signal received, stopping server...");
        signal_cancel.cancel();
    });

    let serve_cancel = cancel.clone();
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        serve_cancel.cancelled().await;
    })
    .await;

    // Make sure background tasks stop even if the server exited on its own
    cancel.cancel();

    join_with_timeout("ticker", ticker).await;
    join_with_timeout("hub maintenance", maintenance).await;
    if let Some(task) = tunnel_task {
        join_with_timeout("tunnel", task).await;
    }

    served.context("server failed")
}

/// Wait for a background task, giving up after the shutdown timeout
async fn join_with_timeout(name: &str, task: JoinHandle<()>) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(task = name, error = %e, "task panicked during shutdown"),
        Err(_) => warn!(task = name, "task did not finish within timeout"),
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
