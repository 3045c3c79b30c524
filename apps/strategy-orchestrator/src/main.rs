//! Strategy Orchestrator Binary
//!
//! Serves the orchestrator's REST API and drives submitted strategies
//! through the analysis agents.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin strategy-orchestrator
//! ```
//!
//! # Environment Variables
//!
//! - `ORCHESTRATOR_CONFIG`: Path to the YAML config (default: config.yaml,
//!   built-in defaults when that file is absent)
//! - `RUST_LOG`: Log filter (default: the configured `observability.logging.level`)
//!
//! Any `${VAR}` referenced from the config file is read from the
//! environment, including a `.env` file in the working directory or one of
//! its ancestors.

use std::time::Duration;

use anyhow::Context;
use strategy_orchestrator::config::{self, Config};
use strategy_orchestrator::infrastructure::http::create_router;
use strategy_orchestrator::observability::{self, MetricsConfig};
use strategy_orchestrator::Container;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = config::load_config_from_env().context("Failed to load configuration")?;
    observability::init_tracing(&config.observability.logging)
        .context("Failed to initialize tracing")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Strategy Orchestrator"
    );
    log_config(&config);

    if config.observability.metrics.enabled {
        observability::init_metrics(&MetricsConfig::with_addr(
            config.observability.metrics.listen_addr,
        ))
        .context("Failed to start metrics exporter")?;
    }

    let container = Container::from_config(&config).context("Failed to wire dependencies")?;
    let orchestrator = container.orchestrator();
    let app = create_router(container.app_state());

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /healthz");
    tracing::info!("  POST /api/v1/strategies");
    tracing::info!("  GET  /api/v1/workflows");
    tracing::info!("  GET  /api/v1/workflows/{{id}}");
    tracing::info!("  POST /api/v1/workflows/{{id}}/cancel");
    tracing::info!("  GET  /api/v1/workflows/{{id}}/audit");
    tracing::info!("  GET  /api/v1/audit/summary");
    tracing::info!("  GET  /api/v1/dependencies");

    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.clone().cancelled_owned())
        .await
        .context("HTTP server error")?;

    tracing::info!(
        running = orchestrator.live_workflows(),
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "HTTP server stopped, cancelling workflows"
    );
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, orchestrator.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            running = orchestrator.live_workflows(),
            "Workflows did not settle before the shutdown timeout"
        );
    }

    tracing::info!("Strategy Orchestrator stopped");
    Ok(())
}

fn log_config(config: &Config) {
    for dependency in strategy_orchestrator::domain::workflow::ServiceDependency::ALL {
        let endpoint = config.services.endpoint(dependency);
        tracing::info!(
            dependency = %dependency,
            url = %endpoint.url,
            timeout_ms = endpoint.timeout_ms,
            "Dependency configured"
        );
    }
    tracing::info!(
        max_attempts = config.retry.max_attempts,
        base_delay_ms = config.retry.base_delay_ms,
        max_delay_ms = config.retry.max_delay_ms,
        workflow_timeout_secs = config.workflow.timeout_secs,
        "Resilience configured"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT) and trip the token.
#[allow(clippy::expect_used)]
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown.cancel();
}
