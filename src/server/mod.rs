//! Web server module

pub mod http;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::notify::{LineClient, LineConfig, PushNotifier};
use crate::scheduler::{DigestJob, DigestScheduler};
use crate::service::LearningLog;
use crate::store::SqliteRecordStore;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub log: LearningLog,
    pub default_user: String,
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/mcp", post(http::mcp_handler))
        .route("/api/status", get(http::status_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the configured database and wrap it in a service
pub async fn open_log(config: &Config) -> Result<LearningLog> {
    let path = config.database_path()?;
    let store = SqliteRecordStore::new(&path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(LearningLog::new(Arc::new(store)))
}

/// Digest job wired to LINE when credentials are present
pub fn digest_job(config: &Config, log: LearningLog) -> Result<DigestJob> {
    let job = DigestJob::new(log, config.default_user_id(), config.digest.utc_offset_hours);

    let line = LineConfig::from_config(config).context("Failed to load LINE configuration")?;
    if !line.is_configured() {
        return Ok(job);
    }

    let recipient = line.recipient.clone();
    let client = LineClient::new(line)?;
    Ok(job.with_notifier(Arc::new(client) as Arc<dyn PushNotifier>, recipient))
}

/// Start the server, optionally with the digest scheduler alongside
pub async fn start(config: Config, host: &str, port: u16, with_digest: bool) -> Result<()> {
    let log = open_log(&config).await?;
    let state = ServerState {
        log: log.clone(),
        default_user: config.default_user_id(),
    };

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = if with_digest && config.digest.enabled {
        let scheduler = DigestScheduler::new(&config.digest.cron, digest_job(&config, log)?)?;
        Some(tokio::spawn(async move { scheduler.run(shutdown_rx).await }))
    } else {
        if with_digest {
            warn!("Digest requested but disabled in config");
        }
        None
    };

    let app = router(state);

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Learning Log Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Database: {}", config.database_path()?.display());
    if scheduler_handle.is_some() {
        println!("✓ Daily digest: {} (UTC)", config.digest.cron);
    }
    println!();
    println!("🚀 Listening on http://{}", addr);
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    Ok(())
}
