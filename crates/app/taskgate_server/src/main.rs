//! Taskgate API server binary.
//!
//! Reads configuration from the environment (and `.env`), migrates the
//! database and serves the REST API until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use taskgate_api::AppState;
use taskgate_api::config::ApiConfig;
use taskgate_core::auth::reset_tokens;
use taskgate_core::notify::{HttpMailer, LogMailer, Mailer};
use taskgate_core::store::{PgStore, Store};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often expired password-reset tokens are deleted.
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "taskgate_server", about = "Taskgate API server")]
struct Args {
    /// Port to listen on. Overrides the port of `BIND_ADDR`.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map_or(bind_addr, |(host, _)| host);
    format!("{host}:{port}")
}

/// Delete expired reset tokens every [`PURGE_INTERVAL`] until cancelled.
async fn purge_reset_tokens(store: Arc<dyn Store>, ct: CancellationToken) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = ct.cancelled() => break,
            _ = interval.tick() => {
                match reset_tokens::purge_expired(&*store, chrono::Utc::now()).await {
                    Ok(0) => {}
                    Ok(n) => debug!(purged = n, "expired reset tokens removed"),
                    Err(e) => warn!(error = %e, "reset token purge failed"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,taskgate_api=debug,taskgate_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }

    info!(?config, "starting taskgate_server");
    info!(
        max_connections = args.max_connections,
        "configuring connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    info!("running database migrations");
    taskgate_api::migrate(&pool).await?;

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => Arc::new(HttpMailer::new(url)?),
        None => {
            warn!("MAIL_RELAY_URL not set; password reset mails are only logged");
            Arc::new(LogMailer)
        }
    };
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store.clone(), mailer)?;
    let app = taskgate_api::router(state);

    let ct = CancellationToken::new();
    let purge_handle = tokio::spawn(purge_reset_tokens(store, ct.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let shutdown = ct.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                shutdown.cancelled().await;
            }
            info!("shutdown requested");
        })
        .await;

    ct.cancel();
    let _ = purge_handle.await;

    result?;
    Ok(())
}
