//! Tessera API server binary.
//!
//! Reads auth settings from the environment (and `.env`), connects the
//! credential store and serves the HTTP API until interrupted.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tessera_core::auth::session::SessionManager;
use tessera_core::clock::SystemClock;
use tessera_core::store::CredentialStore;
use tessera_core::store::memory::MemoryStore;
use tessera_core::store::postgres::PgStore;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "tessera_server", about = "Tessera authentication API server")]
struct Args {
    /// Port to listen on. Overrides the port part of `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/tessera"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep users and refresh tokens in process memory instead of PostgreSQL.
    /// Everything is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,tessera_api=debug,tessera_core=debug")
                }),
        )
        .init();

    let args = Args::parse();

    // Missing or malformed auth settings abort startup.
    let mut config = tessera_api::config::ApiConfig::from_env()?;
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }

    info!(bind_addr = %config.bind_addr, in_memory = args.in_memory, "starting tessera_server");

    let store: Arc<dyn CredentialStore> = if args.in_memory {
        warn!("using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        info!(
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        tessera_core::migrate::migrate(&pool).await?;

        Arc::new(PgStore::new(pool))
    };

    let sessions = Arc::new(SessionManager::new(
        &config.auth,
        store,
        Arc::new(SystemClock),
    ));

    let state = tessera_api::AppState { sessions };
    let app = tessera_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Replaces the port of a `host:port` bind address, keeping the host.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_addr);
    format!("{host}:{port}")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_keeps_host() {
        assert_eq!(with_port("127.0.0.1:3100", 8080), "127.0.0.1:8080");
        assert_eq!(with_port("0.0.0.0:1", 3100), "0.0.0.0:3100");
    }

    #[test]
    fn port_override_without_port() {
        assert_eq!(with_port("localhost", 9000), "localhost:9000");
    }

    #[test]
    fn args_parse_flags() {
        let args = Args::parse_from([
            "tessera_server",
            "--port",
            "4000",
            "--in-memory",
            "--database-url",
            "postgres://db/test",
        ]);
        assert_eq!(args.port, Some(4000));
        assert!(args.in_memory);
        assert_eq!(args.max_connections, 5);
        assert_eq!(args.database_url, "postgres://db/test");
    }
}
