use std::net::SocketAddr;
use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use volunteer_portal::config::AppConfig;
use volunteer_portal::db;
use volunteer_portal::state::AppState;
use volunteer_portal::web::router::build_router;

const MAX_DB_CONNECTIONS: u32 = 8;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let pool = db::open_pool(&config.database_url, MAX_DB_CONNECTIONS).await?;

    let host = config.host.clone();
    let port = config.port;
    let state = AppState::new(pool, config)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback: SocketAddr = format!("{}:{}", host, port.saturating_add(1)).parse()?;
            warn!(%addr, %fallback, error = %e, "bind failed, trying fallback port");
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("server listening on http://{}", bound_addr);
    info!("sign in at http://{}/login", bound_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
