//! TalentScope Web Server
//!
//! Run with: cargo run -p talentscope-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use talentscope_web::config::Config;
use talentscope_web::router::build_router;
use talentscope_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting TalentScope");
    info!(
        storage = ?config.storage.backend,
        analysis = ?config.analysis.provider,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).await?;
    let app = build_router(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
