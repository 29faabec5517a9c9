use tracing_subscriber::EnvFilter;

use bookshelf_api::config::AppConfig;
use bookshelf_api::router;
use bookshelf_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config)?;

    // Migrations are applied on startup; if the store is unreachable the
    // server still binds and reports degraded health until it comes back.
    if let Err(err) = state.db.migrate().await {
        tracing::warn!(error = %err, "migrations not applied, starting degraded");
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("bookshelf-api listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
