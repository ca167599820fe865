//! # Recipe API Server
//!
//! Serves the recipe REST API: accounts and token auth, tags, ingredients,
//! recipes with image upload, and staff listings.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/recipes cargo run -p recipe-api --bin recipe-api
//! ```
//!
//! Migrations run on startup.

use recipe_api::{
    app::{build_router, AppState},
    config::Config,
    telemetry,
};
use recipe_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing();

    tracing::info!(
        "Recipe API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await?;

    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.media.root).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
