use std::net::SocketAddr;

use anyhow::Context;
use server::config::AppConfig;
use server::database::init_db;
use server::seed::seed_grading_scales;
use server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = init_db(&config.database)
        .await
        .context("failed to initialise database")?;

    if config.seed.grading_scales {
        seed_grading_scales(&db)
            .await
            .context("failed to seed grading scales")?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    let app = server::build_router(AppState { db, config });

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
