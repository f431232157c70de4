use cineclub_api::{
    api::{create_router, AppState},
    config::Config,
    storage::postgres,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let state = match &config.database_url {
        Some(url) => {
            let pool = postgres::create_pool(url).await?;
            postgres::run_migrations(&pool).await?;
            tracing::info!("using PostgreSQL storage");
            AppState::postgres(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory storage");
            AppState::in_memory()
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
