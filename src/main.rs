use anyhow::Context;
use tracing_subscriber::EnvFilter;

use movierec::{
    api::{cors_layer, create_router, AppState},
    config::Config,
    datasets::load_movielens_100k,
    services::Recommender,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movierec=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let settings = config.settings();
    let data_dir = config.data_dir.clone();

    // Load and fit before binding: requests are only served from a fitted model
    let recommender = tokio::task::spawn_blocking(move || -> anyhow::Result<Recommender> {
        let dataset = load_movielens_100k(&data_dir)?;
        Ok(Recommender::build(dataset.catalog, dataset.ratings, settings)?)
    })
    .await
    .context("Model fitting task panicked")??;

    let app = create_router(AppState::new(recommender), cors_layer(&config.cors_origin)?);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app).await?;

    Ok(())
}
