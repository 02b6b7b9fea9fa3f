mod config;
mod db;
mod embeddings;
mod errors;
mod extraction;
mod metrics;
mod routes;
mod services;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = config::AppConfig::build().expect("Failed to load configuration");

    // 2. Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .init();

    tracing::info!("Starting CarHub-rs...");

    // 3. Initialize Database
    let repo = db::Repository::new(&config.database).await?;
    tracing::info!("Connected to database");

    // 4. Initialize external clients; "mock" API keys select in-process fakes
    let embedder: Arc<dyn embeddings::Embedder> = if config.embeddings.api_key == "mock" {
        Arc::new(embeddings::MockEmbedder::new(config.embeddings.embedding_dim))
    } else {
        Arc::new(embeddings::CloudEmbedder::new(config.embeddings.clone()))
    };

    let extractor: Arc<dyn extraction::EntityExtractor> = if config.extraction.api_key == "mock" {
        Arc::new(extraction::NoopExtractor)
    } else {
        Arc::new(extraction::GeminiExtractor::new(config.extraction.clone()))
    };

    let store: Arc<dyn storage::ObjectStore> =
        Arc::new(storage::S3ObjectStore::new(&config.storage).await);

    // 5. Initialize App State (Services)
    let state = services::AppState::new(repo.clone(), embedder, extractor, store, &config.storage);

    // 6. Setup Router
    let app = routes::create_router(state, repo);

    // 7. Start Server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
