use std::{sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelmark::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, InteractionSlot, MemorySlot, RedisSlot},
    repositories::{InMemoryMovieRepository, MovieRepository, PgMovieRepository},
    services::{InteractionStore, SearchPipeline, SearchSettings, TmdbCatalog},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        language = %config.tmdb_language,
        "Configuration loaded"
    );

    let repository: Arc<dyn MovieRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            tracing::info!("Movies stored in PostgreSQL");
            Arc::new(PgMovieRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, movies are kept in memory");
            Arc::new(InMemoryMovieRepository::new())
        }
    };

    let slot: Arc<dyn InteractionSlot> = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            Arc::new(RedisSlot::new(client, config.interactions_key.clone()))
        }
        None => {
            tracing::warn!("REDIS_URL not set, interactions are kept in memory");
            Arc::new(MemorySlot::new())
        }
    };
    let store = Arc::new(InteractionStore::load(slot).await);

    let timeout = Duration::from_secs(config.catalog_timeout_secs);
    let catalog = Arc::new(TmdbCatalog::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
        timeout,
    )?);
    let settings = SearchSettings {
        image_base_url: config.tmdb_image_url.clone(),
        trailer_concurrency: config.trailer_concurrency,
        trailer_timeout: timeout,
    };
    let pipeline = Arc::new(SearchPipeline::new(catalog, repository.clone(), settings));

    let app = create_router(AppState::new(repository, store, pipeline));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
