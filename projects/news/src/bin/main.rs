use std::net::SocketAddr;
use std::sync::Arc;

use axum::serve;
use projects_news::{
    config::{Config, ConfigError},
    db::{
        memory::MemoryStore,
        postgres::{connect_pool, ConnectPoolError, PgStore},
        CredentialStore, InteractionStore,
    },
    routes::router,
    state::AppState,
};
use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tracing::info;
use utils_trace::tracing_init;

#[derive(Debug, Error)]
pub enum MainError {
    #[error("TracingInit: {source}")]
    TracingInit {
        #[source]
        source: utils_trace::TracingInitError,
    },
    #[error("Config: {source}")]
    Config {
        #[source]
        source: ConfigError,
    },
    #[error("ConnectPool: {source}")]
    ConnectPool {
        #[source]
        source: ConnectPoolError,
    },
    #[error("Worker: {source}")]
    Worker {
        #[source]
        source: JoinError,
    },
    #[error("TcpListenerBind: {source}")]
    TcpListenerBind {
        #[source]
        source: std::io::Error,
    },
    #[error("Serve: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

type Stores = (Arc<dyn CredentialStore>, Arc<dyn InteractionStore>);

async fn open_stores(config: &Config) -> Result<Stores, MainError> {
    let Some(database_url) = config.database_url.clone() else {
        let store = Arc::new(MemoryStore::new());
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let interactions: Arc<dyn InteractionStore> = store;
        return Ok((credentials, interactions));
    };

    let pool_size = config.database_pool_size;
    let pool = spawn_blocking(move || connect_pool(&database_url, pool_size))
        .await
        .map_err(|source| MainError::Worker { source })?
        .map_err(|source| MainError::ConnectPool { source })?;
    info!("Connected to PostgreSQL");

    let store = Arc::new(PgStore::new(pool));
    let credentials: Arc<dyn CredentialStore> = store.clone();
    let interactions: Arc<dyn InteractionStore> = store;
    Ok((credentials, interactions))
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    // A missing .env file is fine; the environment may be set directly.
    let _ = dotenvy::dotenv();

    tracing_init("info,tower_http=info")
        .map_err(|source| MainError::TracingInit { source })?;

    let config = Config::from_env()
        .map_err(|source| MainError::Config { source })?;

    let (credentials, interactions) = open_stores(&config).await?;
    let state = AppState::from_config(&config, credentials, interactions);

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| MainError::TcpListenerBind { source })?;

    info!("Server running on addr: {}", addr);

    serve(listener, app)
        .await
        .map_err(|source| MainError::Serve { source })?;

    Ok(())
}
