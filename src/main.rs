//! disc-rooms-back binary entrypoint wiring the REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use disc_rooms_back::{
    config::AppConfig,
    dao::{
        room_store::{RoomStore, memory::MemoryRoomStore},
        storage::StorageError,
    },
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    start_storage(app_state.clone()).await?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the backend named by `STORAGE_BACKEND` and hand it to the storage supervisor.
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| default_backend.into());

    match backend.as_str() {
        "memory" => {
            warn!("using the in-memory room store; data is lost on restart");
            let store: Arc<dyn RoomStore> = Arc::new(MemoryRoomStore::new());
            state.install_room_store(store).await;
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            use disc_rooms_back::dao::room_store::mongodb::{MongoConfig, MongoRoomStore};

            let config = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            info!(database = %config.database_name, "using the MongoDB room store");
            tokio::spawn(disc_rooms_back::services::storage_supervisor::run(
                state,
                move || {
                    let config = config.clone();
                    async move {
                        let store = MongoRoomStore::connect(config)
                            .await
                            .map_err(StorageError::from)?;
                        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn RoomStore>)
                    }
                },
            ));
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            use disc_rooms_back::dao::room_store::couchdb::{CouchConfig, CouchRoomStore};

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            info!(database = %config.database, "using the CouchDB room store");
            tokio::spawn(disc_rooms_back::services::storage_supervisor::run(
                state,
                move || {
                    let config = config.clone();
                    async move {
                        let store = CouchRoomStore::connect(config)
                            .await
                            .map_err(StorageError::from)?;
                        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn RoomStore>)
                    }
                },
            ));
        }
        other => bail!("unsupported STORAGE_BACKEND `{other}`"),
    }

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
