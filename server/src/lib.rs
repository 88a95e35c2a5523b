//! HTTP front end for the characters service.
//!
//! # Overview
//! | Method | Path                    | Operation                          |
//! |--------|-------------------------|------------------------------------|
//! | GET    | /characters/external    | upstream character search          |
//! | GET    | /characters/locations   | upstream location listing          |
//! | POST   | /characters             | create a stored character          |
//! | GET    | /characters             | list stored characters             |
//! | GET    | /characters/{id}        | fetch one stored character         |
//! | PATCH  | /characters/{id}        | partial update of a stored record  |
//! | DELETE | /characters/{id}        | delete a stored record             |
//! | GET    | /health                 | liveness                           |

pub mod config;
pub mod error;
pub mod firestore;
pub mod handlers;
pub mod logging;
pub mod transport;

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use characters_core::{CharacterRepository, DocumentStore, HttpTransport, UpstreamClient};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::AppConfig;
pub use error::{ApiError, ApiErrorBody};

/// Shared per-process collaborators. Holds no request state.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub transport: Arc<dyn HttpTransport>,
    pub characters: CharacterRepository,
}

impl AppState {
    pub fn new(
        upstream: UpstreamClient,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            upstream,
            transport,
            characters: CharacterRepository::new(store),
        }
    }
}

pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/characters",
            get(handlers::list_characters).post(handlers::create_character),
        )
        .route("/characters/external", get(handlers::external_characters))
        .route("/characters/locations", get(handlers::locations))
        .route(
            "/characters/{id}",
            get(handlers::get_character)
                .patch(handlers::update_character)
                .delete(handlers::delete_character),
        )
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn run(
    listener: TcpListener,
    state: AppState,
    cors_origins: &[String],
) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state, cors_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
