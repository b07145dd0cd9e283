use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

#[cfg(test)]
pub mod testing;

use crate::config::SecurityConfig;
use crate::database::models::LabelKind;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full router over `state`
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/refresh", post(protected::refresh))
        .merge(note_routes())
        .merge(label_routes(LabelKind::Folder))
        .merge(label_routes(LabelKind::Tag))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/users", post(public::register))
        .route("/api/login", post(public::login))
        // Bearer token required
        .merge(protected_routes)
        .fallback(fallback);

    let router = match cors_layer(&state.config.security) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .with_state(state)
}

fn note_routes() -> Router<AppState> {
    use protected::notes;

    Router::new()
        .route("/api/notes", get(notes::list).post(notes::create))
        .route(
            "/api/notes/:id",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
}

fn label_routes(kind: LabelKind) -> Router<AppState> {
    use protected::labels;

    let collection = kind.route();
    let item = format!("{}/:id", collection);

    Router::new()
        .route(collection, get(labels::list).post(labels::create))
        .route(&item, get(labels::get).put(labels::update).delete(labels::delete))
        .route_layer(Extension(kind))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "/api/users (public)",
            "login": "/api/login (public)",
            "refresh": "/api/refresh (token)",
            "notes": "/api/notes[/:id] (token)",
            "folders": "/api/folders[/:id] (token)",
            "tags": "/api/tags[/:id] (token)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();
    let storage = state.store.backend_name();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "storage": storage,
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "storage": storage,
                })),
            )
        }
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Route not found")
}
