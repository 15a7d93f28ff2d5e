#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::error::EngineError;
use crate::pathfinding::PathTrace;
use crate::request::{PathRequest, SortRequest};
use crate::saving::{SavedVisualization, VisualizationData, VisualizationKind, VisualizationStore};
use crate::sorting::SortTrace;

pub struct AppState {
    store: VisualizationStore,
}

#[derive(Deserialize)]
struct SaveBody {
    owner: String,
    name: String,
    data: VisualizationData,
}

#[derive(Deserialize)]
struct ListQuery {
    owner: String,
    #[serde(rename = "type")]
    kind: Option<VisualizationKind>,
}

#[derive(Deserialize)]
struct OwnerQuery {
    owner: String,
}

/// Error body returned as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(e: io::Error) -> Self {
        let status = match e.kind() {
            io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            io::ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("storage error: {}", e);
        }
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

/// Builds the API router over an opened store.
pub fn router(store: VisualizationStore) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/api/sort", post(sort))
        .route("/api/path", post(path))
        .route("/api/save", post(save))
        .route("/api/load", get(list_saved))
        .route("/api/load/:id", get(load_saved))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = VisualizationStore::open(&config.data_dir)?;
    let app = router(store);

    let listener = TcpListener::bind(&config.addr).await?;
    info!(
        "listening on http://{} (saves in {})",
        config.addr,
        config.data_dir.display()
    );
    axum::serve(listener, app).await?;

    Ok(())
}

async fn sort(Json(request): Json<SortRequest>) -> Result<Json<SortTrace>, ApiError> {
    Ok(Json(request.execute()?))
}

async fn path(Json(request): Json<PathRequest>) -> Result<Json<PathTrace>, ApiError> {
    Ok(Json(request.execute()?))
}

async fn save(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let saved = SavedVisualization::new(body.owner, body.name, body.data);
    let stored = state.store.save(&saved)?;
    Ok(Json(serde_json::json!({ "status": "ok", "id": stored.id })))
}

async fn list_saved(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SavedVisualization>>, ApiError> {
    Ok(Json(state.store.list(Some(&query.owner), query.kind)?))
}

async fn load_saved(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<SavedVisualization>, ApiError> {
    Ok(Json(state.store.load(&query.owner, &id)?))
}
