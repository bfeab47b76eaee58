use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{HeaderMap, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use lifeloop_shared::{EntryId, RemoteRecord};

use crate::collections::CollectionStore;
use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CollectionStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the collection store under `config.data_path`.
    pub async fn open(config: ServerConfig) -> Result<Self, ServerError> {
        let store = CollectionStore::open(&config.data_path).await?;
        Ok(Self {
            store: Arc::new(store),
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let collections = Router::new()
        .route("/users/:uid/entries", get(list_entries))
        .route("/users/:uid/entries/batch", post(put_batch))
        .route("/users/:uid/entries/:id", put(put_entry).delete(delete_entry))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health_check))
        .merge(collections)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct StoredResponse {
    stored: usize,
}

#[derive(Serialize)]
struct DeletedResponse {
    deleted: bool,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ServerError {
    ServerError::NotFound("no such route".into())
}

/// Reject collection requests without the configured bearer token.
async fn require_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if let Some(expected) = &state.config.api_token {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

        use subtle::ConstantTimeEq;
        let token_bytes = token.as_bytes();
        let expected_bytes = expected.as_bytes();
        if token_bytes.len() != expected_bytes.len()
            || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
        {
            return Err(ServerError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// A record may only be written into the collection it names.
fn check_owner(uid: &str, record: &RemoteRecord) -> Result<(), ServerError> {
    if record.user_id.as_str() != uid {
        return Err(ServerError::BadRequest(format!(
            "record {} belongs to {}, not {uid}",
            record.id(),
            record.user_id
        )));
    }
    Ok(())
}

async fn list_entries(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<RemoteRecord>>, ServerError> {
    let records = state.store.list(&uid).await?;
    debug!(uid = %uid, records = records.len(), "Listed collection");
    Ok(Json(records))
}

async fn put_entry(
    State(state): State<AppState>,
    Path((uid, id)): Path<(String, String)>,
    Json(record): Json<RemoteRecord>,
) -> Result<Json<StoredResponse>, ServerError> {
    check_owner(&uid, &record)?;
    if record.id().as_str() != id {
        return Err(ServerError::BadRequest(format!(
            "body id {} does not match path id {id}",
            record.id()
        )));
    }

    state.store.put(&uid, record).await?;
    debug!(uid = %uid, id = %id, "Stored record");
    Ok(Json(StoredResponse { stored: 1 }))
}

async fn put_batch(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(records): Json<Vec<RemoteRecord>>,
) -> Result<Json<StoredResponse>, ServerError> {
    let max = state.config.max_batch_size;
    if records.len() > max {
        return Err(ServerError::BatchTooLarge {
            size: records.len(),
            max,
        });
    }
    for record in &records {
        check_owner(&uid, record)?;
    }

    let stored = state.store.put_batch(&uid, records).await?;
    Ok(Json(StoredResponse { stored }))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path((uid, id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ServerError> {
    let deleted = state.store.delete(&uid, &EntryId(id)).await?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
