use crate::{
    auth::{self, ApiAuth},
    bookmarks::{Link, LinkCandidate, LinkCreate, LinkStore},
    history::{HistoryEntry, HistoryStore},
    search::{Counts, SearchError, SearchOutcome, SearchResults, SearchService, CORPUS_LIMIT},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub store: Arc<dyn LinkStore>,
    pub history: Arc<dyn HistoryStore>,
    pub auth: ApiAuth,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/search-history", get(history_list))
        .route("/api/search-history", post(history_add))
        .route("/api/search-history/:id", delete(history_delete))
        .route("/api/search-history", delete(history_clear))
        .route("/api/links", post(link_create))
        .route("/api/links", get(link_list))
        .route("/api/links/:id/pin", post(link_pin))
        .route("/api/collections", post(collection_create))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn start_app(state: AppState, listen_addr: &str) {
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await.unwrap();
    log::info!("listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(state: AppState, listen_addr: &str) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(state, listen_addr).await });
}

// Internal errors cross into HTTP as opaque 500s; details stay in the log.
#[derive(Debug)]
struct HttpError(anyhow::Error);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        log::error!("{:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal error" })),
        )
            .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Authorize the request and resolve the calling user, or produce the
/// error response to return as-is.
fn identify(state: &AppState, headers: &HeaderMap) -> Result<u64, Response> {
    if !state.auth.authorize(headers) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response());
    }

    auth::user_id(headers).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing or invalid x-user-id header" })),
        )
            .into_response()
    })
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
}

/// Response envelope for `/api/search`
#[derive(Debug, Serialize)]
struct SearchEnvelope {
    success: bool,
    message: String,
    data: Option<SearchResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counts: Option<Counts>,
}

impl SearchEnvelope {
    fn success(message: &str, results: SearchResults) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            counts: Some(results.counts()),
            data: Some(results),
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            counts: None,
        }
    }
}

async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SearchRequest>,
) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let outcome =
        tokio::task::block_in_place(|| state.search.search(user_id, &payload.query));

    match outcome {
        Ok(SearchOutcome::EmptyCorpus) => (
            StatusCode::OK,
            Json(SearchEnvelope::success(
                "No bookmarks found.",
                SearchResults::default(),
            )),
        )
            .into_response(),
        Ok(SearchOutcome::Ranked(results)) => {
            let message = if results.is_empty() {
                "No matching bookmarks found."
            } else {
                "Success"
            };
            (StatusCode::OK, Json(SearchEnvelope::success(message, results))).into_response()
        }
        Err(SearchError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SearchEnvelope::failure(
                "AI search is not configured. Please set up an AI provider.",
            )),
        )
            .into_response(),
        Err(SearchError::InvalidQuery) => (
            StatusCode::BAD_REQUEST,
            Json(SearchEnvelope::failure("Search query is required.")),
        )
            .into_response(),
        Err(err) => {
            log::error!("search failed for user {user_id}: {err:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchEnvelope::failure(
                    "AI search failed. Please try again.",
                )),
            )
                .into_response()
        }
    }
}

async fn history_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match state.history.list(user_id) {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct HistoryAddRequest {
    query: String,
}

async fn history_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<HistoryAddRequest>,
) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if payload.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "query is required" })),
        )
            .into_response();
    }

    match state.history.add(user_id, &payload.query) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

async fn history_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match state.history.delete(user_id, id) {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "entry not found" })),
        )
            .into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

async fn history_clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match state.history.clear(user_id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

async fn link_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LinkCreate>,
) -> Result<Json<Link>, Response> {
    let user_id = identify(&state, &headers)?;

    state
        .store
        .create_link(user_id, payload)
        .map(Json)
        .map_err(|err| HttpError(err).into_response())
}

async fn link_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LinkCandidate>>, Response> {
    let user_id = identify(&state, &headers)?;

    state
        .store
        .recent_candidates(user_id, CORPUS_LIMIT)
        .map(Json)
        .map_err(|err| HttpError(err).into_response())
}

#[derive(Debug, Deserialize)]
struct PinRequest {
    pinned: bool,
}

async fn link_pin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<PinRequest>,
) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match state.store.set_pinned(user_id, id, payload.pinned) {
        Ok(true) => StatusCode::OK.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "link not found" })),
        )
            .into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CollectionCreateRequest {
    name: String,
    #[serde(default)]
    member_ids: Vec<u64>,
}

async fn collection_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CollectionCreateRequest>,
) -> Response {
    let user_id = match identify(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "name is required" })),
        )
            .into_response();
    }

    match state
        .store
        .create_collection(user_id, payload.name.trim(), payload.member_ids)
    {
        Ok(collection) => Json(collection).into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}
