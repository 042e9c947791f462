use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jyutping_dict::{JyutpingDict, LookupError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub dict: Arc<JyutpingDict>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct SuggestionsQuery {
    pub key: Option<String>,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    key: String,
    total: usize,
    items: Vec<String>,
}

#[derive(Serialize)]
pub struct PrefixFreqResponse {
    total: usize,
    prefixes: BTreeMap<char, usize>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    keys: usize,
    words: usize,
    source: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/suggestions", get(suggestions))
        .route("/v1/prefix-freq", get(prefix_freq))
        .route("/v1/stats", get(stats))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionsQuery>,
) -> Result<Response, ApiError> {
    let key = params.key.unwrap_or_default();
    let key = key.trim();
    if key.is_empty() {
        return Err(ApiError::bad_request("key is required"));
    }

    let items = state.dict.suggested_characters(key)?.to_vec();
    debug!("{} candidates for {key}", items.len());
    let response = SuggestionsResponse {
        key: key.to_string(),
        total: items.len(),
        items,
    };
    Ok(cached(&state, Json(response)))
}

async fn prefix_freq(State(state): State<AppState>) -> Response {
    let prefixes: BTreeMap<char, usize> = state
        .dict
        .prefix_freq()
        .iter()
        .map(|(initial, count)| (*initial, *count))
        .collect();
    let response = PrefixFreqResponse {
        total: prefixes.values().sum(),
        prefixes,
    };
    cached(&state, Json(response))
}

async fn stats(State(state): State<AppState>) -> Response {
    let response = StatsResponse {
        keys: state.dict.key_count(),
        words: state.dict.word_count(),
        source: state.dict.source_path().display().to_string(),
    };
    cached(&state, Json(response))
}

fn cached(state: &AppState, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=300"),
        )],
        body,
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    NotFound(#[from] LookupError),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotFound(err) => {
                let body = Json(ErrorResponse {
                    error: err.to_string(),
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
        }
    }
}
