use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{clear_poem, generate_image, generate_stanza, get_poem};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        ClearPoemResponse, GenerateImageRequest, GenerateImageResponse, GenerateStanzaRequest,
        GenerateStanzaResponse, PoemResponse, GENERATE_IMAGE_ROUTE, GENERATE_STANZA_ROUTE,
        POEM_ROUTE,
    },
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::app_state::AppState;

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const BODY_TOO_LARGE: &str = "Request body is too large.";
const BODY_INVALID: &str = "Request body is not valid JSON for this route.";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(POEM_ROUTE, get(http_get_poem).delete(http_clear_poem))
        .route(GENERATE_STANZA_ROUTE, post(http_generate_stanza))
        .route(GENERATE_IMAGE_ROUTE, post(http_generate_image))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_get_poem(State(state): State<Arc<AppState>>) -> Json<PoemResponse> {
    Json(get_poem(&state.api).await)
}

async fn http_clear_poem(State(state): State<Arc<AppState>>) -> Json<ClearPoemResponse> {
    Json(clear_poem(&state.api).await)
}

async fn http_generate_stanza(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateStanzaRequest>, JsonRejection>,
) -> ApiResult<GenerateStanzaResponse> {
    let Json(req) = payload.map_err(malformed_body)?;
    generate_stanza(&state.api, req.user_contribution.as_deref())
        .await
        .map(Json)
        .map_err(into_response)
}

async fn http_generate_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> ApiResult<GenerateImageResponse> {
    let Json(req) = payload.map_err(malformed_body)?;
    generate_image(&state.api, req.stanza.as_deref())
        .await
        .map(Json)
        .map_err(into_response)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Provider => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

/// Body rejections, including the size cap, are validation errors with a
/// fixed message; the parser's detail only goes to the log.
fn malformed_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    warn!(%rejection, "rejected request body");
    let message = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BODY_TOO_LARGE
    } else {
        BODY_INVALID
    };
    into_response(ApiError::validation(message))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
