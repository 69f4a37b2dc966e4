use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ephemera_ratelimit::Bucket;

use crate::client::ClientKey;
use crate::error::{AppError, Result};
use crate::model::{
    CreatePasteRequest, CreatePasteResponse, ExpiryOptionView, ExpiryOptionsResponse,
    PasteResponse,
};
use crate::state::AppState;

pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

fn admit(state: &AppState, client: &ClientKey, bucket: Bucket) -> Result<HeaderValue> {
    let limiters = state.limiters();
    if !limiters.is_allowed(client.as_str(), bucket) {
        return Err(AppError::RateLimited(bucket));
    }
    Ok(HeaderValue::from(limiters.remaining(client.as_str(), bucket)))
}

pub async fn create_paste_handler(
    State(state): State<AppState>,
    client: ClientKey,
    request: std::result::Result<Json<CreatePasteRequest>, JsonRejection>,
) -> Result<Response> {
    let remaining = admit(&state, &client, Bucket::Create)?;
    let Json(request) = request?;

    let expiry = request.expiry.as_deref().unwrap_or_default();
    let receipt = state.pastebin().create_paste(&request.content, expiry).await?;

    let body = CreatePasteResponse::new(
        &receipt.id,
        state.paste_url(&receipt.id),
        receipt.expires_at,
    );
    Ok((
        StatusCode::CREATED,
        [(RATE_LIMIT_REMAINING, remaining)],
        Json(body),
    )
        .into_response())
}

pub async fn get_paste_handler(
    State(state): State<AppState>,
    client: ClientKey,
    Path(id): Path<String>,
) -> Result<Response> {
    let remaining = admit(&state, &client, Bucket::View)?;

    let paste = state.pastebin().get_paste(&id).await?;
    Ok((
        [(RATE_LIMIT_REMAINING, remaining)],
        Json(PasteResponse::from(paste)),
    )
        .into_response())
}

pub async fn expiry_options_handler(State(state): State<AppState>) -> Json<ExpiryOptionsResponse> {
    let policy = state.pastebin().expiry_policy();
    Json(ExpiryOptionsResponse {
        options: policy.options().iter().map(ExpiryOptionView::from).collect(),
        default: policy.default_option().key.to_string(),
    })
}
