use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tailchain_ledger::LedgerStore;
use tailchain_protocol::{entry_path, parse_cursor_segment, parse_hash_segment, EntryEnvelope};
use tailchain_types::ChainHash;
use tokio_util::sync::CancellationToken;

use crate::error::ServerResult;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
    /// Fired on shutdown; releases every pending long-poll.
    pub shutdown: CancellationToken,
}

/// `GET|HEAD /<hash>`.
pub async fn entry_handler(
    State(state): State<AppState>,
    method: Method,
    Path(hash): Path<String>,
) -> ServerResult<Response> {
    let hash = parse_hash_segment(&hash)?;
    let linked = state.store.get_linked(&hash)?;
    let envelope = EntryEnvelope::from_linked(&linked);

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(envelope.content.clone())
    };
    Ok((StatusCode::OK, envelope.headers(), body).into_response())
}

/// `GET /` and `GET /next/`: the first entry, waiting for it if needed.
pub async fn first_handler(State(state): State<AppState>) -> ServerResult<Response> {
    redirect_to_next(&state, None).await
}

/// `GET /next/<hash>`: the entry after `<hash>`, waiting for it if needed.
pub async fn next_handler(
    State(state): State<AppState>,
    Path(cursor): Path<String>,
) -> ServerResult<Response> {
    let cursor = parse_cursor_segment(&cursor)?;
    redirect_to_next(&state, cursor).await
}

async fn redirect_to_next(state: &AppState, cursor: Option<ChainHash>) -> ServerResult<Response> {
    let entry = state
        .store
        .wait_for_next(cursor.as_ref(), &state.shutdown)
        .await?;
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(LOCATION, entry_path(&entry.hash()))],
    )
        .into_response())
}

/// Unmatched paths: 404 for reads, 405 for everything else.
pub async fn fallback_handler(method: Method) -> StatusCode {
    if method == Method::GET || method == Method::HEAD {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::METHOD_NOT_ALLOWED
    }
}
