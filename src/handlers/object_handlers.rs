//! Serves object payloads behind signed URLs. Bodies are streamed, never
//! buffered in memory.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::{errors::AppError, state::AppState};

/// The signature half of a signed URL.
#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

/// `GET /objects/{*key}?expires=&signature=`
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(q): Query<SignedQuery>,
) -> Result<Response, AppError> {
    state.signer.verify(&key, q.expires, &q.signature)?;
    let reader = state.objects.open_object(&key).await?;

    let mut response = Response::new(Body::from_stream(ReaderStream::new(reader)));
    *response.status_mut() = StatusCode::OK;

    let content_type = mime_guess::from_path(&key).first_or_octet_stream();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-store"));

    Ok(response)
}
