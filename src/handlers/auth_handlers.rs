//! Magic-link sign-in endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    models::user::SessionUser,
    services::session::{CurrentUser, IssuedSession, Session},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MagicLinkReq {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: Option<SessionUser>,
}

/// `POST /auth/magic-link`: the link itself is never returned to the caller.
pub async fn request_magic_link(
    State(state): State<AppState>,
    Json(req): Json<MagicLinkReq>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.sign_in_with_magic_link(&req.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "sent" })),
    ))
}

/// `GET /auth/verify?token=`: redeem a magic link for a bearer token.
pub async fn verify_magic_link(
    State(state): State<AppState>,
    Query(q): Query<VerifyQuery>,
) -> Result<Json<IssuedSession>, AppError> {
    Ok(Json(state.sessions.complete_magic_link(&q.token).await?))
}

/// `GET /auth/user`
pub async fn current_user(session: Session) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user: session.current_user().cloned(),
    })
}

/// `POST /auth/sign-out`
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
) -> Result<StatusCode, AppError> {
    let token = session
        .token()
        .ok_or_else(|| AppError::unauthorized("not signed in"))?;
    state.sessions.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}
