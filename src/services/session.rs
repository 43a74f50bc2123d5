//! Session context and the session-provider seam.
//!
//! Repositories never look up "the current user" globally. Callers pass a
//! [`Session`] (or anything implementing [`CurrentUser`]) into each call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use super::error::{LibraryError, LibraryResult};
use crate::models::user::SessionUser;

/// Accessor for the user a call is made on behalf of.
pub trait CurrentUser {
    fn current_user(&self) -> Option<&SessionUser>;

    fn require_user(&self) -> LibraryResult<&SessionUser> {
        self.current_user().ok_or(LibraryError::AuthRequired)
    }
}

/// Per-request session context.
#[derive(Clone, Debug, Default)]
pub struct Session {
    user: Option<SessionUser>,
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Bearer token the session was resolved from, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl CurrentUser for Session {
    fn current_user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}

impl CurrentUser for Option<SessionUser> {
    fn current_user(&self) -> Option<&SessionUser> {
        self.as_ref()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
    #[error("sign-in link is invalid or has expired")]
    InvalidLink,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Broadcast whenever someone signs in or out.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthChange {
    SignedIn(SessionUser),
    SignedOut { user_id: String },
}

impl AuthChange {
    /// The user now signed in, `None` after a sign-out.
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            AuthChange::SignedIn(user) => Some(user),
            AuthChange::SignedOut { .. } => None,
        }
    }
}

/// A single-use sign-in link. Its URL carries the secret token.
#[derive(Clone, Debug)]
pub struct MagicLink {
    pub email: String,
    pub url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of redeeming a magic link.
#[derive(Serialize, Clone, Debug)]
pub struct IssuedSession {
    pub access_token: String,
    pub user: SessionUser,
}

/// Issues and validates identities.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_current_user(&self, access_token: &str) -> AuthResult<Option<SessionUser>>;

    fn on_auth_change(&self) -> broadcast::Receiver<AuthChange>;

    async fn sign_in_with_magic_link(&self, email: &str) -> AuthResult<MagicLink>;

    async fn complete_magic_link(&self, link_token: &str) -> AuthResult<IssuedSession>;

    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
}
