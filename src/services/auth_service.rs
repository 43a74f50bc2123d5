//! Magic-link sign-in backed by SQLite.
//!
//! Only SHA-256 hashes of link and session tokens are stored. Delivering the
//! link by email is out of scope; the link is logged instead.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::{AuthChange, AuthError, AuthResult, IssuedSession, MagicLink, SessionProvider};
use crate::models::user::SessionUser;

const MAGIC_LINK_TTL_MINUTES: i64 = 15;
const AUTH_CHANGE_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AuthService {
    db: Arc<SqlitePool>,
    public_url: String,
    changes: broadcast::Sender<AuthChange>,
}

impl AuthService {
    pub fn new(db: Arc<SqlitePool>, public_url: impl Into<String>) -> Self {
        let (changes, _) = broadcast::channel(AUTH_CHANGE_CAPACITY);
        Self {
            db,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            changes,
        }
    }

    async fn upsert_user(&self, email: &str) -> AuthResult<SessionUser> {
        sqlx::query(
            "INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)
             ON CONFLICT(email) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(email)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        let user = sqlx::query_as::<_, SessionUser>("SELECT id, email FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&*self.db)
            .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: &str) -> AuthResult<SessionUser> {
        let user = sqlx::query_as::<_, SessionUser>("SELECT id, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&*self.db)
            .await?;
        Ok(user)
    }

    fn notify(&self, change: AuthChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl SessionProvider for AuthService {
    async fn get_current_user(&self, access_token: &str) -> AuthResult<Option<SessionUser>> {
        let user = sqlx::query_as::<_, SessionUser>(
            "SELECT users.id, users.email FROM sessions
             JOIN users ON users.id = sessions.user_id
             WHERE sessions.token_hash = ?",
        )
        .bind(hash_token(access_token))
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    fn on_auth_change(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn sign_in_with_magic_link(&self, email: &str) -> AuthResult<MagicLink> {
        let email = normalize_email(email)?;
        let user = self.upsert_user(&email).await?;

        let token = new_token();
        let expires_at = Utc::now() + Duration::minutes(MAGIC_LINK_TTL_MINUTES);
        sqlx::query(
            "INSERT INTO magic_links (token_hash, user_id, expires_at, consumed)
             VALUES (?, ?, ?, 0)",
        )
        .bind(hash_token(&token))
        .bind(&user.id)
        .bind(expires_at)
        .execute(&*self.db)
        .await?;

        let url = format!("{}/auth/verify?token={}", self.public_url, token);
        info!(email = %email, "magic link issued: {}", url);
        Ok(MagicLink {
            email,
            url,
            token,
            expires_at,
        })
    }

    async fn complete_magic_link(&self, link_token: &str) -> AuthResult<IssuedSession> {
        let token_hash = hash_token(link_token);
        let row: Option<(String, DateTime<Utc>, bool)> = sqlx::query_as(
            "SELECT user_id, expires_at, consumed FROM magic_links WHERE token_hash = ?",
        )
        .bind(&token_hash)
        .fetch_optional(&*self.db)
        .await?;

        let Some((user_id, expires_at, consumed)) = row else {
            return Err(AuthError::InvalidLink);
        };
        if consumed || expires_at < Utc::now() {
            debug!(user_id = %user_id, "rejected spent or expired magic link");
            return Err(AuthError::InvalidLink);
        }

        let claimed =
            sqlx::query("UPDATE magic_links SET consumed = 1 WHERE token_hash = ? AND consumed = 0")
                .bind(&token_hash)
                .execute(&*self.db)
                .await?;
        if claimed.rows_affected() == 0 {
            return Err(AuthError::InvalidLink);
        }

        let access_token = new_token();
        sqlx::query("INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(hash_token(&access_token))
            .bind(&user_id)
            .bind(Utc::now())
            .execute(&*self.db)
            .await?;

        let user = self.user_by_id(&user_id).await?;
        info!(user_id = %user.id, "signed in");
        self.notify(AuthChange::SignedIn(user.clone()));
        Ok(IssuedSession { access_token, user })
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let user_id: Option<String> =
            sqlx::query_scalar("DELETE FROM sessions WHERE token_hash = ? RETURNING user_id")
                .bind(hash_token(access_token))
                .fetch_optional(&*self.db)
                .await?;

        if let Some(user_id) = user_id {
            info!(user_id = %user_id, "signed out");
            self.notify(AuthChange::SignedOut { user_id });
        }
        Ok(())
    }
}

fn new_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Trim and lower-case, then require `local@domain` with no whitespace.
fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_validates_emails() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "@example.com", "ada@", "a b@example.com", "a@b@c"] {
            assert!(normalize_email(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn tokens_are_unique_and_hash_deterministically() {
        let a = new_token();
        let b = new_token();
        assert_ne!(a, b);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_ne!(hash_token(&a), hash_token(&b));
        assert_eq!(hash_token(&a).len(), 64);
    }
}
