//! Signed-in identity as seen by the library.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The user behind a session.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}
