// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
/// Identity is username-only: a row is created lazily on first login and
/// reused on every later login with the same name.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username; the sole identity key.
    pub username: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for identity resolution. The handler trims the username before
/// validating, so surrounding whitespace never counts toward the length.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
}
