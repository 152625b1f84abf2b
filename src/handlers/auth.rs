// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, User},
    utils::jwt::sign_jwt,
};

/// Resolves a username to a stable user identity.
///
/// Trims and validates the name, then runs a single idempotent upsert: the
/// row is created lazily on first login and the existing row is returned on
/// every later login, so concurrent logins with the same name can never
/// produce duplicate users. Returns the user plus a signed JWT.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = LoginRequest {
        username: payload.username.trim().to_string(),
    };
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // The no-op DO UPDATE makes RETURNING yield the existing row on conflict.
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username)
        VALUES ($1)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id, username, created_at
        "#,
    )
    .bind(&payload.username)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Identity resolution failed for '{}': {:?}", payload.username, e);
        AppError::from(e)
    })?;

    let token = sign_jwt(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}
