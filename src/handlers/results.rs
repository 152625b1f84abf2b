// src/handlers/results.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    aggregate::build_leaderboard,
    error::AppError,
    models::quiz_result::{QuizResult, ResultWithUser},
    utils::jwt::Claims,
};

/// The caller's result history, newest first. Rows are returned verbatim;
/// the only processing is the sort.
pub async fn my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let results = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, subject, difficulty, score, total_questions, percentage, created_at
        FROM quiz_results
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch result history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Recomputes the global leaderboard from every persisted result. A fetch
/// failure is a 500 so clients can show a retryable error rather than
/// mistaking it for an empty board.
pub async fn get_leaderboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ResultWithUser>(
        r#"
        SELECT r.user_id, u.username, r.subject, r.difficulty,
               r.score, r.total_questions, r.percentage, r.created_at
        FROM quiz_results r
        JOIN users u ON r.user_id = u.id
        ORDER BY r.created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard rows: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(build_leaderboard(&rows)))
}
