// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_results' table in the database.
/// Append-only: a row is inserted exactly once when an attempt completes and
/// is never updated or deleted afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    /// Subject course code, e.g. "VU23213".
    pub subject: String,
    /// "easy", "medium" or "hard".
    pub difficulty: String,
    pub score: i32,
    pub total_questions: i32,
    /// round(score / total_questions * 100), fixed at insert time.
    pub percentage: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A result row joined with its owning user, as fetched for the leaderboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResultWithUser {
    pub user_id: i64,
    pub username: String,
    pub subject: String,
    pub difficulty: String,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
