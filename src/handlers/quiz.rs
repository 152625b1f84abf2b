// src/handlers/quiz.rs
//
// HTTP adapters over the session engine. Sessions are keyed by the
// authenticated user id; every handler locks the map, applies one engine
// operation, and returns the updated session view.

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::{
    catalog::{Difficulty, PublicQuestion, Subject},
    error::AppError,
    session::{FinishedAttempt, Phase, QuizSession},
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct SelectSubjectRequest {
    pub subject: Subject,
    /// Entering via a subject shortcut pins the subject across resets.
    #[serde(default)]
    pub pin: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectDifficultyRequest {
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option_index: usize,
}

/// Client-facing snapshot of a session. Never exposes correct answers for
/// questions that have not been answered yet.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub subject: Option<Subject>,
    pub difficulty: Option<Difficulty>,
    pub current_index: Option<usize>,
    pub total_questions: Option<usize>,
    pub question: Option<PublicQuestion>,
}

fn view(session: &QuizSession) -> SessionView {
    let attempt = session.attempt();
    SessionView {
        phase: session.phase(),
        subject: session.subject(),
        difficulty: session.difficulty(),
        current_index: attempt.map(|a| a.current_index()),
        total_questions: attempt.map(|a| a.total_questions()),
        question: attempt.and_then(|a| a.current_question()).map(Into::into),
    }
}

/// Returns the caller's current session state, creating nothing.
pub async fn current_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let sessions = state.sessions.lock().await;
    let snapshot = match sessions.get(&user_id) {
        Some(session) => view(session),
        None => view(&QuizSession::new()),
    };
    Ok(Json(snapshot))
}

pub async fn select_subject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SelectSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut sessions = state.sessions.lock().await;

    let session = sessions.entry(user_id).or_default();
    if req.pin {
        // Subject shortcuts always open a fresh pinned session, discarding
        // whatever was in progress.
        *session = QuizSession::pinned(req.subject);
    } else {
        session.select_subject(req.subject)?;
    }
    Ok(Json(view(session)))
}

pub async fn select_difficulty(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SelectDifficultyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut sessions = state.sessions.lock().await;
    let session = sessions.entry(user_id).or_default();
    session.select_difficulty(&state.catalog, req.difficulty)?;
    Ok(Json(view(session)))
}

/// Starts the attempt. The auth middleware guarantees a resolved identity
/// here; an unauthenticated caller is bounced with 401 before reaching the
/// engine and retries after logging in.
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut sessions = state.sessions.lock().await;
    let session = sessions.entry(user_id).or_default();
    session.start(&state.catalog, Some(user_id))?;
    Ok(Json(view(session)))
}

/// Records an answer and advances the attempt. When the last answer lands,
/// the completed result is handed to the results store on a detached task:
/// a persistence failure is logged and never disturbs the response.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&user_id)
        .ok_or(AppError::BadRequest("No quiz is in progress".to_string()))?;

    let feedback = session.submit_answer(req.option_index)?;

    if let Some(finished) = feedback.finished.clone() {
        let pool = state.pool.clone();
        tokio::spawn(async move {
            if let Err(e) = append_result(&pool, &finished).await {
                tracing::warn!(
                    "Failed to persist quiz result for user {}: {:?}",
                    finished.user_id,
                    e
                );
            }
        });
    }

    Ok(Json(serde_json::json!({
        "feedback": feedback,
        "session": view(session),
    })))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut sessions = state.sessions.lock().await;
    let session = sessions.entry(user_id).or_default();
    session.reset();
    Ok(Json(view(session)))
}

/// The only write ever issued against `quiz_results`.
async fn append_result(pool: &PgPool, record: &FinishedAttempt) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO quiz_results (user_id, subject, difficulty, score, total_questions, percentage)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.user_id)
    .bind(record.subject.code())
    .bind(record.difficulty.as_str())
    .bind(record.score)
    .bind(record.total_questions)
    .bind(record.percentage)
    .execute(pool)
    .await?;
    Ok(())
}
