// src/handlers/catalog.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::state::AppState;

/// Selection-screen view of the question bank: every subject with the
/// difficulties that have content and their question counts.
pub async fn get_catalog(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.overview())
}
