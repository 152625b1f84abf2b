// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, catalog, quiz, results},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, catalog, quiz, results).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, catalog, sessions).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let catalog_routes = Router::new().route("/", get(catalog::get_catalog));

    // Every session operation needs a resolved identity: sessions are keyed
    // by user id, and an unauthenticated start must bounce to login.
    let quiz_routes = Router::new()
        .route("/session", get(quiz::current_session))
        .route("/subject", post(quiz::select_subject))
        .route("/difficulty", post(quiz::select_difficulty))
        .route("/start", post(quiz::start_quiz))
        .route("/answer", post(quiz::submit_answer))
        .route("/reset", post(quiz::reset_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let results_routes = Router::new()
        .route("/me", get(results::my_results))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/results", results_routes)
        .route("/api/leaderboard", get(results::get_leaderboard))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
