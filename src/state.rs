use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::session::QuizSession;

/// In-memory quiz sessions, one per authenticated user. Abandoned sessions
/// simply get overwritten; nothing here is persisted.
pub type SessionMap = Arc<Mutex<HashMap<i64, QuizSession>>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config, catalog: Catalog) -> Self {
        AppState {
            pool,
            config,
            catalog: Arc::new(catalog),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
