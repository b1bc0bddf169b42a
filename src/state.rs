// src/state.rs
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Estado partilhado da aplicação. A DB é a única fonte de verdade para
/// os códigos de presença: não há cache de códigos em memória.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    /// Diretório raiz para os ficheiros justificativos enviados.
    pub uploads_dir: PathBuf,
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}
