// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{TipoUtilizador, Utilizador},
    services::auth_service,
};
use sqlx::SqlitePool;

/// Busca um utilizador pelo id interno.
pub async fn buscar_por_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Utilizador>> {
    let user = sqlx::query_as::<_, Utilizador>(
        "SELECT id, username, password_hash, nome, email, tipo, nif, created_at \
         FROM utilizadores WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Busca um utilizador pelo username (login).
pub async fn buscar_por_username(pool: &SqlitePool, username: &str) -> AppResult<Option<Utilizador>> {
    tracing::debug!("Buscando utilizador por username: {}", username);
    let user = sqlx::query_as::<_, Utilizador>(
        "SELECT id, username, password_hash, nome, email, tipo, nif, created_at \
         FROM utilizadores WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Todos os utilizadores de um tipo (ex: todos os formandos), por nome.
pub async fn listar_por_tipo(pool: &SqlitePool, tipo: TipoUtilizador) -> AppResult<Vec<Utilizador>> {
    let users = sqlx::query_as::<_, Utilizador>(
        "SELECT id, username, password_hash, nome, email, tipo, nif, created_at \
         FROM utilizadores WHERE tipo = ?1 ORDER BY nome ASC",
    )
    .bind(tipo.as_str())
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Cria um utilizador com a senha já em hash bcrypt. Devolve o id novo.
pub async fn criar_utilizador(
    pool: &SqlitePool,
    username: &str,
    raw_password: &str,
    nome: &str,
    email: &str,
    tipo: TipoUtilizador,
    nif: Option<i64>,
) -> AppResult<i64> {
    tracing::info!("Criando utilizador {} ({})", username, tipo.as_str());
    let password_hash = auth_service::hash_password(raw_password).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO utilizadores (username, password_hash, nome, email, tipo, nif) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(username)
    .bind(&password_hash)
    .bind(nome)
    .bind(email)
    .bind(tipo.as_str())
    .bind(nif)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Variante de `buscar_por_id` que exige a existência do utilizador.
pub async fn exigir_por_id(pool: &SqlitePool, id: i64) -> AppResult<Utilizador> {
    buscar_por_id(pool, id)
        .await?
        .ok_or(AppError::NaoEncontrado("Utilizador"))
}
