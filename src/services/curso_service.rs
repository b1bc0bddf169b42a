// src/services/curso_service.rs
use crate::{
    error::{AppError, AppResult},
    models::curso::{Curso, Modulo},
    models::user::TipoUtilizador,
    services::user_service,
};
use sqlx::SqlitePool;

pub async fn criar_curso(
    pool: &SqlitePool,
    nome: &str,
    descricao: &str,
    carga_horaria_total: i64,
) -> AppResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cursos (nome, descricao, carga_horaria_total) \
         VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(nome)
    .bind(descricao)
    .bind(carga_horaria_total)
    .fetch_one(pool)
    .await?;
    tracing::info!("Curso '{}' criado (id {})", nome, id);
    Ok(id)
}

/// Cria um módulo num curso, atribuído a um formador.
/// O responsável tem de ser mesmo um Formador (restrição do domínio).
pub async fn criar_modulo(
    pool: &SqlitePool,
    curso_id: i64,
    formador_id: i64,
    nome: &str,
    descricao: &str,
    carga_horaria: i64,
) -> AppResult<i64> {
    let curso: Option<i64> = sqlx::query_scalar("SELECT id FROM cursos WHERE id = ?1")
        .bind(curso_id)
        .fetch_optional(pool)
        .await?;
    if curso.is_none() {
        return Err(AppError::NaoEncontrado("Curso"));
    }

    let formador = user_service::exigir_por_id(pool, formador_id).await?;
    if formador.tipo != TipoUtilizador::Formador {
        return Err(AppError::DadosInvalidos("o responsável do módulo deve ser um Formador"));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO modulos (curso_id, formador_id, nome, descricao, carga_horaria) \
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(curso_id)
    .bind(formador_id)
    .bind(nome)
    .bind(descricao)
    .bind(carga_horaria)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn buscar_modulo(pool: &SqlitePool, modulo_id: i64) -> AppResult<Option<Modulo>> {
    let modulo = sqlx::query_as::<_, Modulo>(
        "SELECT id, curso_id, formador_id, nome, descricao, carga_horaria \
         FROM modulos WHERE id = ?1",
    )
    .bind(modulo_id)
    .fetch_optional(pool)
    .await?;
    Ok(modulo)
}

/// Módulos atribuídos a um formador.
pub async fn modulos_do_formador(pool: &SqlitePool, formador_id: i64) -> AppResult<Vec<Modulo>> {
    let modulos = sqlx::query_as::<_, Modulo>(
        "SELECT id, curso_id, formador_id, nome, descricao, carga_horaria \
         FROM modulos WHERE formador_id = ?1 ORDER BY id ASC",
    )
    .bind(formador_id)
    .fetch_all(pool)
    .await?;
    Ok(modulos)
}

pub async fn listar_cursos(pool: &SqlitePool) -> AppResult<Vec<Curso>> {
    let cursos = sqlx::query_as::<_, Curso>(
        "SELECT id, nome, descricao, carga_horaria_total FROM cursos ORDER BY nome ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(cursos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste};

    #[tokio::test]
    async fn modulo_exige_responsavel_formador() {
        let pool = pool_teste().await;
        let (formador_id, formando_id, _) = cenario_base(&pool).await;
        let curso_id = criar_curso(&pool, "Outro Curso", "", 500).await.unwrap();

        // Um formando não pode ser responsável por um módulo
        let erro = criar_modulo(&pool, curso_id, formando_id, "Mód. X", "", 40)
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::DadosInvalidos(_)));

        let modulo_id = criar_modulo(&pool, curso_id, formador_id, "Mód. X", "", 40)
            .await
            .unwrap();
        let modulos = modulos_do_formador(&pool, formador_id).await.unwrap();
        assert!(modulos.iter().any(|m| m.id == modulo_id));
    }
}
