// src/services/aula_service.rs
use crate::{
    error::{AppError, AppResult},
    models::aula::{Aula, AulaComModulo, Periodo},
};
use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;

const COLUNAS_COM_MODULO: &str =
    "SELECT a.id, a.modulo_id, a.data, a.periodo, m.nome AS modulo_nome, \
            m.formador_id, c.nome AS curso_nome, m.carga_horaria \
     FROM aulas a \
     JOIN modulos m ON m.id = a.modulo_id \
     JOIN cursos c ON c.id = m.curso_id";

fn hoje() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

pub async fn buscar_aula(pool: &SqlitePool, aula_id: i64) -> AppResult<Option<AulaComModulo>> {
    let sql = format!("{} WHERE a.id = ?1", COLUNAS_COM_MODULO);
    let aula = sqlx::query_as::<_, AulaComModulo>(&sql)
        .bind(aula_id)
        .fetch_optional(pool)
        .await?;
    Ok(aula)
}

/// Aulas agendadas para hoje (painel do formando), manhã primeiro.
pub async fn aulas_de_hoje(pool: &SqlitePool) -> AppResult<Vec<AulaComModulo>> {
    let sql = format!("{} WHERE a.data = ?1 ORDER BY a.periodo ASC", COLUNAS_COM_MODULO);
    let aulas = sqlx::query_as::<_, AulaComModulo>(&sql)
        .bind(hoje())
        .fetch_all(pool)
        .await?;
    Ok(aulas)
}

/// Aulas de hoje dos módulos de um formador (gerador de códigos).
pub async fn aulas_de_hoje_do_formador(
    pool: &SqlitePool,
    formador_id: i64,
) -> AppResult<Vec<AulaComModulo>> {
    let sql = format!(
        "{} WHERE a.data = ?1 AND m.formador_id = ?2 ORDER BY a.periodo ASC",
        COLUNAS_COM_MODULO
    );
    let aulas = sqlx::query_as::<_, AulaComModulo>(&sql)
        .bind(hoje())
        .bind(formador_id)
        .fetch_all(pool)
        .await?;
    Ok(aulas)
}

/// Aulas de um módulo num intervalo de datas, mais recentes primeiro.
pub async fn aulas_do_modulo(
    pool: &SqlitePool,
    modulo_id: i64,
    inicio: &str,
    fim: &str,
) -> AppResult<Vec<Aula>> {
    let aulas = sqlx::query_as::<_, Aula>(
        "SELECT id, modulo_id, data, periodo FROM aulas \
         WHERE modulo_id = ?1 AND data BETWEEN ?2 AND ?3 \
         ORDER BY data DESC, periodo ASC",
    )
    .bind(modulo_id)
    .bind(inicio)
    .bind(fim)
    .fetch_all(pool)
    .await?;
    Ok(aulas)
}

/// Cria uma aula num módulo existente. Devolve o id novo.
pub async fn criar_aula(
    pool: &SqlitePool,
    modulo_id: i64,
    data: &str,
    periodo: Periodo,
) -> AppResult<i64> {
    // Valida a data antes de gravar (formato YYYY-MM-DD)
    NaiveDate::parse_from_str(data, "%Y-%m-%d")
        .map_err(|_| AppError::DadosInvalidos("data deve ser YYYY-MM-DD"))?;

    let modulo: Option<i64> = sqlx::query_scalar("SELECT id FROM modulos WHERE id = ?1")
        .bind(modulo_id)
        .fetch_optional(pool)
        .await?;
    if modulo.is_none() {
        return Err(AppError::NaoEncontrado("Módulo"));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO aulas (modulo_id, data, periodo) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(modulo_id)
    .bind(data)
    .bind(periodo.as_str())
    .fetch_one(pool)
    .await?;
    tracing::info!("Aula criada: módulo {}, {} ({})", modulo_id, data, periodo.as_str());
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste};

    #[tokio::test]
    async fn aulas_de_hoje_incluem_a_aula_do_cenario() {
        let pool = pool_teste().await;
        let (formador_id, _, aula_id) = cenario_base(&pool).await;

        let todas = aulas_de_hoje(&pool).await.unwrap();
        assert_eq!(todas.len(), 1);
        assert_eq!(todas[0].id, aula_id);
        assert_eq!(todas[0].periodo, Periodo::Manha);

        let do_formador = aulas_de_hoje_do_formador(&pool, formador_id).await.unwrap();
        assert_eq!(do_formador.len(), 1);

        // Outro formador não tem aulas hoje
        assert!(aulas_de_hoje_do_formador(&pool, formador_id + 99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn criar_aula_exige_modulo_existente() {
        let pool = pool_teste().await;
        cenario_base(&pool).await;

        let erro = criar_aula(&pool, 9999, "2026-01-15", Periodo::Tarde).await.unwrap_err();
        assert!(matches!(erro, AppError::NaoEncontrado(_)));
    }

    #[tokio::test]
    async fn criar_aula_rejeita_data_malformada() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;
        let modulo_id: i64 = sqlx::query_scalar("SELECT modulo_id FROM aulas WHERE id = ?1")
            .bind(aula_id)
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(criar_aula(&pool, modulo_id, "15/01/2026", Periodo::Manha).await.is_err());
        assert!(criar_aula(&pool, modulo_id, "2026-01-15", Periodo::Manha).await.is_ok());
    }
}
