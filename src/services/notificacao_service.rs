// src/services/notificacao_service.rs
use crate::{
    error::AppResult,
    models::notificacao::{Notificacao, TipoNotificacao},
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::presenca::FORMATO_TIMESTAMP;

/// Cria uma notificação. Aceita qualquer executor para poder participar
/// na mesma transação que a operação que a originou.
pub async fn criar<'e, E>(
    db: E,
    utilizador_id: i64,
    titulo: &str,
    mensagem: &str,
    tipo: TipoNotificacao,
) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let agora = Utc::now().naive_utc().format(FORMATO_TIMESTAMP).to_string();
    sqlx::query(
        "INSERT INTO notificacoes (utilizador_id, titulo, mensagem, tipo, data, lida) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
    )
    .bind(utilizador_id)
    .bind(titulo)
    .bind(mensagem)
    .bind(tipo.as_str())
    .bind(&agora)
    .execute(db)
    .await?;
    tracing::debug!("Notificação '{}' criada para o utilizador {}", titulo, utilizador_id);
    Ok(())
}

/// Notificações não lidas de um utilizador, mais recentes primeiro.
pub async fn nao_lidas(pool: &SqlitePool, utilizador_id: i64) -> AppResult<Vec<Notificacao>> {
    let notificacoes = sqlx::query_as::<_, Notificacao>(
        "SELECT id, utilizador_id, titulo, mensagem, tipo, data, lida \
         FROM notificacoes WHERE utilizador_id = ?1 AND lida = 0 \
         ORDER BY data DESC, id DESC",
    )
    .bind(utilizador_id)
    .fetch_all(pool)
    .await?;
    Ok(notificacoes)
}

/// Marca uma notificação como lida. Restringida ao dono: o id sozinho não
/// chega para marcar notificações de outro utilizador.
pub async fn marcar_lida(pool: &SqlitePool, utilizador_id: i64, notificacao_id: i64) -> AppResult<bool> {
    let resultado = sqlx::query(
        "UPDATE notificacoes SET lida = 1 WHERE id = ?1 AND utilizador_id = ?2 AND lida = 0",
    )
    .bind(notificacao_id)
    .bind(utilizador_id)
    .execute(pool)
    .await?;
    Ok(resultado.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste};

    #[tokio::test]
    async fn criar_listar_e_marcar_lida() {
        let pool = pool_teste().await;
        let (_, formando_id, _) = cenario_base(&pool).await;

        criar(&pool, formando_id, "Aviso", "Aula amanhã de manhã", TipoNotificacao::Aula)
            .await
            .unwrap();

        let pendentes = nao_lidas(&pool, formando_id).await.unwrap();
        assert_eq!(pendentes.len(), 1);
        assert_eq!(pendentes[0].titulo, "Aviso");
        assert_eq!(pendentes[0].tipo, TipoNotificacao::Aula);

        assert!(marcar_lida(&pool, formando_id, pendentes[0].id).await.unwrap());
        assert!(nao_lidas(&pool, formando_id).await.unwrap().is_empty());

        // Outro utilizador não consegue marcar notificações alheias
        assert!(!marcar_lida(&pool, formando_id + 1, pendentes[0].id).await.unwrap());
    }
}
