// src/services/estatisticas_service.rs
//
// Métricas agregadas para o painel do formador e exportação CSV.
use crate::{
    error::AppResult,
    models::aula::Periodo,
    models::curso::ResumoModulo,
};
use sqlx::SqlitePool;

/// Resumo de todos os módulos de um formador: total de aulas, presenças,
/// faltas e atrasos (registos com motivo de atraso preenchido).
pub async fn resumos_do_formador(
    pool: &SqlitePool,
    formador_id: i64,
) -> AppResult<Vec<ResumoModulo>> {
    let resumos = sqlx::query_as::<_, ResumoModulo>(
        "SELECT m.id AS modulo_id, m.nome, \
            (SELECT COUNT(*) FROM aulas a WHERE a.modulo_id = m.id) AS total_aulas, \
            (SELECT COUNT(*) FROM registos_presenca r JOIN aulas a ON a.id = r.aula_id \
             WHERE a.modulo_id = m.id AND r.entrada IS NOT NULL) AS presencas, \
            (SELECT COUNT(*) FROM registos_presenca r JOIN aulas a ON a.id = r.aula_id \
             WHERE a.modulo_id = m.id AND r.entrada IS NULL) AS faltas, \
            (SELECT COUNT(*) FROM registos_presenca r JOIN aulas a ON a.id = r.aula_id \
             WHERE a.modulo_id = m.id AND r.motivo_atraso <> '') AS atrasos \
         FROM modulos m WHERE m.formador_id = ?1 ORDER BY m.id ASC",
    )
    .bind(formador_id)
    .fetch_all(pool)
    .await?;
    Ok(resumos)
}

/// Um ponto da série temporal de presenças de um módulo (uma aula).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PontoSerie {
    pub data: String,
    pub periodo: Periodo,
    pub total: i64,
    pub presencas: i64,
}

impl PontoSerie {
    /// Taxa de presença em percentagem; 0 quando a aula não tem registos.
    pub fn taxa(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.presencas as f64 / self.total as f64) * 100.0
        }
    }
}

/// Série temporal de presenças por aula de um módulo, por ordem cronológica.
pub async fn serie_do_modulo(pool: &SqlitePool, modulo_id: i64) -> AppResult<Vec<PontoSerie>> {
    let pontos = sqlx::query_as::<_, PontoSerie>(
        "SELECT a.data, a.periodo, \
                COUNT(r.id) AS total, \
                COALESCE(SUM(CASE WHEN r.entrada IS NOT NULL THEN 1 ELSE 0 END), 0) AS presencas \
         FROM aulas a \
         LEFT JOIN registos_presenca r ON r.aula_id = a.id \
         WHERE a.modulo_id = ?1 \
         GROUP BY a.id \
         ORDER BY a.data ASC, a.periodo ASC",
    )
    .bind(modulo_id)
    .fetch_all(pool)
    .await?;
    Ok(pontos)
}

/// Serializa a série para CSV com separador ';' (compatível com o Excel
/// em locales europeus).
pub fn exportar_csv(pontos: &[PontoSerie]) -> String {
    let mut csv = String::from("Data;Período;Presenças;Total;Taxa de Presença (%)\n");
    for ponto in pontos {
        csv.push_str(&format!(
            "{};{};{};{};{:.1}\n",
            ponto.data,
            ponto.periodo.legivel(),
            ponto.presencas,
            ponto.total,
            ponto.taxa()
        ));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste};
    use crate::models::presenca::StatusPresenca;
    use crate::services::{codigo_service, presenca_service};

    #[tokio::test]
    async fn resumo_conta_presencas_faltas_e_atrasos() {
        let pool = pool_teste().await;
        let (formador_id, formando_id, aula_id) = cenario_base(&pool).await;

        // Uma presença com atraso via código...
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        presenca_service::registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Atrasado,
            Some("Transporte".to_string()),
            None,
        )
        .await
        .unwrap();

        // ...e uma falta semeada de outro formando
        let outro: i64 = sqlx::query_scalar(
            "INSERT INTO utilizadores (username, password_hash, nome, tipo) \
             VALUES ('x.y.111111111', 'hash', 'Xavier Yanes', 'Formando') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO registos_presenca (formando_id, aula_id) VALUES (?1, ?2)")
            .bind(outro)
            .bind(aula_id)
            .execute(&pool)
            .await
            .unwrap();

        let resumos = resumos_do_formador(&pool, formador_id).await.unwrap();
        assert_eq!(resumos.len(), 1);
        let resumo = &resumos[0];
        assert_eq!(resumo.total_aulas, 1);
        assert_eq!(resumo.presencas, 1);
        assert_eq!(resumo.faltas, 1);
        assert_eq!(resumo.atrasos, 1);
    }

    #[tokio::test]
    async fn serie_e_csv_refletem_a_taxa_de_presenca() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let modulo_id: i64 = sqlx::query_scalar("SELECT modulo_id FROM aulas WHERE id = ?1")
            .bind(aula_id)
            .fetch_one(&pool)
            .await
            .unwrap();

        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        presenca_service::registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap();

        let serie = serie_do_modulo(&pool, modulo_id).await.unwrap();
        assert_eq!(serie.len(), 1);
        assert_eq!(serie[0].total, 1);
        assert_eq!(serie[0].presencas, 1);
        assert!((serie[0].taxa() - 100.0).abs() < f64::EPSILON);

        let csv = exportar_csv(&serie);
        let mut linhas = csv.lines();
        assert_eq!(
            linhas.next(),
            Some("Data;Período;Presenças;Total;Taxa de Presença (%)")
        );
        let linha = linhas.next().expect("uma linha de dados");
        assert!(linha.ends_with(";Manhã;1;1;100.0") || linha.ends_with(";Tarde;1;1;100.0"));
    }
}
