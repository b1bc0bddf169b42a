// src/services/presenca_service.rs
//
// Registo de presenças por código e correções manuais do formador.
// O resgate de um código e a criação do registo acontecem numa única
// transação: reclamar o flag do código (CAS) + inserção condicional no par
// (formando, aula) fecham as corridas de resgate duplo e de duplo envio.
use crate::{
    error::{AppError, AppResult},
    models::aula::Aula,
    models::notificacao::TipoNotificacao,
    models::presenca::{
        RegistoComFormando, RegistoPresenca, StatusPresenca, DURACAO_AULA_HORAS,
        FORMATO_TIMESTAMP,
    },
    services::{codigo_service, notificacao_service},
};
use chrono::{Duration, NaiveDateTime, Utc};
use sqlx::SqlitePool;

/// Resultado de um pedido de registo de presença.
/// `JaRegistado` é informativo, não um erro: o formando já tinha entrada
/// marcada e o pedido repetido não cria nada.
#[derive(Debug)]
pub enum ResultadoRegisto {
    Criado(RegistoPresenca),
    JaRegistado(RegistoPresenca),
}

impl ResultadoRegisto {
    pub fn registo(&self) -> &RegistoPresenca {
        match self {
            ResultadoRegisto::Criado(r) | ResultadoRegisto::JaRegistado(r) => r,
        }
    }
}

/// Busca o registo de um formando numa aula, se existir.
pub async fn buscar_registo(
    pool: &SqlitePool,
    formando_id: i64,
    aula_id: i64,
) -> AppResult<Option<RegistoPresenca>> {
    let registo = sqlx::query_as::<_, RegistoPresenca>(
        "SELECT id, formando_id, aula_id, entrada, saida, motivo_atraso, justificativo, \
                falta_justificada \
         FROM registos_presenca WHERE formando_id = ?1 AND aula_id = ?2",
    )
    .bind(formando_id)
    .bind(aula_id)
    .fetch_optional(pool)
    .await?;
    Ok(registo)
}

/// Troca um código válido por um registo de presença.
///
/// Precondições, pela ordem em que são verificadas:
/// 1. já existe registo com entrada -> devolve o existente (sem consumir o código);
/// 2. código nunca emitido ou de outra aula -> `CodigoInvalido` (sem consumir);
/// 3. código expirado, já consumido, ou perdido para um pedido concorrente ->
///    `CodigoExpirado`.
///
/// `motivo_atraso` e `justificativo` só são gravados quando o estado
/// declarado é `Atrasado`. A saída é fixada em entrada + 3 horas (duração
/// assumida da aula, não derivada do horário real).
pub async fn registar_presenca(
    pool: &SqlitePool,
    formando_id: i64,
    aula_id: i64,
    codigo: &str,
    status: StatusPresenca,
    motivo_atraso: Option<String>,
    justificativo: Option<String>,
) -> AppResult<ResultadoRegisto> {
    let agora = Utc::now().naive_utc();

    let formando: Option<i64> =
        sqlx::query_scalar("SELECT id FROM utilizadores WHERE id = ?1")
            .bind(formando_id)
            .fetch_optional(pool)
            .await?;
    if formando.is_none() {
        return Err(AppError::NaoEncontrado("Formando"));
    }

    // Caminho rápido: já tem entrada marcada. A inserção condicional mais
    // abaixo fecha a corrida de qualquer maneira; isto só evita consumir
    // o código num pedido repetido.
    if let Some(existente) = buscar_registo(pool, formando_id, aula_id).await? {
        if existente.presente() {
            tracing::debug!(
                "Formando {} já tem presença na aula {}, pedido ignorado",
                formando_id,
                aula_id
            );
            return Ok(ResultadoRegisto::JaRegistado(existente));
        }
    }

    let mut tx = pool.begin().await?;

    // O código apresentado tem de resolver para ESTA aula
    let linha = match codigo_service::buscar_codigo_valido(&mut *tx, codigo).await? {
        Some(linha) => linha,
        None => {
            // Distingue "nunca emitido" de "já consumido" para a mensagem certa
            let ja_existiu: Option<i64> =
                sqlx::query_scalar("SELECT id FROM codigos_presenca WHERE codigo = ?1 LIMIT 1")
                    .bind(codigo)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(if ja_existiu.is_some() {
                AppError::CodigoExpirado
            } else {
                AppError::CodigoInvalido
            });
        }
    };
    if linha.aula_id != aula_id {
        // Código de outra aula: rejeita sem o consumir
        return Err(AppError::CodigoInvalido);
    }
    if !linha.dentro_da_validade(agora) {
        return Err(AppError::CodigoExpirado);
    }

    // Reclama o código: valido 1 -> 0 no mesmo UPDATE que verifica a janela.
    // Zero linhas afetadas = um pedido concorrente ganhou entretanto.
    if !codigo_service::reclamar_codigo(&mut *tx, codigo, aula_id, agora).await? {
        return Err(AppError::CodigoExpirado);
    }

    let entrada = agora.format(FORMATO_TIMESTAMP).to_string();
    let saida = (agora + Duration::hours(DURACAO_AULA_HORAS))
        .format(FORMATO_TIMESTAMP)
        .to_string();
    let (motivo, justif) = match status {
        StatusPresenca::Atrasado => (motivo_atraso.unwrap_or_default(), justificativo),
        _ => (String::new(), None),
    };

    // Inserção condicional: só cria (ou preenche um registo de falta ainda
    // sem entrada); nunca sobrepõe uma entrada existente.
    let resultado = sqlx::query(
        "INSERT INTO registos_presenca \
             (formando_id, aula_id, entrada, saida, motivo_atraso, justificativo) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT (formando_id, aula_id) DO UPDATE SET \
             entrada = excluded.entrada, \
             saida = excluded.saida, \
             motivo_atraso = excluded.motivo_atraso, \
             justificativo = excluded.justificativo \
         WHERE registos_presenca.entrada IS NULL",
    )
    .bind(formando_id)
    .bind(aula_id)
    .bind(&entrada)
    .bind(&saida)
    .bind(&motivo)
    .bind(&justif)
    .execute(&mut *tx)
    .await?;

    if resultado.rows_affected() == 0 {
        // Envio duplicado do mesmo formando ganhou a corrida: desfaz a
        // reclamação do código e devolve o registo que ficou gravado.
        tx.rollback().await?;
        let existente = buscar_registo(pool, formando_id, aula_id)
            .await?
            .ok_or(AppError::InternalServerError)?;
        return Ok(ResultadoRegisto::JaRegistado(existente));
    }

    notificacao_service::criar(
        &mut *tx,
        formando_id,
        "Presença registada",
        &format!("A sua presença na aula {} foi registada com sucesso.", aula_id),
        TipoNotificacao::Presenca,
    )
    .await?;

    tx.commit().await?;
    tracing::info!(
        "Presença registada: formando {} na aula {} (código {})",
        formando_id,
        aula_id,
        codigo
    );

    let registo = buscar_registo(pool, formando_id, aula_id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    Ok(ResultadoRegisto::Criado(registo))
}

/// Correção manual de um registo pelo formador (sem validação de código).
/// Tri-estado: Presente / Falta / Atrasado.
pub async fn corrigir_registo(
    pool: &SqlitePool,
    registo_id: i64,
    novo_status: StatusPresenca,
    justificacao: Option<String>,
) -> AppResult<RegistoPresenca> {
    let registo = sqlx::query_as::<_, RegistoPresenca>(
        "SELECT id, formando_id, aula_id, entrada, saida, motivo_atraso, justificativo, \
                falta_justificada \
         FROM registos_presenca WHERE id = ?1",
    )
    .bind(registo_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NaoEncontrado("Registo de presença"))?;

    let aula = sqlx::query_as::<_, Aula>(
        "SELECT id, modulo_id, data, periodo FROM aulas WHERE id = ?1",
    )
    .bind(registo.aula_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NaoEncontrado("Aula"))?;

    // Entrada assumida: início do período da aula
    let inicio = format!("{} {}", aula.data, aula.periodo.hora_inicio());
    let saida = NaiveDateTime::parse_from_str(&inicio, FORMATO_TIMESTAMP)
        .map(|dt| (dt + Duration::hours(DURACAO_AULA_HORAS)).format(FORMATO_TIMESTAMP).to_string())
        .unwrap_or_else(|_| inicio.clone());

    let (entrada, saida, motivo, falta_justificada) = match novo_status {
        StatusPresenca::Presente => (Some(inicio), Some(saida), String::new(), false),
        StatusPresenca::Falta => (None, None, String::new(), justificacao.is_some()),
        StatusPresenca::Atrasado => (
            Some(inicio),
            Some(saida),
            justificacao.clone().unwrap_or_default(),
            false,
        ),
    };

    sqlx::query(
        "UPDATE registos_presenca \
         SET entrada = ?1, saida = ?2, motivo_atraso = ?3, falta_justificada = ?4 \
         WHERE id = ?5",
    )
    .bind(&entrada)
    .bind(&saida)
    .bind(&motivo)
    .bind(falta_justificada)
    .bind(registo_id)
    .execute(pool)
    .await?;

    notificacao_service::criar(
        pool,
        registo.formando_id,
        "Registo de presença atualizado",
        "O formador atualizou o seu registo de presença.",
        TipoNotificacao::Presenca,
    )
    .await?;

    tracing::info!("Registo {} corrigido para {:?}", registo_id, novo_status);

    let atualizado = sqlx::query_as::<_, RegistoPresenca>(
        "SELECT id, formando_id, aula_id, entrada, saida, motivo_atraso, justificativo, \
                falta_justificada \
         FROM registos_presenca WHERE id = ?1",
    )
    .bind(registo_id)
    .fetch_one(pool)
    .await?;
    Ok(atualizado)
}

/// Aula a que um registo pertence (verificações de autorização).
pub async fn aula_do_registo(pool: &SqlitePool, registo_id: i64) -> AppResult<Option<i64>> {
    let aula_id: Option<i64> =
        sqlx::query_scalar("SELECT aula_id FROM registos_presenca WHERE id = ?1")
            .bind(registo_id)
            .fetch_optional(pool)
            .await?;
    Ok(aula_id)
}

/// Registos de uma aula, com o nome do formando (painel do formador).
pub async fn registos_da_aula(pool: &SqlitePool, aula_id: i64) -> AppResult<Vec<RegistoComFormando>> {
    let registos = sqlx::query_as::<_, RegistoComFormando>(
        "SELECT r.id, r.formando_id, r.aula_id, r.entrada, r.saida, r.motivo_atraso, \
                r.justificativo, r.falta_justificada, u.nome AS formando_nome \
         FROM registos_presenca r \
         JOIN utilizadores u ON u.id = r.formando_id \
         WHERE r.aula_id = ?1 \
         ORDER BY u.nome ASC",
    )
    .bind(aula_id)
    .fetch_all(pool)
    .await?;
    Ok(registos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste, recuar_codigo};
    use crate::models::user::TipoUtilizador;
    use crate::services::user_service;

    async fn contar_registos(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM registos_presenca")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn segundo_formando(pool: &SqlitePool) -> i64 {
        user_service::criar_utilizador(
            pool,
            "ines.matos.987654321",
            "12345678",
            "Inês Matos",
            "ines.matos@formando.cesae.pt",
            TipoUtilizador::Formando,
            Some(987_654_321),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn registar_cria_registo_e_consome_o_codigo() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        let resultado = registar_presenca(
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

        let registo = match resultado {
            ResultadoRegisto::Criado(r) => r,
            outro => panic!("esperava Criado, obtido {:?}", outro),
        };
        assert!(registo.presente());

        // saida = entrada + 3 horas
        let entrada = NaiveDateTime::parse_from_str(
            registo.entrada.as_deref().unwrap(),
            FORMATO_TIMESTAMP,
        )
        .unwrap();
        let saida =
            NaiveDateTime::parse_from_str(registo.saida.as_deref().unwrap(), FORMATO_TIMESTAMP)
                .unwrap();
        assert_eq!(saida - entrada, Duration::hours(3));

        // Uso único: o código fica consumido
        assert!(!codigo_service::codigo_usavel(&pool, &gerado.codigo).await.unwrap());
    }

    #[tokio::test]
    async fn registo_repetido_e_no_op_informativo() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let primeiro = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &primeiro.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap();

        // Segundo pedido (novo código, mesmo par formando/aula): devolve o
        // registo existente sem criar outro nem consumir o código novo
        let segundo = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        let resultado = registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &segundo.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap();
        assert!(matches!(resultado, ResultadoRegisto::JaRegistado(_)));
        assert_eq!(contar_registos(&pool).await, 1);
        assert!(codigo_service::codigo_usavel(&pool, &segundo.codigo).await.unwrap());
    }

    #[tokio::test]
    async fn mesmo_codigo_so_serve_a_um_formando() {
        let pool = pool_teste().await;
        let (_, formando_a, aula_id) = cenario_base(&pool).await;
        let formando_b = segundo_formando(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        let ganho = registar_presenca(
            &pool,
            formando_a,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap();
        assert!(matches!(ganho, ResultadoRegisto::Criado(_)));

        // O segundo formando chega com o mesmo código: perdeu a corrida
        let erro = registar_presenca(
            &pool,
            formando_b,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(erro, AppError::CodigoExpirado));
        assert_eq!(contar_registos(&pool).await, 1);
    }

    #[tokio::test]
    async fn codigo_de_outra_aula_e_rejeitado_sem_ser_consumido() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;

        // Segunda aula no mesmo módulo
        let modulo_id: i64 = sqlx::query_scalar("SELECT modulo_id FROM aulas WHERE id = ?1")
            .bind(aula_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        let outra_aula: i64 = sqlx::query_scalar(
            "INSERT INTO aulas (modulo_id, data, periodo) \
             VALUES (?1, date('now'), 'tarde') RETURNING id",
        )
        .bind(modulo_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let gerado = codigo_service::gerar_codigo(&pool, outra_aula).await.unwrap();

        let erro = registar_presenca(
            &pool,
            formando_id,
            aula_id, // aula errada para este código
            &gerado.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(erro, AppError::CodigoInvalido));

        // O código continua usável para a aula certa
        assert!(codigo_service::codigo_usavel(&pool, &gerado.codigo).await.unwrap());
        assert_eq!(contar_registos(&pool).await, 0);
    }

    #[tokio::test]
    async fn codigo_nunca_emitido_e_invalido() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;

        let erro = registar_presenca(
            &pool,
            formando_id,
            aula_id,
            "ABC123",
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(erro, AppError::CodigoInvalido));
    }

    #[tokio::test]
    async fn codigo_expirado_e_rejeitado() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        recuar_codigo(&pool, &gerado.codigo, 31 * 60).await;

        let erro = registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Presente,
            None,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(erro, AppError::CodigoExpirado));
    }

    #[tokio::test]
    async fn atraso_preenche_motivo_e_justificativo() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        let resultado = registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Atrasado,
            Some("Atraso no transporte".to_string()),
            Some("justificativos/1/1/declaracao.pdf".to_string()),
        )
        .await
        .unwrap();

        let registo = resultado.registo();
        assert_eq!(registo.motivo_atraso, "Atraso no transporte");
        assert_eq!(
            registo.justificativo.as_deref(),
            Some("justificativos/1/1/declaracao.pdf")
        );
    }

    #[tokio::test]
    async fn presente_ignora_motivo_e_justificativo() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        let resultado = registar_presenca(
            &pool,
            formando_id,
            aula_id,
            &gerado.codigo,
            StatusPresenca::Presente,
            Some("não devia ser gravado".to_string()),
            Some("nem isto".to_string()),
        )
        .await
        .unwrap();

        let registo = resultado.registo();
        assert_eq!(registo.motivo_atraso, "");
        assert!(registo.justificativo.is_none());
    }

    #[tokio::test]
    async fn registo_preenche_falta_semeada_sem_entrada() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;

        // Falta pré-existente (processo administrativo/seed)
        sqlx::query(
            "INSERT INTO registos_presenca (formando_id, aula_id, entrada, saida) \
             VALUES (?1, ?2, NULL, NULL)",
        )
        .bind(formando_id)
        .bind(aula_id)
        .execute(&pool)
        .await
        .unwrap();

        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        let resultado = registar_presenca(
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

        assert!(matches!(resultado, ResultadoRegisto::Criado(_)));
        assert!(resultado.registo().presente());
        assert_eq!(contar_registos(&pool).await, 1);
    }

    #[tokio::test]
    async fn correcao_manual_percorre_os_tres_estados() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();
        let criado = registar_presenca(
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
        let registo_id = criado.registo().id;

        // Presente -> Falta justificada
        let falta = corrigir_registo(
            &pool,
            registo_id,
            StatusPresenca::Falta,
            Some("Consulta médica".to_string()),
        )
        .await
        .unwrap();
        assert!(!falta.presente());
        assert!(falta.saida.is_none());
        assert!(falta.falta_justificada);

        // Falta -> Atrasado com motivo
        let atrasado = corrigir_registo(
            &pool,
            registo_id,
            StatusPresenca::Atrasado,
            Some("Chegou 20 minutos depois".to_string()),
        )
        .await
        .unwrap();
        assert!(atrasado.presente());
        assert_eq!(atrasado.motivo_atraso, "Chegou 20 minutos depois");

        // Atrasado -> Presente limpa o motivo
        let presente = corrigir_registo(&pool, registo_id, StatusPresenca::Presente, None)
            .await
            .unwrap();
        assert!(presente.presente());
        assert_eq!(presente.motivo_atraso, "");
        assert!(!presente.falta_justificada);
    }

    #[tokio::test]
    async fn correcao_de_registo_inexistente_falha() {
        let pool = pool_teste().await;
        cenario_base(&pool).await;

        let erro = corrigir_registo(&pool, 424242, StatusPresenca::Presente, None)
            .await
            .unwrap_err();
        assert!(matches!(erro, AppError::NaoEncontrado(_)));
    }

    #[tokio::test]
    async fn registo_cria_notificacao_para_o_formando() {
        let pool = pool_teste().await;
        let (_, formando_id, aula_id) = cenario_base(&pool).await;
        let gerado = codigo_service::gerar_codigo(&pool, aula_id).await.unwrap();

        registar_presenca(
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

        let pendentes = notificacao_service::nao_lidas(&pool, formando_id).await.unwrap();
        assert_eq!(pendentes.len(), 1);
        assert_eq!(pendentes[0].titulo, "Presença registada");
    }
}
