// src/services/codigo_service.rs
//
// Ciclo de vida dos códigos de presença: geração, validade (30 minutos,
// avaliada na leitura), resolução da aula associada e invalidação.
// A DB é a única fonte de verdade — não há cache de códigos em memória.
use crate::{
    error::{AppError, AppResult},
    models::aula::Periodo,
    models::presenca::{CodigoPresenca, FORMATO_TIMESTAMP, VALIDADE_CODIGO_MIN},
};
use chrono::{Duration, NaiveDateTime, Utc};
use rand::RngCore;
use sqlx::SqlitePool;

/// Tentativas de geração antes de desistir. O espaço de 6 caracteres hex é
/// pequeno; colisões com códigos ainda válidos são plausíveis e recuperáveis.
const MAX_TENTATIVAS_GERACAO: u32 = 8;

/// Resultado de `gerar_codigo`: o código e o instante de criação persistido.
#[derive(Debug, Clone)]
pub struct CodigoGerado {
    pub codigo: String,
    pub criado_em: String,
}

/// Código aleatório de 6 caracteres hexadecimais maiúsculos (ex: "A1B2C3").
/// OsRng é criptograficamente forte; nada de sequências previsíveis.
fn novo_codigo() -> String {
    let mut bytes = [0u8; 3];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Gera e persiste um novo código para uma aula existente.
/// Colisão com um código ainda válido (índice único parcial) é tratada
/// localmente: gera-se outro valor e tenta-se de novo.
pub async fn gerar_codigo(pool: &SqlitePool, aula_id: i64) -> AppResult<CodigoGerado> {
    let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM aulas WHERE id = ?1")
        .bind(aula_id)
        .fetch_optional(pool)
        .await?;
    if existe.is_none() {
        return Err(AppError::NaoEncontrado("Aula"));
    }

    for tentativa in 1..=MAX_TENTATIVAS_GERACAO {
        let codigo = novo_codigo();
        let agora = Utc::now().naive_utc().format(FORMATO_TIMESTAMP).to_string();

        let resultado = sqlx::query(
            "INSERT INTO codigos_presenca (aula_id, codigo, timestamp, valido) \
             VALUES (?1, ?2, ?3, 1)",
        )
        .bind(aula_id)
        .bind(&codigo)
        .bind(&agora)
        .execute(pool)
        .await;

        match resultado {
            Ok(_) => {
                tracing::info!("Código {} gerado para a aula {}", codigo, aula_id);
                return Ok(CodigoGerado { codigo, criado_em: agora });
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    "Colisão de código na tentativa {}/{}, a gerar novo valor...",
                    tentativa,
                    MAX_TENTATIVAS_GERACAO
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::error!(
        "Esgotadas {} tentativas de gerar código para a aula {}",
        MAX_TENTATIVAS_GERACAO,
        aula_id
    );
    Err(AppError::InternalServerError)
}

/// Busca a linha mais recente com este código e `valido = 1`.
/// Códigos nunca são apagados, por isso pode haver linhas antigas (já
/// consumidas) com o mesmo valor; o filtro `valido = 1` desambigua.
pub async fn buscar_codigo_valido<'e, E>(db: E, codigo: &str) -> AppResult<Option<CodigoPresenca>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let linha = sqlx::query_as::<_, CodigoPresenca>(
        "SELECT id, aula_id, codigo, timestamp, valido FROM codigos_presenca \
         WHERE codigo = ?1 AND valido = 1 \
         ORDER BY timestamp DESC, id DESC LIMIT 1",
    )
    .bind(codigo)
    .fetch_optional(db)
    .await?;
    Ok(linha)
}

/// O código pode ser usado agora? (flag válida E dentro dos 30 minutos)
/// Leitura pura: duas chamadas com minutos de intervalo podem discordar,
/// porque a expiração é função do relógio no momento da verificação.
pub async fn codigo_usavel(pool: &SqlitePool, codigo: &str) -> AppResult<bool> {
    let agora = Utc::now().naive_utc();
    match buscar_codigo_valido(pool, codigo).await? {
        Some(linha) => Ok(linha.dentro_da_validade(agora)),
        None => Ok(false),
    }
}

/// Devolve a aula associada ao código, apenas enquanto o código for usável.
/// O registo de presença confirma que esta aula é a esperada antes de gravar.
pub async fn aula_do_codigo(pool: &SqlitePool, codigo: &str) -> AppResult<Option<i64>> {
    let agora = Utc::now().naive_utc();
    match buscar_codigo_valido(pool, codigo).await? {
        Some(linha) if linha.dentro_da_validade(agora) => Ok(Some(linha.aula_id)),
        _ => Ok(None),
    }
}

/// Marca o código como consumido. Idempotente: sem efeito (e sem erro)
/// se o código não existir ou já estiver inválido.
pub async fn invalidar_codigo<'e, E>(db: E, codigo: &str) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let resultado = sqlx::query("UPDATE codigos_presenca SET valido = 0 WHERE codigo = ?1 AND valido = 1")
        .bind(codigo)
        .execute(db)
        .await?;
    tracing::debug!("invalidar_codigo({}): {} linha(s) afetada(s)", codigo, resultado.rows_affected());
    Ok(())
}

/// Reclama o código para esta aula num único UPDATE condicional:
/// `valido 1 -> 0` apenas se ainda estiver dentro da janela de validade.
/// Devolve true se ESTA chamada ganhou o código; false se ele já tinha
/// expirado, sido consumido por um pedido concorrente, ou nunca existiu.
pub async fn reclamar_codigo<'e, E>(
    db: E,
    codigo: &str,
    aula_id: i64,
    agora: NaiveDateTime,
) -> AppResult<bool>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let limite = (agora - Duration::minutes(VALIDADE_CODIGO_MIN))
        .format(FORMATO_TIMESTAMP)
        .to_string();
    let resultado = sqlx::query(
        "UPDATE codigos_presenca SET valido = 0 \
         WHERE codigo = ?1 AND aula_id = ?2 AND valido = 1 \
           AND datetime(timestamp) >= datetime(?3)",
    )
    .bind(codigo)
    .bind(aula_id)
    .bind(&limite)
    .execute(db)
    .await?;
    Ok(resultado.rows_affected() == 1)
}

/// Linha do monitor de códigos: código + aula + módulo.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CodigoComAula {
    pub id: i64,
    pub aula_id: i64,
    pub codigo: String,
    pub timestamp: String,
    pub valido: bool,
    pub aula_data: String,
    pub periodo: Periodo,
    pub modulo_nome: String,
}

impl CodigoComAula {
    fn como_codigo(&self) -> CodigoPresenca {
        CodigoPresenca {
            id: self.id,
            aula_id: self.aula_id,
            codigo: self.codigo.clone(),
            timestamp: self.timestamp.clone(),
            valido: self.valido,
        }
    }

    /// Estado derivado (Ativo/Usado/Expirado) para o monitor.
    pub fn estado(&self, agora: NaiveDateTime) -> crate::models::presenca::EstadoCodigo {
        self.como_codigo().estado(agora)
    }
}

/// Todos os códigos emitidos, mais recentes primeiro (monitor do formador).
pub async fn listar_codigos(pool: &SqlitePool) -> AppResult<Vec<CodigoComAula>> {
    let linhas = sqlx::query_as::<_, CodigoComAula>(
        "SELECT c.id, c.aula_id, c.codigo, c.timestamp, c.valido, \
                a.data AS aula_data, a.periodo, m.nome AS modulo_nome \
         FROM codigos_presenca c \
         JOIN aulas a ON a.id = c.aula_id \
         JOIN modulos m ON m.id = a.modulo_id \
         ORDER BY c.timestamp DESC, c.id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(linhas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{cenario_base, pool_teste, recuar_codigo};

    #[tokio::test]
    async fn codigo_gerado_tem_6_caracteres_hex_maiusculos() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        let gerado = gerar_codigo(&pool, aula_id).await.expect("gerar código");
        assert_eq!(gerado.codigo.len(), 6);
        assert!(gerado
            .codigo
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn gerar_codigo_para_aula_inexistente_falha() {
        let pool = pool_teste().await;
        cenario_base(&pool).await;

        let erro = gerar_codigo(&pool, 9999).await.unwrap_err();
        assert!(matches!(erro, AppError::NaoEncontrado(_)));
    }

    #[tokio::test]
    async fn usavel_apos_gerar_e_inusavel_apos_invalidar() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        let gerado = gerar_codigo(&pool, aula_id).await.unwrap();
        assert!(codigo_usavel(&pool, &gerado.codigo).await.unwrap());

        invalidar_codigo(&pool, &gerado.codigo).await.unwrap();
        assert!(!codigo_usavel(&pool, &gerado.codigo).await.unwrap());

        // Idempotente: invalidar de novo não é erro
        invalidar_codigo(&pool, &gerado.codigo).await.unwrap();
    }

    #[tokio::test]
    async fn fronteira_dos_30_minutos() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        // 29m59s: ainda usável
        let quase = gerar_codigo(&pool, aula_id).await.unwrap();
        recuar_codigo(&pool, &quase.codigo, 29 * 60 + 59).await;
        assert!(codigo_usavel(&pool, &quase.codigo).await.unwrap());

        // 30m01s: expirado
        let tarde = gerar_codigo(&pool, aula_id).await.unwrap();
        recuar_codigo(&pool, &tarde.codigo, 30 * 60 + 1).await;
        assert!(!codigo_usavel(&pool, &tarde.codigo).await.unwrap());
    }

    #[tokio::test]
    async fn aula_do_codigo_resolve_apenas_enquanto_usavel() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        let gerado = gerar_codigo(&pool, aula_id).await.unwrap();
        assert_eq!(aula_do_codigo(&pool, &gerado.codigo).await.unwrap(), Some(aula_id));

        invalidar_codigo(&pool, &gerado.codigo).await.unwrap();
        assert_eq!(aula_do_codigo(&pool, &gerado.codigo).await.unwrap(), None);
    }

    #[tokio::test]
    async fn codigo_nunca_emitido_nao_resolve() {
        let pool = pool_teste().await;
        cenario_base(&pool).await;

        assert!(!codigo_usavel(&pool, "A1B2C3").await.unwrap());
        assert_eq!(aula_do_codigo(&pool, "A1B2C3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unicidade_so_entre_codigos_validos() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        let inserir = |codigo: &'static str| {
            let pool = pool.clone();
            async move {
                sqlx::query(
                    "INSERT INTO codigos_presenca (aula_id, codigo, timestamp, valido) \
                     VALUES (?1, ?2, datetime('now'), 1)",
                )
                .bind(aula_id)
                .bind(codigo)
                .execute(&pool)
                .await
            }
        };

        inserir("FFFFFF").await.expect("primeira inserção");

        // Duplicado enquanto o primeiro é válido: violação do índice parcial
        let erro = inserir("FFFFFF").await.unwrap_err();
        match erro {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            outro => panic!("esperava violação de unicidade, obtido {:?}", outro),
        }

        // Após invalidar, o valor fica livre para uma nova geração
        invalidar_codigo(&pool, "FFFFFF").await.unwrap();
        inserir("FFFFFF").await.expect("reutilização após invalidar");
    }

    #[tokio::test]
    async fn reclamar_codigo_e_de_uso_unico() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;
        let agora = Utc::now().naive_utc();

        let gerado = gerar_codigo(&pool, aula_id).await.unwrap();
        assert!(reclamar_codigo(&pool, &gerado.codigo, aula_id, agora).await.unwrap());
        // Segunda reclamação perde: o flag já está a 0
        assert!(!reclamar_codigo(&pool, &gerado.codigo, aula_id, agora).await.unwrap());
    }

    #[tokio::test]
    async fn reclamar_codigo_expirado_falha() {
        let pool = pool_teste().await;
        let (_, _, aula_id) = cenario_base(&pool).await;

        let gerado = gerar_codigo(&pool, aula_id).await.unwrap();
        recuar_codigo(&pool, &gerado.codigo, 31 * 60).await;

        let agora = Utc::now().naive_utc();
        assert!(!reclamar_codigo(&pool, &gerado.codigo, aula_id, agora).await.unwrap());
        // O flag permanece a 1: a expiração é derivada, nunca escrita
        let linha = buscar_codigo_valido(&pool, &gerado.codigo).await.unwrap();
        assert!(linha.is_some());
    }
}
