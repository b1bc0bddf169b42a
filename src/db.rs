// src/db.rs
use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration; // Usar std::time::Duration aqui

pub async fn create_db_pool() -> AppResult<SqlitePool> {
    dotenvy::dotenv().ok(); // Carrega .env
    let database_url = std::env::var("DATABASE_URL")?; // Lê URL da DB

    tracing::info!("Ligando à base de dados: {}", database_url);

    // Opções de conexão (criar se não existir, timeout)
    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    // Cria o pool (conjunto de conexões reutilizáveis)
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Executando migrações da base de dados...");
    // Executa automaticamente os ficheiros SQL em ./migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrações concluídas.");

    Ok(pool)
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::models::user::TipoUtilizador;
    use crate::services::user_service;

    /// Pool SQLite em memória com as migrações aplicadas.
    /// Uma única conexão: cada conexão ":memory:" teria a sua própria DB.
    pub async fn pool_teste() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("opções sqlite em memória");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("conectar à DB em memória");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrar DB de teste");
        pool
    }

    /// Cenário mínimo: um formador, um formando, um curso com um módulo
    /// e uma aula de hoje. Devolve (formador_id, formando_id, aula_id).
    pub async fn cenario_base(pool: &SqlitePool) -> (i64, i64, i64) {
        let formador = user_service::criar_utilizador(
            pool,
            "ana.silva.PRT.Formador",
            "12345678",
            "Ana Silva",
            "ana.silva@cesae.pt",
            TipoUtilizador::Formador,
            None,
        )
        .await
        .expect("criar formador");

        let formando = user_service::criar_utilizador(
            pool,
            "rui.costa.123456789",
            "12345678",
            "Rui Costa",
            "rui.costa@formando.cesae.pt",
            TipoUtilizador::Formando,
            Some(123_456_789),
        )
        .await
        .expect("criar formando");

        let curso_id: i64 = sqlx::query_scalar(
            "INSERT INTO cursos (nome, descricao, carga_horaria_total) VALUES (?1, ?2, ?3) RETURNING id",
        )
        .bind("Software Developer")
        .bind("Curso de teste")
        .bind(1020_i64)
        .fetch_one(pool)
        .await
        .expect("criar curso");

        let modulo_id: i64 = sqlx::query_scalar(
            "INSERT INTO modulos (curso_id, formador_id, nome, descricao, carga_horaria) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
        )
        .bind(curso_id)
        .bind(formador)
        .bind("Mód. 1 Engenharia de software")
        .bind("Módulo de teste")
        .bind(50_i64)
        .fetch_one(pool)
        .await
        .expect("criar módulo");

        let hoje = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        let aula_id: i64 = sqlx::query_scalar(
            "INSERT INTO aulas (modulo_id, data, periodo) VALUES (?1, ?2, 'manha') RETURNING id",
        )
        .bind(modulo_id)
        .bind(&hoje)
        .fetch_one(pool)
        .await
        .expect("criar aula");

        (formador, formando, aula_id)
    }

    /// Recua o timestamp de um código em `segundos` (para testar a expiração).
    pub async fn recuar_codigo(pool: &SqlitePool, codigo: &str, segundos: i64) {
        sqlx::query(
            "UPDATE codigos_presenca SET timestamp = datetime(timestamp, '-' || ?1 || ' seconds') \
             WHERE codigo = ?2",
        )
        .bind(segundos)
        .bind(codigo)
        .execute(pool)
        .await
        .expect("recuar timestamp do código");
    }
}
