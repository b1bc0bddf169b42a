// src/seed.rs
//
// Dados de demonstração: formadores, formandos, um curso com módulos,
// aulas recentes e registos de presença plausíveis.
// Invocado com `cargo run -- seed`; não toca numa base já povoada.
use crate::{
    error::AppResult,
    models::aula::Periodo,
    models::notificacao::TipoNotificacao,
    models::user::TipoUtilizador,
    services::{aula_service, curso_service, notificacao_service, user_service},
};
use chrono::{Duration, Local};
use rand::Rng;
use sqlx::SqlitePool;

const FORMADORES: &[(&str, &str)] = &[
    ("Carla Mendes", "carla.mendes"),
    ("João Pereira", "joao.pereira"),
];

const FORMANDOS: &[(&str, &str, i64)] = &[
    ("Rui Costa", "rui.costa", 231111111),
    ("Inês Matos", "ines.matos", 232222222),
    ("Pedro Alves", "pedro.alves", 233333333),
    ("Sofia Ramos", "sofia.ramos", 234444444),
    ("Tiago Nunes", "tiago.nunes", 235555555),
    ("Marta Lopes", "marta.lopes", 236666666),
];

const MODULOS: &[&str] = &[
    "Mód. 1 Engenharia de software",
    "Mód. 2 Algoritmos e estruturas de dados",
    "Mód. 3 Bases de dados",
    "Mód. 4 Programação web",
];

pub async fn popular_base_dados(pool: &SqlitePool) -> AppResult<()> {
    let existentes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM utilizadores")
        .fetch_one(pool)
        .await?;
    if existentes > 0 {
        tracing::warn!(
            "Base de dados já tem {} utilizadores, seed ignorado.",
            existentes
        );
        return Ok(());
    }

    tracing::info!("A semear dados de demonstração...");
    let mut rng = rand::thread_rng();

    let mut formador_ids = Vec::new();
    for (nome, slug) in FORMADORES {
        let id = user_service::criar_utilizador(
            pool,
            &format!("{}.PRT.Formador", slug),
            "12345678",
            nome,
            &format!("{}@cesae.pt", slug),
            TipoUtilizador::Formador,
            None,
        )
        .await?;
        formador_ids.push(id);
    }

    let mut formando_ids = Vec::new();
    for (nome, slug, nif) in FORMANDOS {
        let id = user_service::criar_utilizador(
            pool,
            &format!("{}.{}", slug, nif),
            "12345678",
            nome,
            &format!("{}@formando.cesae.pt", slug),
            TipoUtilizador::Formando,
            Some(*nif),
        )
        .await?;
        formando_ids.push(id);
    }

    let curso_id = curso_service::criar_curso(
        pool,
        "Software Developer",
        "Curso de especialização tecnológica em desenvolvimento de software.",
        1200,
    )
    .await?;

    let hoje = Local::now().date_naive();
    for (i, nome_modulo) in MODULOS.iter().enumerate() {
        let formador_id = formador_ids[i % formador_ids.len()];
        let modulo_id =
            curso_service::criar_modulo(pool, curso_id, formador_id, nome_modulo, "", 50).await?;

        // Três aulas: anteontem, ontem e hoje
        for dias_atras in (0..3i64).rev() {
            let data = (hoje - Duration::days(dias_atras)).format("%Y-%m-%d").to_string();
            let periodo = if i % 2 == 0 { Periodo::Manha } else { Periodo::Tarde };
            let aula_id = aula_service::criar_aula(pool, modulo_id, &data, periodo).await?;

            // Registos apenas para aulas passadas; hoje fica por registar
            if dias_atras == 0 {
                continue;
            }
            for &formando_id in &formando_ids {
                let sorteio: u8 = rng.gen_range(0..10);
                let (entrada, saida, motivo) = match sorteio {
                    0..=6 => (
                        Some(format!("{} {}", data, periodo.hora_inicio())),
                        Some(format!("{} {}", data, hora_fim(periodo))),
                        String::new(),
                    ),
                    7..=8 => (None, None, String::new()),
                    _ => (
                        Some(format!("{} {}", data, hora_atraso(periodo))),
                        Some(format!("{} {}", data, hora_fim(periodo))),
                        "Atraso no transporte".to_string(),
                    ),
                };
                sqlx::query(
                    "INSERT INTO registos_presenca \
                         (formando_id, aula_id, entrada, saida, motivo_atraso) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .bind(formando_id)
                .bind(aula_id)
                .bind(&entrada)
                .bind(&saida)
                .bind(&motivo)
                .execute(pool)
                .await?;
            }
        }
    }

    for &formando_id in &formando_ids {
        notificacao_service::criar(
            pool,
            formando_id,
            "Bem-vindo",
            "A sua conta foi criada. Consulte aqui as aulas de hoje e registe a sua presença.",
            TipoNotificacao::Aviso,
        )
        .await?;
    }

    tracing::info!(
        "Seed concluído: {} formadores, {} formandos, {} módulos.",
        formador_ids.len(),
        formando_ids.len(),
        MODULOS.len()
    );
    Ok(())
}

fn hora_fim(periodo: Periodo) -> &'static str {
    match periodo {
        Periodo::Manha => "12:00:00",
        Periodo::Tarde => "17:00:00",
    }
}

fn hora_atraso(periodo: Periodo) -> &'static str {
    match periodo {
        Periodo::Manha => "09:20:00",
        Periodo::Tarde => "14:20:00",
    }
}
