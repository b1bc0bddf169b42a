// src/web/monitor_handlers.rs
//
// Monitor de códigos do formador: todos os códigos emitidos com o estado
// derivado (Ativo/Usado/Expirado) e um endpoint JSON com os totais.
use crate::{
    error::{AppError, AppResult},
    models::presenca::EstadoCodigo,
    services::codigo_service,
    state::AppState,
    templates::{CodigoMonitorView, MonitorPage},
};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};
use chrono::Utc;

// GET /formador/monitor
pub async fn monitor_page(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let agora = Utc::now().naive_utc();
    let linhas = codigo_service::listar_codigos(&state.db_pool).await?;

    let mut ativos = 0;
    let mut usados = 0;
    let mut expirados = 0;
    let codigos = linhas
        .into_iter()
        .map(|linha| {
            let estado = linha.estado(agora);
            match estado {
                EstadoCodigo::Ativo => ativos += 1,
                EstadoCodigo::Usado => usados += 1,
                EstadoCodigo::Expirado => expirados += 1,
            }
            CodigoMonitorView {
                codigo: linha.codigo.clone(),
                emitido_em: linha.timestamp.clone(),
                aula: format!("{} ({})", linha.aula_data, linha.periodo.legivel()),
                modulo: linha.modulo_nome.clone(),
                estado: estado.legivel().to_string(),
            }
        })
        .collect();

    let template = MonitorPage {
        ativos,
        usados,
        expirados,
        codigos,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar MonitorPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /formador/monitor/dados  (totais em JSON, para atualização periódica)
pub async fn monitor_dados(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let agora = Utc::now().naive_utc();
    let linhas = codigo_service::listar_codigos(&state.db_pool).await?;

    let mut ativos = 0;
    let mut usados = 0;
    let mut expirados = 0;
    for linha in &linhas {
        match linha.estado(agora) {
            EstadoCodigo::Ativo => ativos += 1,
            EstadoCodigo::Usado => usados += 1,
            EstadoCodigo::Expirado => expirados += 1,
        }
    }

    Ok(Json(serde_json::json!({
        "total": linhas.len(),
        "ativos": ativos,
        "usados": usados,
        "expirados": expirados,
    })))
}
