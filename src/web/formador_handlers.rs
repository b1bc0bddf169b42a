// src/web/formador_handlers.rs
//
// Painel do formador: geração de códigos, registos por aula, correções
// manuais, agendamento de aulas e exportação de estatísticas em CSV.
use crate::{
    error::{AppError, AppResult},
    models::aula::Periodo,
    models::presenca::{StatusPresenca, VALIDADE_CODIGO_MIN},
    services::{aula_service, codigo_service, estatisticas_service, presenca_service},
    state::AppState,
    templates::{
        AulaOpcaoView, CodigoGeradoView, PainelFormadorPage, RegistoView, RegistosAulaPage,
        ResumoModuloView,
    },
    web::mw_auth::UtilizadorAtual,
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use chrono::Duration;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct FeedbackParams {
    success: Option<String>,
    error: Option<String>,
    /// Código acabado de gerar (PRG: o POST redireciona para cá)
    codigo: Option<String>,
}

/// Confirma que a aula pertence a um módulo deste formador.
async fn exigir_aula_do_formador(
    state: &AppState,
    formador_id: i64,
    aula_id: i64,
) -> AppResult<crate::models::aula::AulaComModulo> {
    let aula = aula_service::buscar_aula(&state.db_pool, aula_id)
        .await?
        .ok_or(AppError::NaoEncontrado("Aula"))?;
    if aula.formador_id != formador_id {
        tracing::warn!(
            "Formador {} tentou aceder à aula {} de outro formador",
            formador_id,
            aula_id
        );
        return Err(AppError::Unauthorized);
    }
    Ok(aula)
}

// GET /formador
pub async fn painel_formador(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let formador = atual.0;

    let modulos = estatisticas_service::resumos_do_formador(&state.db_pool, formador.id)
        .await?
        .into_iter()
        .map(|r| ResumoModuloView {
            modulo_id: r.modulo_id,
            nome: r.nome,
            total_aulas: r.total_aulas,
            presencas: r.presencas,
            faltas: r.faltas,
            atrasos: r.atrasos,
        })
        .collect();

    let aulas_hoje = aula_service::aulas_de_hoje_do_formador(&state.db_pool, formador.id)
        .await?
        .into_iter()
        .map(|a| AulaOpcaoView {
            id: a.id,
            descricao: format!("{} - {} ({})", a.periodo.legivel(), a.modulo_nome, a.curso_nome),
        })
        .collect();

    // O código mostrado vem sempre da DB (PRG só passa o valor na query)
    let codigo = match params.codigo.as_deref() {
        Some(valor) => codigo_service::buscar_codigo_valido(&state.db_pool, valor)
            .await?
            .map(|linha| {
                let expira = linha
                    .criado_em()
                    .map(|criado| {
                        (criado + Duration::minutes(VALIDADE_CODIGO_MIN))
                            .format("%H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_default();
                let criado = linha
                    .criado_em()
                    .map(|c| c.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| linha.timestamp.clone());
                CodigoGeradoView {
                    codigo: linha.codigo,
                    criado_em: criado,
                    expira_em: expira,
                }
            }),
        None => None,
    };

    let template = PainelFormadorPage {
        nome: formador.nome,
        modulos,
        aulas_hoje,
        codigo,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar PainelFormadorPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct GerarCodigoForm {
    aula_id: i64,
}

// POST /formador/codigos/gerar
pub async fn handle_gerar_codigo(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Form(form): Form<GerarCodigoForm>,
) -> AppResult<Redirect> {
    exigir_aula_do_formador(&state, atual.0.id, form.aula_id).await?;

    match codigo_service::gerar_codigo(&state.db_pool, form.aula_id).await {
        Ok(gerado) => Ok(Redirect::to(&format!("/formador?codigo={}", gerado.codigo))),
        Err(AppError::InternalServerError) => {
            // Esgotadas as tentativas de geração (colisões sucessivas)
            let error_msg =
                urlencoding::encode("Não foi possível gerar um código, tente novamente.");
            Ok(Redirect::to(&format!("/formador?error={}", error_msg)))
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize, Debug)]
pub struct CriarAulaForm {
    modulo_id: i64,
    data: String,
    periodo: String,
}

// POST /formador/aulas/criar
pub async fn handle_criar_aula(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Form(form): Form<CriarAulaForm>,
) -> AppResult<Redirect> {
    let formador_id = atual.0.id;

    let modulo = crate::services::curso_service::buscar_modulo(&state.db_pool, form.modulo_id)
        .await?
        .ok_or(AppError::NaoEncontrado("Módulo"))?;
    if modulo.formador_id != formador_id {
        return Err(AppError::Unauthorized);
    }

    let periodo = Periodo::parse(&form.periodo)
        .ok_or(AppError::DadosInvalidos("período deve ser manha ou tarde"))?;

    match aula_service::criar_aula(&state.db_pool, form.modulo_id, &form.data, periodo).await {
        Ok(_) => {
            let success_msg = urlencoding::encode("Aula agendada com sucesso.");
            Ok(Redirect::to(&format!("/formador?success={}", success_msg)))
        }
        Err(AppError::DadosInvalidos(detalhe)) => {
            let error_msg = urlencoding::encode(detalhe);
            Ok(Redirect::to(&format!("/formador?error={}", error_msg)))
        }
        Err(e) => Err(e),
    }
}

/// Estado legível de um registo, derivado dos campos gravados.
fn status_legivel(registo: &crate::models::presenca::RegistoComFormando) -> &'static str {
    if registo.entrada.is_none() {
        "Falta"
    } else if !registo.motivo_atraso.is_empty() {
        "Atrasado"
    } else {
        "Presente"
    }
}

// GET /formador/aulas/{id}/registos
pub async fn registos_aula(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Path(aula_id): Path<i64>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let aula = exigir_aula_do_formador(&state, atual.0.id, aula_id).await?;

    let registos = presenca_service::registos_da_aula(&state.db_pool, aula_id)
        .await?
        .into_iter()
        .map(|r| {
            let status = status_legivel(&r).to_string();
            let hora = r
                .entrada
                .as_deref()
                .and_then(|e| e.split(' ').nth(1))
                .unwrap_or("-")
                .to_string();
            let justificacao = if !r.motivo_atraso.is_empty() {
                r.motivo_atraso.clone()
            } else if r.falta_justificada {
                "Falta justificada".to_string()
            } else {
                String::new()
            };
            RegistoView {
                id: r.id,
                formando: r.formando_nome,
                status,
                hora,
                justificacao,
            }
        })
        .collect();

    let template = RegistosAulaPage {
        aula_id,
        aula_descricao: format!(
            "{} ({}) - {}",
            aula.data,
            aula.periodo.legivel(),
            aula.modulo_nome
        ),
        registos,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar RegistosAulaPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CorrigirForm {
    aula_id: i64,
    status: String,
    justificacao: Option<String>,
}

// POST /formador/registos/{id}/corrigir
pub async fn handle_corrigir_registo(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Path(registo_id): Path<i64>,
    Form(form): Form<CorrigirForm>,
) -> AppResult<Redirect> {
    exigir_aula_do_formador(&state, atual.0.id, form.aula_id).await?;

    // O registo tem de pertencer mesmo à aula declarada no formulário
    let aula_do_registo = presenca_service::aula_do_registo(&state.db_pool, registo_id)
        .await?
        .ok_or(AppError::NaoEncontrado("Registo de presença"))?;
    if aula_do_registo != form.aula_id {
        return Err(AppError::Unauthorized);
    }

    let status = StatusPresenca::parse(&form.status)
        .ok_or(AppError::DadosInvalidos("estado de presença desconhecido"))?;
    let justificacao = form.justificacao.filter(|j| !j.trim().is_empty());

    presenca_service::corrigir_registo(&state.db_pool, registo_id, status, justificacao).await?;

    let success_msg = urlencoding::encode("Registo atualizado.");
    Ok(Redirect::to(&format!(
        "/formador/aulas/{}/registos?success={}",
        form.aula_id, success_msg
    )))
}

// GET /formador/modulos/{id}/exportar
pub async fn exportar_estatisticas(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Path(modulo_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let modulo = crate::services::curso_service::buscar_modulo(&state.db_pool, modulo_id)
        .await?
        .ok_or(AppError::NaoEncontrado("Módulo"))?;
    if modulo.formador_id != atual.0.id {
        return Err(AppError::Unauthorized);
    }

    let serie = estatisticas_service::serie_do_modulo(&state.db_pool, modulo_id).await?;
    let csv = estatisticas_service::exportar_csv(&serie);

    tracing::info!(
        "Exportação CSV do módulo {} ({} aulas) por {}",
        modulo_id,
        serie.len(),
        atual.0.username
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"estatisticas_modulo_{}.csv\"", modulo_id),
            ),
        ],
        csv,
    ))
}
