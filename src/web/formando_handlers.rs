// src/web/formando_handlers.rs
//
// Painel do formando: aulas de hoje, registo de presença por código
// (multipart, com justificativo opcional) e notificações.
use crate::{
    error::{AppError, AppResult},
    models::presenca::StatusPresenca,
    services::{aula_service, notificacao_service, presenca_service},
    state::AppState,
    storage,
    templates::{AulaFormandoView, NotificacaoView, PainelFormandoPage},
    web::mw_auth::UtilizadorAtual,
};
use askama::Template;
use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct FeedbackParams {
    success: Option<String>,
    error: Option<String>,
}

// GET /formando
pub async fn painel_formando(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<impl IntoResponse> {
    let formando = atual.0;

    let mut aulas = Vec::new();
    for aula in aula_service::aulas_de_hoje(&state.db_pool).await? {
        let registo = presenca_service::buscar_registo(&state.db_pool, formando.id, aula.id).await?;
        let (registado, motivo_atraso, justificativo) = match &registo {
            Some(r) if r.presente() => (
                true,
                r.motivo_atraso.clone(),
                r.justificativo.clone().unwrap_or_default(),
            ),
            _ => (false, String::new(), String::new()),
        };
        aulas.push(AulaFormandoView {
            aula_id: aula.id,
            modulo: aula.modulo_nome,
            curso: aula.curso_nome,
            periodo: aula.periodo.legivel().to_string(),
            carga_horaria: aula.carga_horaria,
            registado,
            motivo_atraso,
            justificativo,
        });
    }

    let notificacoes = notificacao_service::nao_lidas(&state.db_pool, formando.id)
        .await?
        .into_iter()
        .map(|n| NotificacaoView {
            id: n.id,
            titulo: n.titulo,
            mensagem: n.mensagem,
            data: n.data,
        })
        .collect();

    let template = PainelFormandoPage {
        nome: formando.nome,
        aulas,
        notificacoes,
        success_message: params.success,
        error_message: params.error,
    };
    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar PainelFormandoPage: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

/// Campos do formulário multipart de registo de presença.
#[derive(Debug, Default)]
struct PresencaForm {
    aula_id: Option<i64>,
    codigo: String,
    status: String,
    motivo_atraso: String,
    ficheiro: Option<(String, Vec<u8>)>, // (nome original, conteúdo)
}

async fn ler_formulario(mut multipart: Multipart) -> AppResult<PresencaForm> {
    let mut form = PresencaForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::DadosInvalidos("formulário multipart inválido"))?
    {
        let nome_campo = field.name().unwrap_or_default().to_string();
        match nome_campo.as_str() {
            "aula_id" => {
                let texto = field
                    .text()
                    .await
                    .map_err(|_| AppError::DadosInvalidos("aula_id ilegível"))?;
                form.aula_id = texto.trim().parse().ok();
            }
            "codigo" => {
                let texto = field
                    .text()
                    .await
                    .map_err(|_| AppError::DadosInvalidos("código ilegível"))?;
                form.codigo = texto.trim().to_ascii_uppercase();
            }
            "status" => {
                form.status = field
                    .text()
                    .await
                    .map_err(|_| AppError::DadosInvalidos("estado ilegível"))?;
            }
            "motivo_atraso" => {
                form.motivo_atraso = field
                    .text()
                    .await
                    .map_err(|_| AppError::DadosInvalidos("motivo ilegível"))?
                    .trim()
                    .to_string();
            }
            "justificativo" => {
                let nome_ficheiro = field.file_name().map(str::to_string);
                let conteudo = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::DadosInvalidos("ficheiro ilegível"))?;
                // Input file vazio chega como campo sem nome/conteúdo
                if let Some(nome) = nome_ficheiro {
                    if !nome.is_empty() && !conteudo.is_empty() {
                        form.ficheiro = Some((nome, conteudo.to_vec()));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

// POST /formando/presenca
pub async fn handle_registar_presenca(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let formando = atual.0;
    let form = ler_formulario(multipart).await?;

    let aula_id = form
        .aula_id
        .ok_or(AppError::DadosInvalidos("aula em falta"))?;
    if form.codigo.is_empty() {
        let error_msg = urlencoding::encode("Introduza o código de presença.");
        return Ok(Redirect::to(&format!("/formando?error={}", error_msg)));
    }

    let status = StatusPresenca::parse(&form.status).unwrap_or(StatusPresenca::Presente);

    // Guarda o justificativo antes de registar; só é referenciado no
    // registo quando o estado declarado é Atrasado
    let justificativo = match (&form.ficheiro, status) {
        (Some((nome, conteudo)), StatusPresenca::Atrasado) => {
            match storage::guardar_justificativo(
                &state.uploads_dir,
                formando.id,
                aula_id,
                nome,
                conteudo,
            )
            .await
            {
                Ok(caminho) => Some(caminho),
                Err(AppError::JustificativoInvalido(detalhe)) => {
                    let mensagem = format!("Justificativo rejeitado: {}", detalhe);
                    let error_msg = urlencoding::encode(&mensagem);
                    return Ok(Redirect::to(&format!("/formando?error={}", error_msg)));
                }
                Err(e) => return Err(e),
            }
        }
        _ => None,
    };
    let motivo = if form.motivo_atraso.is_empty() {
        None
    } else {
        Some(form.motivo_atraso)
    };

    match presenca_service::registar_presenca(
        &state.db_pool,
        formando.id,
        aula_id,
        &form.codigo,
        status,
        motivo,
        justificativo,
    )
    .await
    {
        Ok(presenca_service::ResultadoRegisto::Criado(_)) => {
            let success_msg = urlencoding::encode("✅ Presença registada com sucesso!");
            Ok(Redirect::to(&format!("/formando?success={}", success_msg)))
        }
        Ok(presenca_service::ResultadoRegisto::JaRegistado(_)) => {
            let success_msg = urlencoding::encode("A sua presença nesta aula já estava registada.");
            Ok(Redirect::to(&format!("/formando?success={}", success_msg)))
        }
        Err(AppError::CodigoInvalido) => {
            let error_msg = urlencoding::encode("Código inválido para esta aula.");
            Ok(Redirect::to(&format!("/formando?error={}", error_msg)))
        }
        Err(AppError::CodigoExpirado) => {
            let error_msg =
                urlencoding::encode("Código expirado ou já utilizado. Peça um novo ao formador.");
            Ok(Redirect::to(&format!("/formando?error={}", error_msg)))
        }
        Err(e) => Err(e),
    }
}

// POST /formando/notificacoes/{id}/ler
pub async fn handle_marcar_lida(
    State(state): State<AppState>,
    Extension(atual): Extension<UtilizadorAtual>,
    Path(notificacao_id): Path<i64>,
) -> AppResult<Redirect> {
    let marcada =
        notificacao_service::marcar_lida(&state.db_pool, atual.0.id, notificacao_id).await?;
    if !marcada {
        // Não existe ou pertence a outro utilizador: sem efeito
        tracing::debug!(
            "Notificação {} não marcada para o utilizador {}",
            notificacao_id,
            atual.0.id
        );
    }
    Ok(Redirect::to("/formando"))
}
