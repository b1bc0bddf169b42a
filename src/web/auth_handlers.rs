// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, TipoUtilizador, Utilizador},
    services::{auth_service, user_service},
    state::AppState,
    templates::LoginPage,
};
use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect},
};
use tower_sessions::Session;

/// Destino pós-login consoante o tipo de utilizador.
fn destino(utilizador: &Utilizador) -> &'static str {
    match utilizador.tipo {
        TipoUtilizador::Formador => "/formador",
        TipoUtilizador::Formando => "/formando",
    }
}

fn pagina_login(error: Option<String>) -> AppResult<Html<String>> {
    let template = LoginPage { error };
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template de login: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

// GET /login
pub async fn show_login_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    // Já logado? Vai direto para o painel respetivo.
    if let Some(user_id) = session.get::<i64>("user_id").await.ok().flatten() {
        if let Some(utilizador) = user_service::buscar_por_id(&state.db_pool, user_id).await? {
            tracing::debug!("GET /login: '{}' já logado", utilizador.username);
            return Ok(Redirect::to(destino(&utilizador)).into_response());
        }
    }
    Ok(pagina_login(None)?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", form.username);

    let utilizador = match user_service::buscar_por_username(&state.db_pool, &form.username).await?
    {
        Some(u) => u,
        None => {
            tracing::warn!("Utilizador não encontrado: {}", form.username);
            return Ok(
                pagina_login(Some("Utilizador ou palavra-passe inválidos.".to_string()))?
                    .into_response(),
            );
        }
    };

    if !auth_service::verify_password(&form.password, &utilizador.password_hash).await? {
        tracing::warn!("Palavra-passe incorreta para: {}", form.username);
        return Ok(
            pagina_login(Some("Utilizador ou palavra-passe inválidos.".to_string()))?
                .into_response(),
        );
    }

    // Novo ID de sessão antes de autenticar (fixação de sessão)
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert("user_id", utilizador.id)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

    tracing::info!(
        "✅ Login bem-sucedido: {} ({})",
        utilizador.username,
        utilizador.tipo.as_str()
    );
    Ok(Redirect::to(destino(&utilizador)).into_response())
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id: Option<i64> = session.get("user_id").await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    if let Some(id) = user_id {
        tracing::info!("🚪 Utilizador {} desligado.", id);
    }
    Ok(Redirect::to("/login"))
}
