// src/web/mw_auth.rs
use crate::{error::AppError, services::user_service, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

// Middleware que verifica se o utilizador está logado. Carrega o utilizador
// completo da DB e coloca-o nas extensões para os handlers a jusante.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<i64>("user_id").await {
        Ok(Some(user_id)) => {
            match user_service::buscar_por_id(&state.db_pool, user_id).await? {
                Some(utilizador) => {
                    tracing::debug!(
                        "Autenticação MW: '{}' autenticado. Prosseguindo...",
                        utilizador.username
                    );
                    request.extensions_mut().insert(UtilizadorAtual(utilizador));
                    Ok(next.run(request).await)
                }
                None => {
                    // Sessão aponta para um utilizador que já não existe
                    tracing::warn!(
                        "Autenticação MW: user_id {} da sessão não existe na DB, limpando sessão",
                        user_id
                    );
                    session.delete().await.map_err(|e| {
                        AppError::SessionError(format!("Falha ao apagar sessão: {}", e))
                    })?;
                    Ok(Redirect::to("/login").into_response())
                }
            }
        }
        Ok(None) => {
            tracing::debug!("Autenticação MW: Não autenticado. Redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            tracing::error!("Autenticação MW: Erro ao ler sessão: {:?}", e);
            Err(AppError::SessionError(format!(
                "Erro ao verificar sessão: {}",
                e
            )))
        }
    }
}

/// Utilizador autenticado, posto nas extensões da requisição.
#[derive(Clone, Debug)]
pub struct UtilizadorAtual(pub crate::models::user::Utilizador);
