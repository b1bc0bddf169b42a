// src/web/mw_tipo.rs
use crate::{error::AppError, models::user::TipoUtilizador, web::mw_auth::UtilizadorAtual};
use axum::{extract::Extension, extract::Request, middleware::Next, response::Response};

/// Middleware que só deixa passar formadores.
/// Deve ser executado *depois* do middleware `require_auth`.
pub async fn require_formador(
    Extension(atual): Extension<UtilizadorAtual>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match atual.0.tipo {
        TipoUtilizador::Formador => Ok(next.run(request).await),
        TipoUtilizador::Formando => {
            tracing::warn!(
                "Tipo MW: acesso de formador negado a '{}' (Formando)",
                atual.0.username
            );
            Err(AppError::Unauthorized)
        }
    }
}

/// Middleware que só deixa passar formandos.
pub async fn require_formando(
    Extension(atual): Extension<UtilizadorAtual>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match atual.0.tipo {
        TipoUtilizador::Formando => Ok(next.run(request).await),
        TipoUtilizador::Formador => {
            tracing::warn!(
                "Tipo MW: acesso de formando negado a '{}' (Formador)",
                atual.0.username
            );
            Err(AppError::Unauthorized)
        }
    }
}
