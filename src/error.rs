// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    // Aula/módulo/utilizador referenciado não existe.
    #[error("{0} não encontrado(a)")]
    NaoEncontrado(&'static str),

    #[error("Dados inválidos: {0}")]
    DadosInvalidos(&'static str),

    // O código pertence a outra aula ou nunca foi emitido.
    #[error("Código inválido para esta aula")]
    CodigoInvalido,

    // O código expirou (30 minutos) ou já foi consumido por outro registo.
    #[error("Código expirado ou já utilizado")]
    CodigoExpirado,

    #[error("Ficheiro justificativo inválido: {0}")]
    JustificativoInvalido(&'static str),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

// Como converter AppError numa resposta HTTP.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Loga o erro detalhado no servidor
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao aceder aos dados.".to_string())
            }
            AppError::EnvVarError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração.".to_string())
            }
            AppError::IoError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao guardar o ficheiro.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao processar credenciais.".to_string())
            }
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.".to_string())
            }
            AppError::NaoEncontrado(o) => {
                (StatusCode::NOT_FOUND, format!("{} não encontrado(a).", o))
            }
            AppError::DadosInvalidos(detalhe) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("Dados inválidos: {}.", detalhe))
            }
            AppError::CodigoInvalido => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Código inválido para esta aula.".to_string(),
            ),
            AppError::CodigoExpirado => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Código expirado ou já utilizado. Peça um novo ao formador.".to_string(),
            ),
            AppError::JustificativoInvalido(motivo) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Ficheiro justificativo inválido: {}.", motivo),
            ),
            AppError::Unauthorized => {
                (StatusCode::FORBIDDEN, "Não tem permissão para aceder a esta página.".to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string()),
        };

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Voltar</a></body></html>
         "#, status_code = status.as_u16(), message = user_message))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
