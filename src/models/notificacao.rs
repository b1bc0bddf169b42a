// src/models/notificacao.rs
use serde::Serialize;
use sqlx::FromRow;

/// Categoria de uma notificação, guardada como TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoNotificacao {
    Presenca,
    Aula,
    Aviso,
    Outro,
}

impl TipoNotificacao {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoNotificacao::Presenca => "presenca",
            TipoNotificacao::Aula => "aula",
            TipoNotificacao::Aviso => "aviso",
            TipoNotificacao::Outro => "outro",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notificacao {
    pub id: i64,
    pub utilizador_id: i64,
    pub titulo: String,
    pub mensagem: String,
    pub tipo: TipoNotificacao,
    pub data: String,
    pub lida: bool,
}
