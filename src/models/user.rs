// src/models/user.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo de utilizador, guardado como TEXT na coluna `tipo`.
/// Enum fechado em vez de comparações de strings espalhadas pelo código:
/// o compilador obriga a tratar os dois casos em cada ramificação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum TipoUtilizador {
    Formador,
    Formando,
}

impl TipoUtilizador {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoUtilizador::Formador => "Formador",
            TipoUtilizador::Formando => "Formando",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Formador" => Some(TipoUtilizador::Formador),
            "Formando" => Some(TipoUtilizador::Formando),
            _ => None,
        }
    }
}

// Representa um utilizador lido da tabela 'utilizadores'
#[derive(Debug, Clone, FromRow)]
pub struct Utilizador {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub nome: String,
    pub email: String,
    pub tipo: TipoUtilizador,
    pub nif: Option<i64>,
    pub created_at: String,
}

impl Utilizador {
    pub fn e_formador(&self) -> bool {
        self.tipo == TipoUtilizador::Formador
    }
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
