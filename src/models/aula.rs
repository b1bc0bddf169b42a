// src/models/aula.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Período de uma aula, guardado como TEXT ('manha'/'tarde').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Periodo {
    Manha,
    Tarde,
}

impl Periodo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodo::Manha => "manha",
            Periodo::Tarde => "tarde",
        }
    }

    /// Nome legível para exibição.
    pub fn legivel(&self) -> &'static str {
        match self {
            Periodo::Manha => "Manhã",
            Periodo::Tarde => "Tarde",
        }
    }

    /// Hora de início assumida do período (usada nas correções manuais).
    pub fn hora_inicio(&self) -> &'static str {
        match self {
            Periodo::Manha => "09:00:00",
            Periodo::Tarde => "14:00:00",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manha" => Some(Periodo::Manha),
            "tarde" => Some(Periodo::Tarde),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Aula {
    pub id: i64,
    pub modulo_id: i64,
    pub data: String, // YYYY-MM-DD
    pub periodo: Periodo,
}

/// Aula juntada com o módulo a que pertence (listagens).
#[derive(Debug, Clone, FromRow)]
pub struct AulaComModulo {
    pub id: i64,
    pub modulo_id: i64,
    pub data: String,
    pub periodo: Periodo,
    pub modulo_nome: String,
    pub formador_id: i64,
    pub curso_nome: String,
    pub carga_horaria: i64,
}
