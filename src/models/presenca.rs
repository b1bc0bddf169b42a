// src/models/presenca.rs
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Janela de validade de um código de presença, fixa (não configurável por chamada).
pub const VALIDADE_CODIGO_MIN: i64 = 30;

/// Duração assumida de uma aula ao registar presença (saída = entrada + 3h).
pub const DURACAO_AULA_HORAS: i64 = 3;

/// Formato dos timestamps guardados na DB (UTC, igual a datetime('now')).
pub const FORMATO_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Representa uma linha da tabela `codigos_presenca`.
/// `valido = false` significa "consumido"; a expiração por tempo é um
/// estado derivado, calculado na leitura, nunca escrito na DB.
#[derive(Debug, Clone, FromRow)]
pub struct CodigoPresenca {
    pub id: i64,
    pub aula_id: i64,
    pub codigo: String,
    pub timestamp: String,
    pub valido: bool,
}

impl CodigoPresenca {
    pub fn criado_em(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, FORMATO_TIMESTAMP).ok()
    }

    /// O código ainda está dentro da janela de 30 minutos?
    /// Nota: não olha para `valido`; quem chama decide se isso interessa.
    pub fn dentro_da_validade(&self, agora: NaiveDateTime) -> bool {
        match self.criado_em() {
            Some(criado) => agora - criado <= Duration::minutes(VALIDADE_CODIGO_MIN),
            None => false, // Timestamp ilegível, trata como expirado
        }
    }

    /// Estado para exibição no monitor: Ativo, Usado ou Expirado.
    pub fn estado(&self, agora: NaiveDateTime) -> EstadoCodigo {
        if !self.valido {
            EstadoCodigo::Usado
        } else if self.dentro_da_validade(agora) {
            EstadoCodigo::Ativo
        } else {
            EstadoCodigo::Expirado
        }
    }
}

/// Estado derivado de um código (apenas para apresentação; a DB só
/// distingue válido/não válido).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EstadoCodigo {
    Ativo,
    Usado,
    Expirado,
}

impl EstadoCodigo {
    pub fn legivel(&self) -> &'static str {
        match self {
            EstadoCodigo::Ativo => "Ativo",
            EstadoCodigo::Usado => "Usado",
            EstadoCodigo::Expirado => "Expirado",
        }
    }
}

/// Representa uma linha da tabela `registos_presenca`.
/// `entrada` preenchida = presente; NULL = falta.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegistoPresenca {
    pub id: i64,
    pub formando_id: i64,
    pub aula_id: i64,
    pub entrada: Option<String>,
    pub saida: Option<String>,
    pub motivo_atraso: String,
    pub justificativo: Option<String>,
    pub falta_justificada: bool,
}

impl RegistoPresenca {
    pub fn presente(&self) -> bool {
        self.entrada.is_some()
    }
}

/// Estado declarado no registo ou na correção manual de presenças.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StatusPresenca {
    Presente,
    Falta,
    Atrasado,
}

impl StatusPresenca {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Presente" => Some(StatusPresenca::Presente),
            "Falta" => Some(StatusPresenca::Falta),
            "Atrasado" => Some(StatusPresenca::Atrasado),
            _ => None,
        }
    }
}

/// Registo juntado com o nome do formando (listagens do formador).
#[derive(Debug, Clone, FromRow)]
pub struct RegistoComFormando {
    pub id: i64,
    pub formando_id: i64,
    pub aula_id: i64,
    pub entrada: Option<String>,
    pub saida: Option<String>,
    pub motivo_atraso: String,
    pub justificativo: Option<String>,
    pub falta_justificada: bool,
    pub formando_nome: String,
}
