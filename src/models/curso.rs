// src/models/curso.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Estruturas que espelham as Tabelas da DB ---

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Curso {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub carga_horaria_total: i64, // Em horas
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Modulo {
    pub id: i64,
    pub curso_id: i64,
    pub formador_id: i64,
    pub nome: String,
    pub descricao: String,
    pub carga_horaria: i64, // Em horas
}

/// Métricas agregadas de um módulo (painel do formador).
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct ResumoModulo {
    pub modulo_id: i64,
    pub nome: String,
    pub total_aulas: i64,
    pub presencas: i64,
    pub faltas: i64,
    pub atrasos: i64,
}
