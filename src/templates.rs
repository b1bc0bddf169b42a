// src/templates.rs
//
// Structs Askama e "views" pré-formatadas: datas, estados e descrições
// chegam aos templates já como String, a formatação fica do lado do Rust.
use askama::Template;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

// --- Painel do Formador ---

#[derive(Clone, Debug)]
pub struct ResumoModuloView {
    pub modulo_id: i64,
    pub nome: String,
    pub total_aulas: i64,
    pub presencas: i64,
    pub faltas: i64,
    pub atrasos: i64,
}

/// Opção do gerador de códigos: uma aula de hoje.
#[derive(Clone, Debug)]
pub struct AulaOpcaoView {
    pub id: i64,
    pub descricao: String, // "Manhã - Mód. 1 Engenharia de software"
}

/// Código acabado de gerar, com a janela de validade já formatada.
#[derive(Clone, Debug)]
pub struct CodigoGeradoView {
    pub codigo: String,
    pub criado_em: String,
    pub expira_em: String,
}

#[derive(Template)]
#[template(path = "painel_formador.html")]
pub struct PainelFormadorPage {
    pub nome: String,
    pub modulos: Vec<ResumoModuloView>,
    pub aulas_hoje: Vec<AulaOpcaoView>,
    pub codigo: Option<CodigoGeradoView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

// --- Registos de uma aula (edição pelo formador) ---

#[derive(Clone, Debug)]
pub struct RegistoView {
    pub id: i64,
    pub formando: String,
    pub status: String, // "Presente" / "Falta" / "Atrasado"
    pub hora: String,   // hora de entrada ou "-"
    pub justificacao: String,
}

#[derive(Template)]
#[template(path = "registos_aula.html")]
pub struct RegistosAulaPage {
    pub aula_id: i64,
    pub aula_descricao: String,
    pub registos: Vec<RegistoView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

// --- Painel do Formando ---

#[derive(Clone, Debug)]
pub struct AulaFormandoView {
    pub aula_id: i64,
    pub modulo: String,
    pub curso: String,
    pub periodo: String,
    pub carga_horaria: i64,
    pub registado: bool,
    pub motivo_atraso: String,
    pub justificativo: String,
}

#[derive(Clone, Debug)]
pub struct NotificacaoView {
    pub id: i64,
    pub titulo: String,
    pub mensagem: String,
    pub data: String,
}

#[derive(Template)]
#[template(path = "painel_formando.html")]
pub struct PainelFormandoPage {
    pub nome: String,
    pub aulas: Vec<AulaFormandoView>,
    pub notificacoes: Vec<NotificacaoView>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

// --- Monitor de códigos ---

#[derive(Clone, Debug)]
pub struct CodigoMonitorView {
    pub codigo: String,
    pub emitido_em: String,
    pub aula: String,   // "2026-01-15 (Manhã)"
    pub modulo: String,
    pub estado: String, // "Ativo" / "Usado" / "Expirado"
}

#[derive(Template)]
#[template(path = "monitor.html")]
pub struct MonitorPage {
    pub ativos: usize,
    pub usados: usize,
    pub expirados: usize,
    pub codigos: Vec<CodigoMonitorView>,
}
