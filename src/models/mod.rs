pub mod aula;
pub mod curso;
pub mod notificacao;
pub mod presenca;
pub mod user;
