pub mod auth_service;
pub mod aula_service;
pub mod codigo_service;
pub mod curso_service;
pub mod estatisticas_service;
pub mod notificacao_service;
pub mod presenca_service;
pub mod user_service;
