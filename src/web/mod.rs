// src/web/mod.rs
pub mod auth_handlers;
pub mod formador_handlers;
pub mod formando_handlers;
pub mod monitor_handlers;
pub mod mw_auth;
pub mod mw_tipo;
pub mod routes;
