// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, formador_handlers, formando_handlers, monitor_handlers, mw_auth, mw_tipo,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route(
            "/login",
            get(auth_handlers::show_login_form).post(auth_handlers::handle_login),
        )
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::permanent("/login") }));

    // --- Rotas do Formador ---
    // Exigem login E tipo Formador
    let formador_routes = Router::new()
        .route("/", get(formador_handlers::painel_formador))
        .route("/codigos/gerar", post(formador_handlers::handle_gerar_codigo))
        .route("/aulas/criar", post(formador_handlers::handle_criar_aula))
        .route("/aulas/{id}/registos", get(formador_handlers::registos_aula))
        .route(
            "/registos/{id}/corrigir",
            post(formador_handlers::handle_corrigir_registo),
        )
        .route(
            "/modulos/{id}/exportar",
            get(formador_handlers::exportar_estatisticas),
        )
        .route("/monitor", get(monitor_handlers::monitor_page))
        .route("/monitor/dados", get(monitor_handlers::monitor_dados))
        // Aplica APENAS mw_tipo aqui (mw_auth será aplicado no router pai)
        .route_layer(middleware::from_fn(mw_tipo::require_formador));

    // --- Rotas do Formando ---
    let formando_routes = Router::new()
        .route("/", get(formando_handlers::painel_formando))
        .route("/presenca", post(formando_handlers::handle_registar_presenca))
        .route(
            "/notificacoes/{id}/ler",
            post(formando_handlers::handle_marcar_lida),
        )
        .route_layer(middleware::from_fn(mw_tipo::require_formando));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .nest("/formador", formador_routes)
        .nest("/formando", formando_routes)
        // require_auth cobre tudo o que está aninhado acima
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
