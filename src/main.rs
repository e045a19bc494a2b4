//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::{
    auth::{admin_guard, auth_guard, device_guard},
    tenancy::company_guard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trash_to_cash=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    let app = router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Lixeiras e quiosques (chave compartilhada opcional)
    let hardware_routes = Router::new()
        .route("/api/hardware/deposits", post(handlers::hardware::submit_deposit))
        .route("/api/hardware/check-user", post(handlers::hardware::check_user))
        .route("/api/hardware/register-user", post(handlers::hardware::register_user))
        .route("/api/portal/{slug}/deposits", post(handlers::portal::submit_company_deposit))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), device_guard));

    // Usuário autenticado
    let user_routes = Router::new()
        .route("/api/profiles", post(handlers::profiles::signup))
        .route("/api/me", get(handlers::profiles::get_me))
        .route("/api/me/history", get(handlers::profiles::get_history))
        .route("/api/me/withdrawals", post(handlers::withdrawals::request_withdrawal))
        .route("/api/portal/{slug}/withdrawals", post(handlers::portal::request_company_withdrawal))
        .route("/api/companies", post(handlers::companies::register_company))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Dono da empresa do cabeçalho X-Company-ID.
    // A última camada roda primeiro: auth_guard -> company_guard.
    let company_routes = Router::new()
        .route("/api/companies/me", get(handlers::companies::get_my_company))
        .route("/api/companies/me/settings", put(handlers::companies::update_my_settings))
        .route(
            "/api/companies/me/locations",
            get(handlers::locations::list_company_locations).post(handlers::locations::create_company_location),
        )
        .route(
            "/api/companies/me/locations/{id}",
            put(handlers::locations::update_company_location).delete(handlers::locations::delete_company_location),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), company_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let admin_routes = Router::new()
        .route("/api/admin/stats", get(handlers::dashboard::get_stats))
        .route("/api/admin/transactions", get(handlers::dashboard::list_transactions))
        .route("/api/admin/withdrawals", get(handlers::withdrawals::list_withdrawals))
        .route("/api/admin/withdrawals/{id}/resolve", post(handlers::withdrawals::resolve_withdrawal))
        .route(
            "/api/admin/companies",
            post(handlers::companies::admin_register_company).get(handlers::companies::admin_list_companies),
        )
        .route("/api/admin/locations", post(handlers::locations::admin_create_location))
        .route(
            "/api/admin/locations/{id}",
            put(handlers::locations::admin_update_location).delete(handlers::locations::admin_delete_location),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/leaderboard", get(handlers::profiles::get_leaderboard))
        .route("/api/locations", get(handlers::locations::list_locations))
        .route("/api/portal/{slug}", get(handlers::portal::get_portal));

    Router::new()
        .merge(public_routes)
        .merge(hardware_routes)
        .merge(user_routes)
        .merge(company_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{db::MemoryStore, models::auth::Claims};

    const SECRET: &str = "router-secret";

    fn app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            "DEVICE_API_KEY" => Some("bin-key".into()),
            _ => None,
        })
        .unwrap();
        router(AppState::with_store(Arc::new(MemoryStore::new()), &config))
    }

    fn bearer(role: Option<&str>) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: None,
            role: role.map(str::to_string),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        format!("Bearer {token}")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn deposit_request(device_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/hardware/deposits").header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = device_key {
            builder = builder.header("x-device-key", key);
        }
        builder
            .body(Body::from(json!({ "unique_code": "BIN-001", "weight_kg": 2.5 }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn hardware_routes_require_the_device_key() {
        let response = app().oneshot(deposit_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app().oneshot(deposit_request(Some("bin-key"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["transaction"]["points_earned"], json!(125.0));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::post("/api/hardware/deposits")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-device-key", "bin-key")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_routes_check_the_role() {
        let get_stats = |auth: Option<String>| {
            let mut builder = Request::get("/api/admin/stats");
            if let Some(value) = auth {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            builder.body(Body::empty()).unwrap()
        };

        let response = app().oneshot(get_stats(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app().oneshot(get_stats(Some(bearer(None)))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app().oneshot(get_stats(Some(bearer(Some("admin"))))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total_users"], json!(0));
    }

    #[tokio::test]
    async fn company_routes_reject_non_owners() {
        let request = Request::get("/api/companies/me")
            .header(header::AUTHORIZATION, bearer(None))
            .header("x-company-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
