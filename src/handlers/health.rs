// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Serviço e armazenamento respondendo"),
        (status = 500, description = "Armazenamento indisponível")
    )
)]
pub async fn health(State(app_state): State<AppState>, locale: Locale) -> Result<impl IntoResponse, ApiError> {
    app_state
        .store
        .health_check()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "status": "ok" }))))
}
