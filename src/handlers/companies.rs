// src/handlers/companies.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::AppJson,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::CompanyContext},
    models::company::{Company, CompanySettings, RegisterCompanyPayload},
};

// ---
// Handler: register_company (self-service, quem chama vira dono)
// ---
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = RegisterCompanyPayload,
    responses(
        (status = 201, description = "Empresa registrada", body = Company),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_company(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<RegisterCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .companies
        .register(Some(user.id), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// ---
// Handler: get_my_company
// ---
#[utoipa::path(
    get,
    path = "/api/companies/me",
    tag = "Companies",
    responses(
        (status = 200, description = "Dados da empresa", body = Company),
        (status = 403, description = "Usuário não é dono da empresa")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn get_my_company(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .services
        .companies
        .get(company.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(company)))
}

// ---
// Handler: update_my_settings (taxa, portal, marca, mínimo de saque)
// ---
#[utoipa::path(
    put,
    path = "/api/companies/me/settings",
    tag = "Companies",
    request_body = CompanySettings,
    responses(
        (status = 200, description = "Configurações salvas", body = Company),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn update_my_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
    AppJson(payload): AppJson<CompanySettings>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .companies
        .update_settings(company.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(company)))
}

// ---
// Handler: admin_register_company (sem dono)
// ---
#[utoipa::path(
    post,
    path = "/api/admin/companies",
    tag = "Admin",
    request_body = RegisterCompanyPayload,
    responses(
        (status = 201, description = "Empresa registrada", body = Company),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn admin_register_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<RegisterCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .companies
        .register(None, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// ---
// Handler: admin_list_companies
// ---
#[utoipa::path(
    get,
    path = "/api/admin/companies",
    tag = "Admin",
    responses(
        (status = 200, description = "Empresas, mais recentes primeiro", body = Vec<Company>)
    ),
    security(("api_jwt" = []))
)]
pub async fn admin_list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .services
        .companies
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(companies)))
}
