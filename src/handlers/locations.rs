// src/handlers/locations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::AppJson,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::CompanyContext},
    models::location::{CreateLocationPayload, Location, UpdateLocationPayload},
};

// ---
// Handler: list_locations (público)
// ---
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Locations",
    responses((status = 200, description = "Pontos de coleta por nome", body = Vec<Location>))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let locations = app_state
        .services
        .locations
        .list(None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(locations)))
}

// --- Rotas da empresa (escopo = empresa do cabeçalho) ---

#[utoipa::path(
    get,
    path = "/api/companies/me/locations",
    tag = "Locations",
    responses((status = 200, description = "Locais da empresa", body = Vec<Location>)),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn list_company_locations(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let locations = app_state
        .services
        .locations
        .list(Some(company.0))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(locations)))
}

#[utoipa::path(
    post,
    path = "/api/companies/me/locations",
    tag = "Locations",
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Local criado", body = Location),
        (status = 400, description = "Dados inválidos")
    ),
    params(("x-company-id" = Uuid, Header, description = "ID da empresa")),
    security(("api_jwt" = []))
)]
pub async fn create_company_location(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
    AppJson(payload): AppJson<CreateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create(app_state, locale, payload, Some(company.0)).await
}

#[utoipa::path(
    put,
    path = "/api/companies/me/locations/{id}",
    tag = "Locations",
    request_body = UpdateLocationPayload,
    responses(
        (status = 200, description = "Local atualizado", body = Location),
        (status = 404, description = "Local não encontrado nesta empresa")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do local"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company_location(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    update(app_state, locale, id, payload, Some(company.0)).await
}

#[utoipa::path(
    delete,
    path = "/api/companies/me/locations/{id}",
    tag = "Locations",
    responses(
        (status = 204, description = "Local removido"),
        (status = 404, description = "Local não encontrado nesta empresa")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do local"),
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_company_location(
    State(app_state): State<AppState>,
    locale: Locale,
    company: CompanyContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    delete(app_state, locale, id, Some(company.0)).await
}

// --- Rotas do admin (sem escopo) ---

#[utoipa::path(
    post,
    path = "/api/admin/locations",
    tag = "Admin",
    request_body = CreateLocationPayload,
    responses((status = 201, description = "Local criado", body = Location)),
    security(("api_jwt" = []))
)]
pub async fn admin_create_location(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<CreateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create(app_state, locale, payload, None).await
}

#[utoipa::path(
    put,
    path = "/api/admin/locations/{id}",
    tag = "Admin",
    request_body = UpdateLocationPayload,
    responses((status = 200, description = "Local atualizado", body = Location)),
    params(("id" = Uuid, Path, description = "ID do local")),
    security(("api_jwt" = []))
)]
pub async fn admin_update_location(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    update(app_state, locale, id, payload, None).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/locations/{id}",
    tag = "Admin",
    responses((status = 204, description = "Local removido")),
    params(("id" = Uuid, Path, description = "ID do local")),
    security(("api_jwt" = []))
)]
pub async fn admin_delete_location(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    delete(app_state, locale, id, None).await
}

// ---
// Corpo comum das rotas da empresa e do admin
// ---

async fn create(
    app_state: AppState,
    locale: Locale,
    payload: CreateLocationPayload,
    scope: Option<Uuid>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let location = app_state
        .services
        .locations
        .create(payload, scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(location)))
}

async fn update(
    app_state: AppState,
    locale: Locale,
    id: Uuid,
    payload: UpdateLocationPayload,
    scope: Option<Uuid>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let location = app_state
        .services
        .locations
        .update(id, payload.into(), scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(location)))
}

async fn delete(app_state: AppState, locale: Locale, id: Uuid, scope: Option<Uuid>) -> Result<StatusCode, ApiError> {
    app_state
        .services
        .locations
        .delete(id, scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
