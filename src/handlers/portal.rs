// src/handlers/portal.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::AppJson,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        company::PortalView,
        deposit::{DepositPayload, DepositResponse},
        withdrawal::{WithdrawalPayload, WithdrawalReceipt},
    },
};

// ---
// Handler: get_portal (dados públicos da empresa)
// ---
#[utoipa::path(
    get,
    path = "/api/portal/{slug}",
    tag = "Portal",
    responses(
        (status = 200, description = "Portal da empresa", body = PortalView),
        (status = 403, description = "Portal desativado"),
        (status = 404, description = "Empresa não encontrada")
    ),
    params(("slug" = String, Path, description = "Slug da empresa"))
)]
pub async fn get_portal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .services
        .companies
        .portal(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// ---
// Handler: submit_company_deposit (canal da empresa)
// ---
#[utoipa::path(
    post,
    path = "/api/portal/{slug}/deposits",
    tag = "Portal",
    request_body = DepositPayload,
    responses(
        (status = 200, description = "Depósito registrado", body = DepositResponse),
        (status = 400, description = "Campos ausentes ou inválidos"),
        (status = 404, description = "Empresa ou local não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug da empresa"),
        ("x-device-key" = Option<String>, Header, description = "Chave compartilhada dos dispositivos")
    )
)]
pub async fn submit_company_deposit(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<DepositPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .companies
        .by_slug(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .services
        .deposits
        .submit(payload, Some(&company))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(DepositResponse { success: true, transaction })))
}

// ---
// Handler: request_company_withdrawal (1 ponto = ₦1)
// ---
#[utoipa::path(
    post,
    path = "/api/portal/{slug}/withdrawals",
    tag = "Portal",
    request_body = WithdrawalPayload,
    responses(
        (status = 201, description = "Saque solicitado", body = WithdrawalReceipt),
        (status = 400, description = "Valor inválido ou abaixo do mínimo"),
        (status = 403, description = "Portal desativado"),
        (status = 422, description = "Pontos insuficientes")
    ),
    params(("slug" = String, Path, description = "Slug da empresa")),
    security(("api_jwt" = []))
)]
pub async fn request_company_withdrawal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<WithdrawalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .companies
        .portal_company(&slug)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .services
        .withdrawals
        .request(user.id, payload.amount_naira, Some(&company))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
