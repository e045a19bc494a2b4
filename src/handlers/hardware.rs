// src/handlers/hardware.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::AppJson,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        deposit::{DepositPayload, DepositResponse},
        profile::{CheckUserResponse, RegisterUserResponse, UniqueCodePayload},
    },
};

// ---
// Handler: submit_deposit (canal padrão do hardware)
// ---
#[utoipa::path(
    post,
    path = "/api/hardware/deposits",
    tag = "Hardware",
    request_body = DepositPayload,
    responses(
        (status = 200, description = "Depósito registrado", body = DepositResponse),
        (status = 400, description = "Campos ausentes ou inválidos"),
        (status = 404, description = "Local inexistente"),
        (status = 401, description = "Chave do dispositivo inválida")
    ),
    params(
        ("x-device-key" = Option<String>, Header, description = "Chave compartilhada dos dispositivos")
    )
)]
pub async fn submit_deposit(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<DepositPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .services
        .deposits
        .submit(payload, None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(DepositResponse { success: true, transaction })))
}

// ---
// Handler: check_user
// ---
#[utoipa::path(
    post,
    path = "/api/hardware/check-user",
    tag = "Hardware",
    request_body = UniqueCodePayload,
    responses(
        (status = 200, description = "Resultado da busca", body = CheckUserResponse),
        (status = 400, description = "unique_code ausente")
    ),
    params(
        ("x-device-key" = Option<String>, Header, description = "Chave compartilhada dos dispositivos")
    )
)]
pub async fn check_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<UniqueCodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .services
        .identity
        .check(payload.unique_code.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// ---
// Handler: register_user (bootstrap do hardware)
// ---
#[utoipa::path(
    post,
    path = "/api/hardware/register-user",
    tag = "Hardware",
    request_body = UniqueCodePayload,
    responses(
        (status = 201, description = "Conta placeholder criada", body = RegisterUserResponse),
        (status = 200, description = "Conta já existia", body = RegisterUserResponse),
        (status = 400, description = "unique_code ausente")
    ),
    params(
        ("x-device-key" = Option<String>, Header, description = "Chave compartilhada dos dispositivos")
    )
)]
pub async fn register_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<UniqueCodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (response, created) = app_state
        .services
        .identity
        .register_hardware(payload.unique_code.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(response)))
}
