// src/handlers/withdrawals.rs

use axum::{
    extract::{Path, Query, State},
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
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        dashboard::AdminWithdrawalRow,
        withdrawal::{ResolveWithdrawalPayload, Withdrawal, WithdrawalPayload, WithdrawalQuery, WithdrawalReceipt},
    },
};

// ---
// Handler: request_withdrawal (canal padrão, ₦4 por ponto)
// ---
#[utoipa::path(
    post,
    path = "/api/me/withdrawals",
    tag = "Withdrawals",
    request_body = WithdrawalPayload,
    responses(
        (status = 201, description = "Saque solicitado, pontos reservados", body = WithdrawalReceipt),
        (status = 400, description = "Valor inválido ou abaixo do mínimo"),
        (status = 422, description = "Pontos insuficientes")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_withdrawal(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<WithdrawalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .services
        .withdrawals
        .request(user.id, payload.amount_naira, None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// ---
// Handler: list_withdrawals (admin)
// ---
#[utoipa::path(
    get,
    path = "/api/admin/withdrawals",
    tag = "Admin",
    params(WithdrawalQuery),
    responses(
        (status = 200, description = "Fila de saques", body = Vec<AdminWithdrawalRow>),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_withdrawals(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<WithdrawalQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let rows = app_state
        .services
        .withdrawals
        .list(query.status, limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

// ---
// Handler: resolve_withdrawal (admin)
// ---
#[utoipa::path(
    post,
    path = "/api/admin/withdrawals/{id}/resolve",
    tag = "Admin",
    request_body = ResolveWithdrawalPayload,
    responses(
        (status = 200, description = "Saque processado", body = Withdrawal),
        (status = 404, description = "Saque não encontrado"),
        (status = 409, description = "Saque já processado")
    ),
    params(("id" = Uuid, Path, description = "ID do saque")),
    security(("api_jwt" = []))
)]
pub async fn resolve_withdrawal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ResolveWithdrawalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = app_state
        .services
        .withdrawals
        .resolve(id, payload.outcome)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(withdrawal)))
}
