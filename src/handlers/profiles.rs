// src/handlers/profiles.rs

use axum::{
    extract::{Query, State},
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
        dashboard::{HistoryResponse, LimitQuery},
        profile::{LeaderboardEntry, MeResponse, Profile, SignupPayload},
    },
};

// ---
// Handler: signup (conta registrada, id = sujeito do token)
// ---
#[utoipa::path(
    post,
    path = "/api/profiles",
    tag = "Profiles",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Conta criada", body = Profile),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código único já vinculado ou conta já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn signup(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<SignupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .services
        .identity
        .signup(user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(profile)))
}

// ---
// Handler: get_me
// ---
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Profiles",
    responses(
        (status = 200, description = "Conta do usuário", body = MeResponse),
        (status = 404, description = "Conta ainda não criada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let me = app_state
        .services
        .identity
        .me(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(me)))
}

// ---
// Handler: get_history
// ---
#[utoipa::path(
    get,
    path = "/api/me/history",
    tag = "Profiles",
    params(LimitQuery),
    responses(
        (status = 200, description = "Depósitos e saques, mais recentes primeiro", body = HistoryResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_history(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .services
        .identity
        .history(user.id, query.clamp(50, 200))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}

// ---
// Handler: get_leaderboard (público)
// ---
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "Profiles",
    params(LimitQuery),
    responses(
        (status = 200, description = "Contas por pontos", body = Vec<LeaderboardEntry>)
    )
)]
pub async fn get_leaderboard(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .services
        .identity
        .leaderboard(query.clamp(100, 100))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}
