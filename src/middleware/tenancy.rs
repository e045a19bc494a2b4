// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

// O nome do nosso cabeçalho HTTP customizado
const COMPANY_ID_HEADER: &str = "x-company-id";

// A empresa que o usuário quer administrar (cabeçalho X-Company-ID).
#[derive(Debug, Clone, Copy)]
pub struct CompanyContext(pub Uuid);

impl CompanyContext {
    fn from_parts(parts: &Parts) -> Result<Self, AppError> {
        let value = parts
            .headers
            .get(COMPANY_ID_HEADER)
            .ok_or_else(|| AppError::InvalidInput("X-Company-ID header is required".into()))?;

        let value_str = value
            .to_str()
            .map_err(|_| AppError::InvalidInput("X-Company-ID header has invalid characters".into()))?;

        Uuid::parse_str(value_str.trim())
            .map(CompanyContext)
            .map_err(|_| AppError::InvalidInput("X-Company-ID header is not a UUID".into()))
    }
}

impl FromRequestParts<AppState> for CompanyContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CompanyContext::from_parts(parts) {
            Ok(ctx) => Ok(ctx),
            Err(e) => {
                let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
                Err(e.to_api_error(&locale, &state.i18n_store))
            }
        }
    }
}

// ---
// Guardião: o usuário precisa ser dono da empresa do cabeçalho
// ---
pub async fn company_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_request_parts(&mut parts, &app_state).await.unwrap_or_default();

    let user = AuthenticatedUser::from_request_parts(&mut parts, &app_state).await?;
    let company = CompanyContext::from_request_parts(&mut parts, &app_state).await?;

    let is_owner = app_state
        .store
        .is_company_owner(user.id, company.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !is_owner {
        tracing::warn!(user_id = %user.id, company_id = %company.0, "Usuário não é dono da empresa");
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
