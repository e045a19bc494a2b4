// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Claims, ADMIN_ROLE},
};

pub const DEVICE_KEY_HEADER: &str = "x-device-key";

/// Quem fez a requisição, segundo o token validado.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: Option<String>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, role: claims.role }
    }
}

/// Valida o JWT (HS256) emitido pelo provedor de autenticação externo.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

// ---
// Guardião: exige um Bearer token válido
// ---
pub async fn auth_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_request_parts(&mut parts, &app_state).await.unwrap_or_default();

    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &app_state)
            .await
            .map_err(|_| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let claims = validate_token(bearer.token(), &app_state.jwt_secret)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Insere o usuário nos "extensions" da requisição
    parts.extensions.insert(AuthenticatedUser::from(claims));
    Ok(next.run(Request::from_parts(parts, body)).await)
}

// ---
// Guardião: só admin (roda depois do auth_guard)
// ---
pub async fn admin_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let locale = Locale::from_request_parts(&mut parts, &app_state).await.unwrap_or_default();

    let user = AuthenticatedUser::from_request_parts(&mut parts, &app_state).await?;
    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, "Acesso de admin negado");
        return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

// ---
// Guardião das rotas do hardware: chave compartilhada opcional
// ---
pub async fn device_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = app_state.device_api_key.as_deref() {
        let provided = request
            .headers()
            .get(DEVICE_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected) {
            let (mut parts, _) = request.into_parts();
            let locale = Locale::from_request_parts(&mut parts, &app_state).await.unwrap_or_default();
            return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
        }
    }

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
                Err(AppError::InvalidToken.to_api_error(&locale, &state.i18n_store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Option<&str>, exp_offset: i64) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as usize;
        let claims = Claims { sub, exp, iat: None, role: role.map(str::to_string) };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("encode");
        (sub, token)
    }

    #[test]
    fn accepts_a_valid_admin_token() {
        let (sub, token) = token("s3cret", Some("admin"), 3600);
        let user = AuthenticatedUser::from(validate_token(&token, "s3cret").unwrap());
        assert_eq!(user.id, sub);
        assert!(user.is_admin());
    }

    #[test]
    fn plain_user_is_not_admin() {
        let (_, token) = token("s3cret", None, 3600);
        let user = AuthenticatedUser::from(validate_token(&token, "s3cret").unwrap());
        assert!(!user.is_admin());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let (_, wrong) = token("other", None, 3600);
        assert!(matches!(validate_token(&wrong, "s3cret"), Err(AppError::JwtError(_))));

        let (_, expired) = token("s3cret", None, -3600);
        assert!(matches!(validate_token(&expired, "s3cret"), Err(AppError::JwtError(_))));
    }
}
