// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

/// A "família" do erro. É o que o chamador (firmware ou painel) usa
/// para decidir se deve repetir, corrigir o pedido ou desistir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InsufficientBalance,
    Conflict,
    Unauthorized,
    Forbidden,
    Storage,
}

// Nosso tipo de erro de domínio, com `thiserror`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Saque de {requested} abaixo do mínimo de {minimum}")]
    BelowMinimumWithdrawal { minimum: Decimal, requested: Decimal },

    #[error("Código único desconhecido: {0}")]
    UnknownCode(String),

    #[error("{0} não encontrado")]
    ResourceNotFound(String),

    #[error("Saldo insuficiente: necessário {required}, disponível {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("Código único já em uso: {0}")]
    UniqueCodeTaken(String),

    #[error("Slug de empresa já em uso: {0}")]
    SlugTaken(String),

    #[error("Saque {0} já foi processado")]
    WithdrawalAlreadyResolved(Uuid),

    // Falha de serialização/deadlock do Postgres: o chamador deve repetir.
    #[error("Conflito de concorrência: {0}")]
    Conflict(String),

    #[error("Portal da empresa desativado")]
    PortalDisabled,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Classifica o erro do sqlx: conflitos de concorrência viram `Conflict`,
// o resto é erro de armazenamento.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            // 40001 = serialization_failure, 40P01 = deadlock_detected
            if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::DatabaseError(err)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::BelowMinimumWithdrawal { .. } => ErrorKind::InvalidInput,
            AppError::UnknownCode(_) | AppError::ResourceNotFound(_) => ErrorKind::NotFound,
            AppError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            AppError::UniqueCodeTaken(_)
            | AppError::SlugTaken(_)
            | AppError::WithdrawalAlreadyResolved(_)
            | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::InvalidToken | AppError::JwtError(_) => ErrorKind::Unauthorized,
            AppError::Forbidden | AppError::PortalDisabled => ErrorKind::Forbidden,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => ErrorKind::Storage,
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, com a mensagem
    /// traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();
        let code = self.kind();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                // Retorna todos os detalhes da validação, campo a campo.
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (store.translate(lang, "validation", &[]), Some(json!(details)))
            }
            AppError::InvalidInput(msg) => {
                (store.translate(lang, "invalid_input", &[]), Some(json!(msg)))
            }
            AppError::BelowMinimumWithdrawal { minimum, requested } => (
                store.translate(lang, "below_minimum", &[("minimum", minimum.to_string())]),
                Some(json!({ "minimum": minimum, "requested": requested })),
            ),
            AppError::UnknownCode(_) => (store.translate(lang, "unknown_code", &[]), None),
            AppError::ResourceNotFound(resource) => (
                store.translate(lang, "not_found", &[("resource", resource.clone())]),
                None,
            ),
            AppError::InsufficientBalance { required, available } => (
                store.translate(lang, "insufficient_balance", &[]),
                Some(json!({ "required": required, "available": available })),
            ),
            AppError::UniqueCodeTaken(_) => (store.translate(lang, "unique_code_taken", &[]), None),
            AppError::SlugTaken(slug) => (
                store.translate(lang, "slug_taken", &[("slug", slug.clone())]),
                None,
            ),
            AppError::WithdrawalAlreadyResolved(_) => {
                (store.translate(lang, "withdrawal_resolved", &[]), None)
            }
            AppError::Conflict(_) => (store.translate(lang, "conflict", &[]), None),
            AppError::PortalDisabled => (store.translate(lang, "portal_disabled", &[]), None),
            AppError::InvalidToken | AppError::JwtError(_) => {
                (store.translate(lang, "invalid_token", &[]), None)
            }
            AppError::Forbidden => (store.translate(lang, "forbidden", &[]), None),

            // Erros internos: o detalhe vai para o log, nunca para o cliente.
            e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (store.translate(lang, "internal", &[]), None)
            }
        };

        ApiError { status, code, error, details }
    }
}

/// A resposta de erro que efetivamente sai pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorKind,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn insufficient_balance_maps_to_422_with_amounts() {
        let store = I18nStore::new();
        let err = AppError::InsufficientBalance {
            required: Decimal::from(50),
            available: Decimal::from(40),
        };

        let api = err.to_api_error(&en(), &store);

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code, ErrorKind::InsufficientBalance);
        let details = api.details.expect("details");
        assert_eq!(details["required"], json!(50.0));
        assert_eq!(details["available"], json!(40.0));
    }

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(AppError::InvalidInput("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            AppError::BelowMinimumWithdrawal { minimum: Decimal::from(50), requested: Decimal::from(30) }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(AppError::UnknownCode("abc".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::WithdrawalAlreadyResolved(Uuid::new_v4()).kind(), ErrorKind::Conflict);
        assert_eq!(AppError::PortalDisabled.kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::DatabaseError(sqlx::Error::RowNotFound).kind(), ErrorKind::Storage);
    }

    #[test]
    fn unknown_code_is_translated_per_locale() {
        let store = I18nStore::new();
        let err = AppError::UnknownCode("HW-1".into());

        let en_msg = err.to_api_error(&en(), &store).error;
        let pt_msg = err.to_api_error(&Locale("pt".into()), &store).error;

        assert_eq!(en_msg, "Invalid unique code");
        assert_eq!(pt_msg, "Código único inválido");
    }
}
