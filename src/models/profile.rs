// src/models/profile.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const PLACEHOLDER_FULL_NAME: &str = "Hardware User";

// ---
// 1. Profile (a "Conta")
// ---
// Identidade de um participante. `points` só é alterado pelo Ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "Ada Okafor")]
    pub full_name: String,
    #[schema(example = "ada_o")]
    pub username: String,
    #[schema(example = "TTC-00042")]
    pub unique_code: String,
    #[schema(value_type = f64, example = 125.0)]
    pub points: Decimal,
    pub is_registered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados para inserir um profile novo (saldo sempre começa em zero).
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub unique_code: String,
    pub is_registered: bool,
}

impl NewProfile {
    /// Conta "placeholder" criada no primeiro contato do hardware.
    pub fn placeholder(unique_code: &str) -> Self {
        let prefix: String = unique_code.chars().take(8).collect();
        Self {
            id: Uuid::new_v4(),
            full_name: PLACEHOLDER_FULL_NAME.to_string(),
            username: format!("user_{}", prefix),
            unique_code: unique_code.to_string(),
            is_registered: false,
        }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UniqueCodePayload {
    #[validate(
        required(message = "unique_code is required"),
        length(min = 1, max = 64, message = "unique_code must have 1 to 64 characters")
    )]
    pub unique_code: Option<String>,
}

/// Cadastro self-service: o ID vem do token, não do corpo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupPayload {
    #[validate(length(min = 1, message = "full_name is required"))]
    pub full_name: String,
    #[validate(length(min = 3, max = 32, message = "username must have 3 to 32 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 64, message = "unique_code must have 1 to 64 characters"))]
    pub unique_code: String,
}

// --- Respostas ---

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckUserResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
}

impl From<Option<Profile>> for CheckUserResponse {
    fn from(profile: Option<Profile>) -> Self {
        match profile {
            Some(p) => Self {
                exists: true,
                user_id: Some(p.id),
                full_name: Some(p.full_name),
                is_registered: Some(p.is_registered),
            },
            None => Self { exists: false, user_id: None, full_name: None, is_registered: None },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterUserResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub message: String,
    pub is_registered: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub profile: Profile,
    #[schema(value_type = f64)]
    pub naira_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[schema(value_type = f64)]
    pub points: Decimal,
}
