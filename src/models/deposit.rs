// src/models/deposit.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::location::LocationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "waste_type")]
pub enum WasteType {
    #[sqlx(rename = "metal")]
    #[serde(rename = "metal")]
    Metal,
    #[sqlx(rename = "non-metal")]
    #[serde(rename = "non-metal")]
    NonMetal,
}

// ---
// Transação de depósito (imutável depois de criada)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WasteTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub waste_type: Option<WasteType>,
    #[schema(value_type = f64, example = 2.5)]
    pub weight_kg: Decimal,
    pub is_valid: bool,
    #[schema(value_type = f64, example = 125.0)]
    pub points_earned: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// O que o processador entrega ao store para gravar numa única unidade
/// atômica: transação + crédito + acúmulo no local.
#[derive(Debug, Clone)]
pub struct DepositEntry {
    pub user_id: Uuid,
    pub location_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub waste_type: Option<WasteType>,
    pub weight_kg: Decimal,
    pub is_valid: bool,
    pub points_earned: Decimal,
    pub idempotency_key: Option<String>,
}

/// Resultado da unidade atômica do depósito.
#[derive(Debug, Clone)]
pub struct CommittedDeposit {
    pub transaction: WasteTransaction,
    pub new_balance: Decimal,
    pub location: Option<LocationState>,
    // true quando a chave de idempotência já existia: nada foi alterado
    pub replayed: bool,
}

// --- Payload do hardware ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DepositPayload {
    #[validate(
        required(message = "unique_code is required"),
        length(min = 1, max = 64, message = "unique_code must have 1 to 64 characters")
    )]
    pub unique_code: Option<String>,

    #[validate(required(message = "weight_kg is required"))]
    #[schema(value_type = f64, example = 2.5)]
    pub weight_kg: Option<Decimal>,

    pub location_id: Option<Uuid>,

    // Aceito apenas no canal da empresa
    pub waste_type: Option<WasteType>,

    #[validate(length(min = 1, max = 128, message = "idempotency_key must have 1 to 128 characters"))]
    pub idempotency_key: Option<String>,
}

// --- Resposta ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepositUser {
    pub full_name: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepositResult {
    pub id: Uuid,
    pub user: DepositUser,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_type: Option<WasteType>,
    #[schema(value_type = f64)]
    pub weight_kg: Decimal,
    #[schema(value_type = f64)]
    pub points_earned: Decimal,
    #[schema(value_type = f64)]
    pub new_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    pub success: bool,
    pub transaction: DepositResult,
}
