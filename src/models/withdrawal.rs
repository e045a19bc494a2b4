// src/models/withdrawal.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "withdrawal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
    Failed,
}

/// Os dois destinos possíveis de um saque pendente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalOutcome {
    Completed,
    Failed,
}

impl From<WithdrawalOutcome> for WithdrawalStatus {
    fn from(outcome: WithdrawalOutcome) -> Self {
        match outcome {
            WithdrawalOutcome::Completed => WithdrawalStatus::Completed,
            WithdrawalOutcome::Failed => WithdrawalStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Withdrawal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    #[schema(value_type = f64, example = 50.0)]
    pub points_deducted: Decimal,
    #[schema(value_type = f64, example = 200.0)]
    pub amount_naira: Decimal,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Withdrawal {
    /// Só `pending` pode ser resolvido, e uma única vez.
    pub fn is_resolvable(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub points_deducted: Decimal,
    pub amount_naira: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WithdrawalReceipt {
    pub withdrawal: Withdrawal,
    #[schema(value_type = f64)]
    pub new_balance: Decimal,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WithdrawalPayload {
    #[validate(required(message = "amount_naira is required"))]
    #[schema(value_type = f64, example = 200.0)]
    pub amount_naira: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveWithdrawalPayload {
    pub outcome: WithdrawalOutcome,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WithdrawalQuery {
    pub status: Option<WithdrawalStatus>,
    pub limit: Option<i64>,
}
