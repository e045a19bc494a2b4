// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{deposit::WasteTransaction, withdrawal::{Withdrawal, WithdrawalStatus}};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_transactions: i64,
    #[schema(value_type = f64)]
    pub total_weight_kg: Decimal,
    pub pending_withdrawals: i64,
}

/// Linha do painel do admin: transação + dono.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminTransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub username: String,
    pub location_id: Option<Uuid>,
    #[schema(value_type = f64)]
    pub weight_kg: Decimal,
    pub is_valid: bool,
    #[schema(value_type = f64)]
    pub points_earned: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminWithdrawalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub username: String,
    #[schema(value_type = f64)]
    pub amount_naira: Decimal,
    #[schema(value_type = f64)]
    pub points_deducted: Decimal,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Histórico do próprio usuário (mais recentes primeiro).
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub transactions: Vec<WasteTransaction>,
    pub withdrawals: Vec<Withdrawal>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    /// Limite pedido, preso ao intervalo [1, max].
    pub fn clamp(&self, default: i64, max: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, max)
    }
}
