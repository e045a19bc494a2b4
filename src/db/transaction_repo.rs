// src/db/transaction_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::AdminTransactionRow,
        deposit::{DepositEntry, WasteTransaction},
    },
};

// Livro de depósitos. Só INSERT: nenhuma linha é alterada depois.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grava a transação. Se a chave de idempotência já foi usada por este
    /// usuário, não grava nada e devolve `None`.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        entry: &DepositEntry,
    ) -> Result<Option<WasteTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, WasteTransaction>(
            r#"
            INSERT INTO transactions (
                user_id, location_id, company_id, waste_type,
                weight_kg, is_valid, points_earned, idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, idempotency_key) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.location_id)
        .bind(entry.company_id)
        .bind(entry.waste_type)
        .bind(entry.weight_kg)
        .bind(entry.is_valid)
        .bind(entry.points_earned)
        .bind(entry.idempotency_key.as_deref())
        .fetch_optional(executor)
        .await?;

        Ok(transaction)
    }

    pub async fn find_by_key<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        idempotency_key: &str,
    ) -> Result<Option<WasteTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, WasteTransaction>(
            "SELECT * FROM transactions WHERE user_id = $1 AND idempotency_key = $2",
        )
        .bind(user_id)
        .bind(idempotency_key)
        .fetch_optional(executor)
        .await?;
        Ok(transaction)
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<WasteTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, WasteTransaction>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    pub async fn recent_with_owner(&self, limit: i64) -> Result<Vec<AdminTransactionRow>, AppError> {
        let rows = sqlx::query_as::<_, AdminTransactionRow>(
            r#"
            SELECT
                t.id, t.user_id, p.full_name, p.username, t.location_id,
                t.weight_kg, t.is_valid, t.points_earned, t.created_at
            FROM transactions t
            JOIN profiles p ON p.id = t.user_id
            ORDER BY t.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
