// src/db/withdrawal_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::AdminWithdrawalRow,
        withdrawal::{NewWithdrawal, Withdrawal, WithdrawalStatus},
    },
};

#[derive(Clone)]
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, new_withdrawal: &NewWithdrawal) -> Result<Withdrawal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let withdrawal = sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (user_id, company_id, points_deducted, amount_naira, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(new_withdrawal.user_id)
        .bind(new_withdrawal.company_id)
        .bind(new_withdrawal.points_deducted)
        .bind(new_withdrawal.amount_naira)
        .fetch_one(executor)
        .await?;
        Ok(withdrawal)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Withdrawal>, AppError> {
        let withdrawal = sqlx::query_as::<_, Withdrawal>("SELECT * FROM withdrawals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(withdrawal)
    }

    /// Transição condicional: só sai de `pending`. `None` = não estava
    /// pendente (ou não existe); o chamador decide qual dos dois.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: WithdrawalStatus,
    ) -> Result<Option<Withdrawal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let withdrawal = sqlx::query_as::<_, Withdrawal>(
            r#"
            UPDATE withdrawals
            SET status = $2, processed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(withdrawal)
    }

    pub async fn list_with_owner(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
    ) -> Result<Vec<AdminWithdrawalRow>, AppError> {
        let rows = sqlx::query_as::<_, AdminWithdrawalRow>(
            r#"
            SELECT
                w.id, w.user_id, p.full_name, p.username, w.amount_naira,
                w.points_deducted, w.status, w.created_at, w.processed_at
            FROM withdrawals w
            JOIN profiles p ON p.id = w.user_id
            WHERE ($1::withdrawal_status IS NULL OR w.status = $1)
            ORDER BY w.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Withdrawal>, AppError> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT * FROM withdrawals
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(withdrawals)
    }
}
