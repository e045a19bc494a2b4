// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::dashboard::AdminStats};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Resumo geral do painel do admin, numa única consulta.
    pub async fn stats(&self) -> Result<AdminStats, AppError> {
        let stats = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM profiles) AS total_users,
                (SELECT COUNT(*) FROM transactions) AS total_transactions,
                (SELECT COALESCE(SUM(weight_kg), 0) FROM transactions) AS total_weight_kg,
                (SELECT COUNT(*) FROM withdrawals WHERE status = 'pending') AS pending_withdrawals
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
