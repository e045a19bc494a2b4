// src/services/dashboard_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::dashboard::{AdminStats, AdminTransactionRow},
};

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RewardsStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RewardsStore>) -> Self {
        Self { store }
    }

    pub async fn stats(&self) -> Result<AdminStats, AppError> {
        self.store.admin_stats().await
    }

    pub async fn recent_transactions(&self, limit: i64) -> Result<Vec<AdminTransactionRow>, AppError> {
        self.store.recent_transactions(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{d, deposit, Fixture};

    #[tokio::test]
    async fn stats_sum_every_deposit() {
        let fx = Fixture::new();
        fx.deposits.submit(deposit("HW-D1", "2.5"), None).await.unwrap();
        fx.deposits.submit(deposit("HW-D2", "0.1"), None).await.unwrap();

        let stats = fx.dashboard.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_weight_kg, d("2.6"));
        assert_eq!(stats.pending_withdrawals, 0);

        let recent = fx.dashboard.recent_transactions(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].username, "user_HW-D2");
    }
}
