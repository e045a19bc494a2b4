// src/services/ledger_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{common::error::AppError, db::RewardsStore};

/// O dono do saldo. Crédito e débito passam sempre por aqui (ou pelas
/// unidades compostas do store, que usam as mesmas primitivas).
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn RewardsStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn RewardsStore>) -> Self {
        Self { store }
    }

    pub(crate) fn check_amount(field: &str, amount: Decimal) -> Result<(), AppError> {
        if amount < Decimal::ZERO {
            return Err(AppError::InvalidInput(format!("{field} must be non-negative")));
        }
        Ok(())
    }

    pub async fn credit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        Self::check_amount("amount", amount)?;
        let balance = self.store.credit(profile_id, amount).await?;
        tracing::info!(%profile_id, %amount, %balance, "Crédito aplicado");
        Ok(balance)
    }

    pub async fn debit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        Self::check_amount("amount", amount)?;
        let balance = self.store.debit(profile_id, amount).await?;
        tracing::info!(%profile_id, %amount, %balance, "Débito aplicado");
        Ok(balance)
    }

    pub async fn balance(&self, profile_id: Uuid) -> Result<Decimal, AppError> {
        self.store
            .find_profile(profile_id)
            .await?
            .map(|p| p.points)
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{d, Fixture};

    #[tokio::test]
    async fn credit_then_debit_moves_the_balance() {
        let fx = Fixture::new();
        let profile = fx.profile("HW-LEDGER").await;

        assert_eq!(fx.ledger.credit(profile.id, d("100")).await.unwrap(), d("100"));
        assert_eq!(fx.ledger.debit(profile.id, d("30.5")).await.unwrap(), d("69.5"));
        assert_eq!(fx.ledger.balance(profile.id).await.unwrap(), d("69.5"));
    }

    #[tokio::test]
    async fn negative_amounts_are_rejected_before_touching_the_store() {
        let fx = Fixture::new();
        let profile = fx.profile("HW-NEG").await;

        assert!(matches!(fx.ledger.credit(profile.id, d("-1")).await, Err(AppError::InvalidInput(_))));
        assert!(matches!(fx.ledger.debit(profile.id, d("-1")).await, Err(AppError::InvalidInput(_))));
        assert_eq!(fx.ledger.balance(profile.id).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn overdraft_fails_and_keeps_the_balance() {
        let fx = Fixture::new();
        let profile = fx.profile("HW-OVER").await;
        fx.ledger.credit(profile.id, d("10")).await.unwrap();

        let err = fx.ledger.debit(profile.id, d("10.01")).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { .. }));
        assert_eq!(fx.ledger.balance(profile.id).await.unwrap(), d("10"));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let fx = Fixture::new();
        let err = fx.ledger.credit(Uuid::new_v4(), d("1")).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}
