// src/services/withdrawal_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::{
        company::Company,
        dashboard::AdminWithdrawalRow,
        policy::RewardRules,
        withdrawal::{NewWithdrawal, Withdrawal, WithdrawalOutcome, WithdrawalReceipt, WithdrawalStatus},
    },
};

// ---
// Fluxo de saque: pending -> completed | failed
// ---
// Os pontos são debitados na criação. Resolver não mexe no saldo.
#[derive(Clone)]
pub struct WithdrawalService {
    store: Arc<dyn RewardsStore>,
    rules: RewardRules,
}

impl WithdrawalService {
    pub fn new(store: Arc<dyn RewardsStore>, rules: RewardRules) -> Self {
        Self { store, rules }
    }

    /// `company == None` é o canal padrão (₦4 por ponto, mínimo ₦50);
    /// `Some` é o portal da empresa (1:1, mínimo da empresa).
    pub async fn request(
        &self,
        profile_id: Uuid,
        amount_naira: Option<Decimal>,
        company: Option<&Company>,
    ) -> Result<WithdrawalReceipt, AppError> {
        if company.is_some_and(|c| !c.cash_reward_enabled) {
            return Err(AppError::PortalDisabled);
        }
        let amount_naira =
            amount_naira.ok_or_else(|| AppError::InvalidInput("amount_naira is required".into()))?;

        let policy = self.rules.withdrawal_for(company);
        let points_deducted = policy.points_required(amount_naira)?;

        let receipt = self
            .store
            .create_withdrawal(NewWithdrawal {
                user_id: profile_id,
                company_id: company.map(|c| c.id),
                points_deducted,
                amount_naira,
            })
            .await?;

        tracing::info!(
            withdrawal_id = %receipt.withdrawal.id,
            %profile_id,
            %amount_naira,
            %points_deducted,
            new_balance = %receipt.new_balance,
            "Saque solicitado"
        );
        Ok(receipt)
    }

    pub async fn resolve(&self, id: Uuid, outcome: WithdrawalOutcome) -> Result<Withdrawal, AppError> {
        let withdrawal = self.store.resolve_withdrawal(id, outcome).await?;
        tracing::info!(withdrawal_id = %id, status = ?withdrawal.status, "Saque processado");
        Ok(withdrawal)
    }

    pub async fn find(&self, id: Uuid) -> Result<Withdrawal, AppError> {
        self.store
            .find_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("withdrawal".into()))
    }

    pub async fn list(&self, status: Option<WithdrawalStatus>, limit: i64) -> Result<Vec<AdminWithdrawalRow>, AppError> {
        self.store.list_withdrawals(status, limit).await
    }
}
