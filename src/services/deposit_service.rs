// src/services/deposit_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::{
        company::Company,
        deposit::{DepositEntry, DepositPayload, DepositResult, DepositUser},
        policy::RewardRules,
    },
    services::{identity_service::IdentityService, ledger_service::LedgerService, notifier::CapacityNotifier},
};

pub const BELOW_THRESHOLD_MESSAGE: &str = "Weight is at or below the validity threshold. No points awarded.";
pub const REPLAYED_MESSAGE: &str = "Duplicate submission. Original transaction returned.";

// ---
// Processador de depósitos
// ---
// Valida, classifica, pontua e entrega tudo ao store numa unidade só:
// transação + crédito + acúmulo no local.
#[derive(Clone)]
pub struct DepositService {
    store: Arc<dyn RewardsStore>,
    identity: IdentityService,
    rules: RewardRules,
    notifier: Arc<dyn CapacityNotifier>,
}

impl DepositService {
    pub fn new(
        store: Arc<dyn RewardsStore>,
        identity: IdentityService,
        rules: RewardRules,
        notifier: Arc<dyn CapacityNotifier>,
    ) -> Self {
        Self { store, identity, rules, notifier }
    }

    /// `company == None` é o canal padrão do hardware; `Some` é o portal
    /// da empresa (a regra de pontuação muda conforme o canal).
    pub async fn submit(&self, payload: DepositPayload, company: Option<&Company>) -> Result<DepositResult, AppError> {
        // 1. Entrada (nada é gravado antes disso passar)
        let weight_kg = payload
            .weight_kg
            .ok_or_else(|| AppError::InvalidInput("weight_kg is required".into()))?;
        LedgerService::check_amount("weight_kg", weight_kg)?;

        if company.is_none() && payload.waste_type.is_some() {
            return Err(AppError::InvalidInput(
                "waste_type is only accepted on a company channel".into(),
            ));
        }

        let unique_code = payload.unique_code.as_deref().unwrap_or_default();

        // 2. Classificação e pontos (estouro é entrada inválida, antes de criar conta)
        let policy = self.rules.submission_for(company, payload.waste_type);
        let assessment = policy.assess(weight_kg, payload.waste_type)?;

        // Rejeição antecipada do local de outra empresa. A checagem que vale
        // é a do store, com a linha do local travada.
        if let (Some(company), Some(location_id)) = (company, payload.location_id) {
            let location = self.store.find_location(location_id).await?;
            if location.is_none_or(|l| l.company_id != Some(company.id)) {
                return Err(AppError::ResourceNotFound("location".into()));
            }
        }

        // 3. Conta
        let (profile, _) = self.identity.resolve_or_create(unique_code).await?;

        // 4. Unidade atômica
        let committed = self
            .store
            .commit_deposit(DepositEntry {
                user_id: profile.id,
                location_id: payload.location_id,
                company_id: company.map(|c| c.id),
                waste_type: payload.waste_type,
                weight_kg,
                is_valid: assessment.is_valid,
                points_earned: assessment.points_earned,
                idempotency_key: payload.idempotency_key.clone(),
            })
            .await?;

        let transaction = &committed.transaction;
        if committed.replayed {
            tracing::info!(
                transaction_id = %transaction.id,
                profile_id = %profile.id,
                "Depósito repetido: devolvendo a transação original"
            );
        } else {
            tracing::info!(
                transaction_id = %transaction.id,
                profile_id = %profile.id,
                company_id = ?transaction.company_id,
                location_id = ?transaction.location_id,
                weight_kg = %transaction.weight_kg,
                is_valid = transaction.is_valid,
                points_earned = %transaction.points_earned,
                new_balance = %committed.new_balance,
                "Depósito registrado"
            );
        }

        // 5. Aviso de local cheio (depois do commit)
        if let Some(location) = &committed.location {
            if location.previous_status != location.status {
                tracing::info!(
                    location_id = %location.location_id,
                    from = ?location.previous_status,
                    to = ?location.status,
                    "Status do local alterado"
                );
            }
            if location.became_full {
                self.notifier.notify_full(location);
            }
        }

        let message = if committed.replayed {
            Some(REPLAYED_MESSAGE.to_string())
        } else if !transaction.is_valid {
            Some(BELOW_THRESHOLD_MESSAGE.to_string())
        } else {
            None
        };

        Ok(DepositResult {
            id: transaction.id,
            user: DepositUser { full_name: profile.full_name, username: profile.username },
            is_valid: transaction.is_valid,
            waste_type: transaction.waste_type,
            weight_kg: transaction.weight_kg,
            points_earned: transaction.points_earned,
            new_balance: committed.new_balance,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{deposit::WasteType, location::LocationStatus},
        services::testing::{d, deposit, Fixture},
    };

    #[tokio::test]
    async fn valid_deposit_credits_flat_rate() {
        let fx = Fixture::new();

        let result = fx.deposits.submit(deposit("HW-1", "2.5"), None).await.unwrap();

        assert!(result.is_valid);
        assert_eq!(result.points_earned, d("125"));
        assert_eq!(result.new_balance, d("125"));
        assert_eq!(result.user.full_name, "Hardware User");
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn balance_grows_by_points_earned() {
        let fx = Fixture::new();
        fx.deposits.submit(deposit("HW-2", "1"), None).await.unwrap();

        let result = fx.deposits.submit(deposit("HW-2", "0.5"), None).await.unwrap();

        assert_eq!(result.points_earned, d("25"));
        assert_eq!(result.new_balance, d("75"));
    }

    #[tokio::test]
    async fn threshold_weight_is_recorded_invalid() {
        let fx = Fixture::new();

        let result = fx.deposits.submit(deposit("HW-3", "0.1"), None).await.unwrap();

        assert!(!result.is_valid);
        assert_eq!(result.points_earned, Decimal::ZERO);
        assert_eq!(result.new_balance, Decimal::ZERO);
        assert_eq!(result.message.as_deref(), Some(BELOW_THRESHOLD_MESSAGE));

        let profile = fx.identity.lookup("HW-3").await.unwrap();
        assert_eq!(fx.store.list_transactions_for(profile.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_weight_is_accepted_as_invalid() {
        let fx = Fixture::new();
        let result = fx.deposits.submit(deposit("HW-Z", "0"), None).await.unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.points_earned, Decimal::ZERO);
    }

    #[tokio::test]
    async fn negative_weight_leaves_no_trace() {
        let fx = Fixture::new();
        let profile = fx.profile("HW-4").await;

        let err = fx.deposits.submit(deposit("HW-4", "-1"), None).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(fx.store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
        assert_eq!(fx.ledger.balance(profile.id).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn missing_weight_or_code_is_invalid_input() {
        let fx = Fixture::new();

        let mut no_weight = deposit("HW-5", "1");
        no_weight.weight_kg = None;
        assert!(matches!(fx.deposits.submit(no_weight, None).await, Err(AppError::InvalidInput(_))));

        let blank_code = deposit("  ", "1");
        assert!(matches!(fx.deposits.submit(blank_code, None).await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn default_channel_rejects_waste_type() {
        let fx = Fixture::new();
        let mut payload = deposit("HW-6", "1");
        payload.waste_type = Some(WasteType::Metal);

        assert!(matches!(fx.deposits.submit(payload, None).await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn location_accumulates_every_deposit_and_fills() {
        let fx = Fixture::new();
        let location = fx.location(None, "1").await;

        let weights = ["0.05", "0.3", "0.4"];
        for w in weights {
            let mut payload = deposit("HW-7", w);
            payload.location_id = Some(location.id);
            fx.deposits.submit(payload, None).await.unwrap();
        }

        let stored = fx.store.find_location(location.id).await.unwrap().unwrap();
        let expected: Decimal = weights.iter().map(|w| d(w)).sum();
        assert_eq!(stored.current_weight_kg, expected);
        assert_eq!(stored.status, LocationStatus::Available);
        assert!(fx.notified().is_empty());

        let mut payload = deposit("HW-7", "0.25");
        payload.location_id = Some(location.id);
        fx.deposits.submit(payload, None).await.unwrap();

        let stored = fx.store.find_location(location.id).await.unwrap().unwrap();
        assert_eq!(stored.current_weight_kg, d("1"));
        assert_eq!(stored.status, LocationStatus::Full);
        assert_eq!(fx.notified(), vec![location.id]);

        // Já cheio: não avisa de novo
        let mut payload = deposit("HW-7", "1");
        payload.location_id = Some(location.id);
        fx.deposits.submit(payload, None).await.unwrap();
        assert_eq!(fx.notified().len(), 1);
    }

    #[tokio::test]
    async fn oversized_weight_is_rejected_before_any_write() {
        let fx = Fixture::new();

        let err = fx
            .deposits
            .submit(deposit("HW-BIG", "10000000000000000000000000000"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(matches!(fx.identity.lookup("HW-BIG").await, Err(AppError::UnknownCode(_))));
    }

    #[tokio::test]
    async fn unknown_location_rolls_back_everything() {
        let fx = Fixture::new();
        let profile = fx.profile("HW-8").await;
        let mut payload = deposit("HW-8", "2");
        payload.location_id = Some(uuid::Uuid::new_v4());

        let err = fx.deposits.submit(payload, None).await.unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(fx.ledger.balance(profile.id).await.unwrap(), Decimal::ZERO);
        assert!(fx.store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn idempotency_key_prevents_double_credit() {
        let fx = Fixture::new();
        let mut payload = deposit("HW-10", "2");
        payload.idempotency_key = Some("bin-7:seq-1".into());
        let retry = DepositPayload { idempotency_key: payload.idempotency_key.clone(), ..deposit("HW-10", "2") };

        let first = fx.deposits.submit(payload, None).await.unwrap();
        let second = fx.deposits.submit(retry, None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.new_balance, d("100"));
        assert_eq!(second.message.as_deref(), Some(REPLAYED_MESSAGE));
    }

    #[tokio::test]
    async fn company_channel_uses_tenant_rate_without_threshold() {
        let fx = Fixture::new();
        let company = fx.company("Lagos Recyclers").await;

        let result = fx.deposits.submit(deposit("HW-11", "0.05"), Some(&company)).await.unwrap();

        assert!(result.is_valid);
        assert_eq!(result.points_earned, d("0.5"));
    }

    #[tokio::test]
    async fn company_channel_prices_by_category() {
        let fx = Fixture::new();
        let company = fx.company("Metal Works").await;
        let mut payload = deposit("HW-12", "3");
        payload.waste_type = Some(WasteType::Metal);

        let result = fx.deposits.submit(payload, Some(&company)).await.unwrap();

        assert_eq!(result.points_earned, d("15"));
        assert_eq!(result.waste_type, Some(WasteType::Metal));
    }

    #[tokio::test]
    async fn company_channel_rejects_foreign_location() {
        let fx = Fixture::new();
        let company = fx.company("Owner Co").await;
        let foreign = fx.location(None, "100").await;
        let mut payload = deposit("HW-13", "1");
        payload.location_id = Some(foreign.id);

        let err = fx.deposits.submit(payload, Some(&company)).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}
