// src/db/pg_store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        store::RewardsStore, CompanyRepository, DashboardRepository, LocationRepository, ProfileRepository,
        TransactionRepository, WithdrawalRepository,
    },
    models::{
        company::{Company, CompanySettings, NewCompany},
        dashboard::{AdminStats, AdminTransactionRow, AdminWithdrawalRow},
        deposit::{CommittedDeposit, DepositEntry, WasteTransaction},
        location::{Location, LocationChanges, LocationState, NewLocation},
        profile::{LeaderboardEntry, NewProfile, Profile},
        withdrawal::{NewWithdrawal, Withdrawal, WithdrawalOutcome, WithdrawalReceipt, WithdrawalStatus},
    },
};

// ---
// O store de produção: junta os repositórios e abre as transações.
// ---
// Ordem de lock dentro de uma unidade: profile, depois location.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    profiles: ProfileRepository,
    transactions: TransactionRepository,
    locations: LocationRepository,
    withdrawals: WithdrawalRepository,
    companies: CompanyRepository,
    dashboard: DashboardRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            withdrawals: WithdrawalRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            dashboard: DashboardRepository::new(pool.clone()),
            pool,
        }
    }

    /// Débito condicional + diagnóstico da falha na mesma conexão.
    async fn debit_on(&self, conn: &mut PgConnection, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        if let Some(balance) = self.profiles.try_debit(&mut *conn, profile_id, amount).await? {
            return Ok(balance);
        }
        match self.profiles.get_points(&mut *conn, profile_id).await? {
            None => Err(AppError::ResourceNotFound("profile".into())),
            Some(available) => Err(AppError::InsufficientBalance { required: amount, available }),
        }
    }

    /// Trava o local e aplica o peso. Com `company_id`, um local de outra
    /// empresa é tratado como inexistente (checado já com a linha travada).
    async fn accumulate_on(
        &self,
        conn: &mut PgConnection,
        location_id: Uuid,
        company_id: Option<Uuid>,
        weight_kg: Decimal,
    ) -> Result<LocationState, AppError> {
        let location = self
            .locations
            .find_for_update(&mut *conn, location_id)
            .await?
            .filter(|l| company_id.is_none() || l.company_id == company_id)
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;

        let state = location.accumulate(weight_kg)?;
        self.locations.write_fill_state(&mut *conn, &state).await?;
        Ok(state)
    }

    /// Devolve o que já foi gravado com esta chave, sem alterar nada.
    async fn replay(&self, user_id: Uuid, key: &str) -> Result<CommittedDeposit, AppError> {
        let transaction = self
            .transactions
            .find_by_key(&self.pool, user_id, key)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("idempotency key {key} is in flight")))?;
        let new_balance = self
            .profiles
            .get_points(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))?;

        Ok(CommittedDeposit { transaction, new_balance, location: None, replayed: true })
    }
}

#[async_trait]
impl RewardsStore for PgStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // --- Identidade ---

    async fn find_profile_by_code(&self, unique_code: &str) -> Result<Option<Profile>, AppError> {
        self.profiles.find_by_code(unique_code).await
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        self.profiles.find_by_id(id).await
    }

    async fn insert_profile(&self, new_profile: NewProfile) -> Result<Profile, AppError> {
        self.profiles.insert(&new_profile).await
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.profiles.leaderboard(limit).await
    }

    // --- Ledger ---

    async fn credit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        self.profiles
            .credit(&self.pool, profile_id, amount)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))
    }

    async fn debit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.debit_on(&mut conn, profile_id, amount).await
    }

    // --- Depósitos ---

    async fn commit_deposit(&self, entry: DepositEntry) -> Result<CommittedDeposit, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Crédito primeiro: trava o profile e serializa os depósitos do mesmo usuário
        let new_balance = self
            .profiles
            .credit(&mut *tx, entry.user_id, entry.points_earned)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))?;

        // 2. Transação; chave repetida = replay (o rollback desfaz o crédito)
        let Some(transaction) = self.transactions.insert(&mut *tx, &entry).await? else {
            tx.rollback().await?;
            let key = entry.idempotency_key.as_deref().unwrap_or_default();
            return self.replay(entry.user_id, key).await;
        };

        // 3. Acúmulo no local (local inexistente ou de outra empresa desfaz tudo)
        let location = match entry.location_id {
            Some(location_id) => Some(
                self.accumulate_on(&mut tx, location_id, entry.company_id, entry.weight_kg)
                    .await?,
            ),
            None => None,
        };

        tx.commit().await?;

        Ok(CommittedDeposit { transaction, new_balance, location, replayed: false })
    }

    async fn list_transactions_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<WasteTransaction>, AppError> {
        self.transactions.list_for_user(profile_id, limit).await
    }

    async fn recent_transactions(&self, limit: i64) -> Result<Vec<AdminTransactionRow>, AppError> {
        self.transactions.recent_with_owner(limit).await
    }

    // --- Locais ---

    async fn create_location(&self, new_location: NewLocation) -> Result<Location, AppError> {
        self.locations.insert(&new_location).await
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        self.locations.find(id).await
    }

    async fn list_locations(&self, company_id: Option<Uuid>) -> Result<Vec<Location>, AppError> {
        self.locations.list(company_id).await
    }

    async fn update_location(&self, id: Uuid, changes: LocationChanges) -> Result<Location, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut location = self
            .locations
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;
        changes.apply_to(&mut location);
        let saved = self.locations.save(&mut *tx, &location).await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_location(&self, id: Uuid) -> Result<(), AppError> {
        if !self.locations.delete(id).await? {
            return Err(AppError::ResourceNotFound("location".into()));
        }
        Ok(())
    }

    async fn accumulate(&self, location_id: Uuid, weight_kg: Decimal) -> Result<LocationState, AppError> {
        let mut tx = self.pool.begin().await?;
        let state = self.accumulate_on(&mut tx, location_id, None, weight_kg).await?;
        tx.commit().await?;
        Ok(state)
    }

    // --- Saques ---

    async fn create_withdrawal(&self, new_withdrawal: NewWithdrawal) -> Result<WithdrawalReceipt, AppError> {
        let mut tx = self.pool.begin().await?;

        let new_balance = self
            .debit_on(&mut tx, new_withdrawal.user_id, new_withdrawal.points_deducted)
            .await?;
        let withdrawal = self.withdrawals.insert(&mut *tx, &new_withdrawal).await?;

        tx.commit().await?;
        Ok(WithdrawalReceipt { withdrawal, new_balance })
    }

    async fn resolve_withdrawal(&self, id: Uuid, outcome: WithdrawalOutcome) -> Result<Withdrawal, AppError> {
        if let Some(withdrawal) = self.withdrawals.resolve(&self.pool, id, outcome.into()).await? {
            return Ok(withdrawal);
        }
        match self.withdrawals.find(id).await? {
            None => Err(AppError::ResourceNotFound("withdrawal".into())),
            Some(_) => Err(AppError::WithdrawalAlreadyResolved(id)),
        }
    }

    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>, AppError> {
        self.withdrawals.find(id).await
    }

    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
    ) -> Result<Vec<AdminWithdrawalRow>, AppError> {
        self.withdrawals.list_with_owner(status, limit).await
    }

    async fn list_withdrawals_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<Withdrawal>, AppError> {
        self.withdrawals.list_for_user(profile_id, limit).await
    }

    // --- Empresas ---

    async fn insert_company(&self, new_company: NewCompany) -> Result<Company, AppError> {
        self.companies.insert(&new_company).await
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        self.companies.find(id).await
    }

    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        self.companies.find_by_slug(slug).await
    }

    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.companies.list().await
    }

    async fn update_company(&self, id: Uuid, settings: CompanySettings) -> Result<Company, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut company = self
            .companies
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("company".into()))?;
        settings.apply_to(&mut company);
        let saved = self.companies.save(&mut *tx, &company).await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn is_company_owner(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        self.companies.is_owner(user_id, company_id).await
    }

    // --- Painel ---

    async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        self.dashboard.stats().await
    }
}

// Testes contra um Postgres de verdade. Sem `DATABASE_URL` eles só avisam
// e retornam. Cada teste usa códigos e slugs novos, então podem dividir o
// mesmo banco.
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    use crate::models::location::LocationStatus;

    fn d(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    async fn store() -> Option<PgStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL não definida: pulando teste do PgStore");
            return None;
        };
        let pool = PgPoolOptions::new().max_connections(10).connect(&url).await.expect("connect");
        sqlx::migrate!().run(&pool).await.expect("migrations");
        Some(PgStore::new(pool))
    }

    async fn funded(store: &PgStore, points: &str) -> Profile {
        let code = format!("PG-{}", Uuid::new_v4().simple());
        let profile = store.insert_profile(NewProfile::placeholder(&code)).await.unwrap();
        store.credit(profile.id, d(points)).await.unwrap();
        profile
    }

    async fn company(store: &PgStore) -> Company {
        let slug = format!("pg-{}", Uuid::new_v4().simple());
        store
            .insert_company(NewCompany {
                owner_user_id: Some(Uuid::new_v4()),
                name: "GreenCycle".into(),
                email: "ops@greencycle.ng".into(),
                phone: "0800".into(),
                address: "Lagos".into(),
                contact_person: "Ada".into(),
                description: None,
                registration_number: None,
                company_slug: slug,
            })
            .await
            .unwrap()
    }

    async fn bin(store: &PgStore, company_id: Option<Uuid>, capacity: &str) -> Location {
        store
            .create_location(NewLocation {
                company_id,
                name: "Yaba Bin".into(),
                address: "Yaba".into(),
                latitude: None,
                longitude: None,
                capacity_kg: d(capacity),
            })
            .await
            .unwrap()
    }

    fn entry(user_id: Uuid, location_id: Option<Uuid>, key: Option<&str>) -> DepositEntry {
        DepositEntry {
            user_id,
            location_id,
            company_id: None,
            waste_type: None,
            weight_kg: d("2.5"),
            is_valid: true,
            points_earned: d("125"),
            idempotency_key: key.map(str::to_string),
        }
    }

    async fn points(store: &PgStore, profile_id: Uuid) -> Decimal {
        store.find_profile(profile_id).await.unwrap().unwrap().points
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_withdrawals_of_more_than_half_never_overdraw() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "100").await;
        let user_id = profile.id;

        let requests: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_withdrawal(NewWithdrawal {
                            user_id,
                            company_id: None,
                            points_deducted: d("51"),
                            amount_naira: d("204"),
                        })
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for request in requests {
            match request.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AppError::InsufficientBalance { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(points(&store, profile.id).await, d("49"));
        assert_eq!(store.list_withdrawals_for(profile.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn debit_reports_available_balance() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "40").await;

        let err = store.debit(profile.id, d("50")).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { available, .. } if available == d("40")));
        assert!(matches!(
            store.debit(Uuid::new_v4(), d("1")).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn replayed_key_rolls_back_the_second_credit() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "0").await;
        let key = Uuid::new_v4().to_string();

        let first = store.commit_deposit(entry(profile.id, None, Some(&key))).await.unwrap();
        let second = store.commit_deposit(entry(profile.id, None, Some(&key))).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.transaction.id, second.transaction.id);
        assert_eq!(second.new_balance, d("125"));
        assert_eq!(points(&store, profile.id).await, d("125"));
        assert_eq!(store.list_transactions_for(profile.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_retries_with_one_key_credit_once() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "0").await;
        let key = Uuid::new_v4().to_string();
        let user_id = profile.id;

        let retries: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move { store.commit_deposit(entry(user_id, None, Some(&key))).await })
            })
            .collect();

        let mut ids = Vec::new();
        let mut fresh = 0;
        for retry in retries {
            let committed = retry.await.unwrap().unwrap();
            if !committed.replayed {
                fresh += 1;
            }
            ids.push(committed.transaction.id);
        }

        assert_eq!(fresh, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(points(&store, profile.id).await, d("125"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_accumulate_sums_every_weight() {
        let Some(store) = store().await else { return };
        let location = bin(&store, None, "30").await;
        let location_id = location.id;

        let deposits: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.accumulate(location_id, d("1.5")).await })
            })
            .collect();
        let mut became_full = 0;
        for deposit in deposits {
            if deposit.await.unwrap().unwrap().became_full {
                became_full += 1;
            }
        }

        let saved = store.find_location(location.id).await.unwrap().unwrap();
        assert_eq!(saved.current_weight_kg, d("30"));
        assert_eq!(saved.status, LocationStatus::Full);
        assert_eq!(became_full, 1);
    }

    #[tokio::test]
    async fn missing_location_rolls_back_the_deposit() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "0").await;

        let err = store
            .commit_deposit(entry(profile.id, Some(Uuid::new_v4()), None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(points(&store, profile.id).await, Decimal::ZERO);
        assert!(store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn location_of_another_company_is_checked_under_lock() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "0").await;
        let owner = company(&store).await;
        let other = company(&store).await;
        let location = bin(&store, Some(owner.id), "100").await;

        let mut deposit = entry(profile.id, Some(location.id), None);
        deposit.company_id = Some(other.id);
        let err = store.commit_deposit(deposit).await.unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(points(&store, profile.id).await, Decimal::ZERO);
        let saved = store.find_location(location.id).await.unwrap().unwrap();
        assert_eq!(saved.current_weight_kg, Decimal::ZERO);

        let mut deposit = entry(profile.id, Some(location.id), None);
        deposit.company_id = Some(owner.id);
        let committed = store.commit_deposit(deposit).await.unwrap();
        assert_eq!(committed.location.unwrap().current_weight_kg, d("2.5"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn withdrawal_resolves_once_even_when_raced() {
        let Some(store) = store().await else { return };
        let profile = funded(&store, "100").await;
        let receipt = store
            .create_withdrawal(NewWithdrawal {
                user_id: profile.id,
                company_id: None,
                points_deducted: d("50"),
                amount_naira: d("200"),
            })
            .await
            .unwrap();
        let id = receipt.withdrawal.id;

        let (a, b) = tokio::join!(
            store.resolve_withdrawal(id, WithdrawalOutcome::Completed),
            store.resolve_withdrawal(id, WithdrawalOutcome::Failed)
        );
        let resolved = [a, b];
        assert_eq!(resolved.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(resolved.iter().any(|r| matches!(r, Err(AppError::WithdrawalAlreadyResolved(_)))));

        let saved = store.find_withdrawal(id).await.unwrap().unwrap();
        assert_ne!(saved.status, WithdrawalStatus::Pending);
        assert!(saved.processed_at.is_some());
        // Falha não devolve os pontos
        assert_eq!(points(&store, profile.id).await, d("50"));
    }
}
