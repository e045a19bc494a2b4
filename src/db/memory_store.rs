// src/db/memory_store.rs

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::RewardsStore,
    models::{
        company::{Company, CompanySettings, NewCompany},
        dashboard::{AdminStats, AdminTransactionRow, AdminWithdrawalRow},
        deposit::{CommittedDeposit, DepositEntry, WasteTransaction},
        location::{Location, LocationChanges, LocationState, LocationStatus, NewLocation},
        profile::{LeaderboardEntry, NewProfile, Profile},
        withdrawal::{NewWithdrawal, Withdrawal, WithdrawalOutcome, WithdrawalReceipt, WithdrawalStatus},
    },
};

// Soma ao saldo sem pânico de estouro.
fn credited(points: Decimal, amount: Decimal) -> Result<Decimal, AppError> {
    points
        .checked_add(amount)
        .ok_or_else(|| AppError::InvalidInput("amount overflows the balance".into()))
}

#[derive(Default)]
struct State {
    profiles: HashMap<Uuid, Profile>,
    companies: HashMap<Uuid, Company>,
    locations: HashMap<Uuid, Location>,
    // Ordem de inserção (a mais nova no fim)
    transactions: Vec<WasteTransaction>,
    withdrawals: Vec<Withdrawal>,
}

impl State {
    fn profile_mut(&mut self, id: Uuid) -> Result<&mut Profile, AppError> {
        self.profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))
    }

    fn owner_of(&self, user_id: Uuid) -> (String, String) {
        self.profiles
            .get(&user_id)
            .map(|p| (p.full_name.clone(), p.username.clone()))
            .unwrap_or_default()
    }
}

/// Store em memória. Um único mutex serializa todas as unidades, então
/// cada método é atômico: valida tudo antes de alterar qualquer coisa.
///
/// Usado nos testes e com `STORAGE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl RewardsStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    // --- Identidade ---

    async fn find_profile_by_code(&self, unique_code: &str) -> Result<Option<Profile>, AppError> {
        let state = self.lock()?;
        Ok(state.profiles.values().find(|p| p.unique_code == unique_code).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.lock()?.profiles.get(&id).cloned())
    }

    async fn insert_profile(&self, new_profile: NewProfile) -> Result<Profile, AppError> {
        let mut state = self.lock()?;

        if state.profiles.values().any(|p| p.unique_code == new_profile.unique_code) {
            return Err(AppError::UniqueCodeTaken(new_profile.unique_code));
        }
        if state.profiles.contains_key(&new_profile.id) {
            return Err(AppError::Conflict(format!("profile {} already exists", new_profile.id)));
        }

        let now = Utc::now();
        let profile = Profile {
            id: new_profile.id,
            full_name: new_profile.full_name,
            username: new_profile.username,
            unique_code: new_profile.unique_code,
            points: Decimal::ZERO,
            is_registered: new_profile.is_registered,
            created_at: now,
            updated_at: now,
        };
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let state = self.lock()?;
        let mut profiles: Vec<&Profile> = state.profiles.values().collect();
        profiles.sort_by(|a, b| b.points.cmp(&a.points).then(a.created_at.cmp(&b.created_at)));

        Ok(profiles
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|p| LeaderboardEntry {
                id: p.id,
                username: p.username.clone(),
                full_name: p.full_name.clone(),
                points: p.points,
            })
            .collect())
    }

    // --- Ledger ---

    async fn credit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        let mut state = self.lock()?;
        let profile = state.profile_mut(profile_id)?;
        profile.points = credited(profile.points, amount)?;
        profile.updated_at = Utc::now();
        Ok(profile.points)
    }

    async fn debit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError> {
        let mut state = self.lock()?;
        let profile = state.profile_mut(profile_id)?;
        if profile.points < amount {
            return Err(AppError::InsufficientBalance { required: amount, available: profile.points });
        }
        profile.points -= amount;
        profile.updated_at = Utc::now();
        Ok(profile.points)
    }

    // --- Depósitos ---

    async fn commit_deposit(&self, entry: DepositEntry) -> Result<CommittedDeposit, AppError> {
        let mut state = self.lock()?;

        let balance = state
            .profiles
            .get(&entry.user_id)
            .map(|p| p.points)
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))?;

        if let Some(key) = entry.idempotency_key.as_deref() {
            let existing = state
                .transactions
                .iter()
                .find(|t| t.user_id == entry.user_id && t.idempotency_key.as_deref() == Some(key));
            if let Some(transaction) = existing {
                return Ok(CommittedDeposit {
                    transaction: transaction.clone(),
                    new_balance: balance,
                    location: None,
                    replayed: true,
                });
            }
        }

        let location = match entry.location_id {
            Some(id) => {
                let location = state
                    .locations
                    .get(&id)
                    // No canal da empresa, local de outra empresa não existe
                    .filter(|l| entry.company_id.is_none() || l.company_id == entry.company_id)
                    .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;
                Some(location.accumulate(entry.weight_kg)?)
            }
            None => None,
        };
        let new_balance = credited(balance, entry.points_earned)?;

        // Daqui em diante nada falha
        let now = Utc::now();
        let transaction = WasteTransaction {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            location_id: entry.location_id,
            company_id: entry.company_id,
            waste_type: entry.waste_type,
            weight_kg: entry.weight_kg,
            is_valid: entry.is_valid,
            points_earned: entry.points_earned,
            idempotency_key: entry.idempotency_key,
            created_at: now,
        };
        state.transactions.push(transaction.clone());

        let profile = state.profile_mut(entry.user_id)?;
        profile.points = new_balance;
        profile.updated_at = now;

        if let Some(fill) = &location {
            if let Some(loc) = state.locations.get_mut(&fill.location_id) {
                loc.current_weight_kg = fill.current_weight_kg;
                loc.status = fill.status;
                loc.updated_at = now;
            }
        }

        Ok(CommittedDeposit { transaction, new_balance, location, replayed: false })
    }

    async fn list_transactions_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<WasteTransaction>, AppError> {
        let state = self.lock()?;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == profile_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn recent_transactions(&self, limit: i64) -> Result<Vec<AdminTransactionRow>, AppError> {
        let state = self.lock()?;
        Ok(state
            .transactions
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|t| {
                let (full_name, username) = state.owner_of(t.user_id);
                AdminTransactionRow {
                    id: t.id,
                    user_id: t.user_id,
                    full_name,
                    username,
                    location_id: t.location_id,
                    weight_kg: t.weight_kg,
                    is_valid: t.is_valid,
                    points_earned: t.points_earned,
                    created_at: t.created_at,
                }
            })
            .collect())
    }

    // --- Locais ---

    async fn create_location(&self, new_location: NewLocation) -> Result<Location, AppError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            company_id: new_location.company_id,
            name: new_location.name,
            address: new_location.address,
            latitude: new_location.latitude,
            longitude: new_location.longitude,
            capacity_kg: new_location.capacity_kg,
            current_weight_kg: Decimal::ZERO,
            status: LocationStatus::Available,
            created_at: now,
            updated_at: now,
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        Ok(self.lock()?.locations.get(&id).cloned())
    }

    async fn list_locations(&self, company_id: Option<Uuid>) -> Result<Vec<Location>, AppError> {
        let state = self.lock()?;
        let mut locations: Vec<Location> = state
            .locations
            .values()
            .filter(|l| company_id.is_none() || l.company_id == company_id)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn update_location(&self, id: Uuid, changes: LocationChanges) -> Result<Location, AppError> {
        let mut state = self.lock()?;
        let location = state
            .locations
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;
        changes.apply_to(location);
        location.updated_at = Utc::now();
        Ok(location.clone())
    }

    async fn delete_location(&self, id: Uuid) -> Result<(), AppError> {
        self.lock()?
            .locations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))
    }

    async fn accumulate(&self, location_id: Uuid, weight_kg: Decimal) -> Result<LocationState, AppError> {
        let mut state = self.lock()?;
        let location = state
            .locations
            .get_mut(&location_id)
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;
        let fill = location.accumulate(weight_kg)?;
        location.current_weight_kg = fill.current_weight_kg;
        location.status = fill.status;
        location.updated_at = Utc::now();
        Ok(fill)
    }

    // --- Saques ---

    async fn create_withdrawal(&self, new_withdrawal: NewWithdrawal) -> Result<WithdrawalReceipt, AppError> {
        let mut state = self.lock()?;

        let now = Utc::now();
        let profile = state.profile_mut(new_withdrawal.user_id)?;
        if profile.points < new_withdrawal.points_deducted {
            return Err(AppError::InsufficientBalance {
                required: new_withdrawal.points_deducted,
                available: profile.points,
            });
        }
        profile.points -= new_withdrawal.points_deducted;
        profile.updated_at = now;
        let new_balance = profile.points;

        let withdrawal = Withdrawal {
            id: Uuid::new_v4(),
            user_id: new_withdrawal.user_id,
            company_id: new_withdrawal.company_id,
            points_deducted: new_withdrawal.points_deducted,
            amount_naira: new_withdrawal.amount_naira,
            status: WithdrawalStatus::Pending,
            created_at: now,
            processed_at: None,
        };
        state.withdrawals.push(withdrawal.clone());

        Ok(WithdrawalReceipt { withdrawal, new_balance })
    }

    async fn resolve_withdrawal(&self, id: Uuid, outcome: WithdrawalOutcome) -> Result<Withdrawal, AppError> {
        let mut state = self.lock()?;
        let withdrawal = state
            .withdrawals
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| AppError::ResourceNotFound("withdrawal".into()))?;
        if !withdrawal.is_resolvable() {
            return Err(AppError::WithdrawalAlreadyResolved(id));
        }
        withdrawal.status = outcome.into();
        withdrawal.processed_at = Some(Utc::now());
        Ok(withdrawal.clone())
    }

    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>, AppError> {
        Ok(self.lock()?.withdrawals.iter().find(|w| w.id == id).cloned())
    }

    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
    ) -> Result<Vec<AdminWithdrawalRow>, AppError> {
        let state = self.lock()?;
        Ok(state
            .withdrawals
            .iter()
            .rev()
            .filter(|w| status.is_none_or(|s| w.status == s))
            .take(limit.max(0) as usize)
            .map(|w| {
                let (full_name, username) = state.owner_of(w.user_id);
                AdminWithdrawalRow {
                    id: w.id,
                    user_id: w.user_id,
                    full_name,
                    username,
                    amount_naira: w.amount_naira,
                    points_deducted: w.points_deducted,
                    status: w.status,
                    created_at: w.created_at,
                    processed_at: w.processed_at,
                }
            })
            .collect())
    }

    async fn list_withdrawals_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<Withdrawal>, AppError> {
        let state = self.lock()?;
        Ok(state
            .withdrawals
            .iter()
            .rev()
            .filter(|w| w.user_id == profile_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    // --- Empresas ---

    async fn insert_company(&self, new_company: NewCompany) -> Result<Company, AppError> {
        let mut state = self.lock()?;
        if state.companies.values().any(|c| c.company_slug == new_company.company_slug) {
            return Err(AppError::SlugTaken(new_company.company_slug));
        }

        let now = Utc::now();
        let company = Company {
            id: Uuid::new_v4(),
            owner_user_id: new_company.owner_user_id,
            name: new_company.name,
            email: new_company.email,
            phone: new_company.phone,
            address: new_company.address,
            contact_person: new_company.contact_person,
            description: new_company.description,
            registration_number: new_company.registration_number,
            company_slug: new_company.company_slug,
            points_per_kg: Decimal::from(crate::models::company::DEFAULT_COMPANY_POINTS_PER_KG),
            cash_reward_enabled: false,
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            welcome_message: None,
            min_withdrawal_amount: None,
            created_at: now,
            updated_at: now,
        };
        state.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.lock()?.companies.get(&id).cloned())
    }

    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        Ok(self.lock()?.companies.values().find(|c| c.company_slug == slug).cloned())
    }

    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let mut companies: Vec<Company> = self.lock()?.companies.values().cloned().collect();
        companies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(companies)
    }

    async fn update_company(&self, id: Uuid, settings: CompanySettings) -> Result<Company, AppError> {
        let mut state = self.lock()?;
        let company = state
            .companies
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound("company".into()))?;
        settings.apply_to(company);
        company.updated_at = Utc::now();
        Ok(company.clone())
    }

    async fn is_company_owner(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let state = self.lock()?;
        Ok(state
            .companies
            .get(&company_id)
            .is_some_and(|c| c.owner_user_id == Some(user_id)))
    }

    // --- Painel ---

    async fn admin_stats(&self) -> Result<AdminStats, AppError> {
        let state = self.lock()?;
        Ok(AdminStats {
            total_users: state.profiles.len() as i64,
            total_transactions: state.transactions.len() as i64,
            total_weight_kg: state.transactions.iter().map(|t| t.weight_kg).sum(),
            pending_withdrawals: state
                .withdrawals
                .iter()
                .filter(|w| w.status == WithdrawalStatus::Pending)
                .count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    async fn seeded(points: &str) -> (MemoryStore, Profile) {
        let store = MemoryStore::new();
        let profile = store.insert_profile(NewProfile::placeholder("HW-0001")).await.unwrap();
        store.credit(profile.id, d(points)).await.unwrap();
        (store, profile)
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

    #[tokio::test]
    async fn duplicate_unique_code_is_rejected() {
        let (store, _) = seeded("0").await;
        let err = store.insert_profile(NewProfile::placeholder("HW-0001")).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueCodeTaken(_)));
    }

    #[tokio::test]
    async fn debit_never_goes_negative() {
        let (store, profile) = seeded("40").await;

        let err = store.debit(profile.id, d("50")).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBalance { .. }));
        assert_eq!(store.find_profile(profile.id).await.unwrap().unwrap().points, d("40"));

        assert_eq!(store.debit(profile.id, d("40")).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn missing_location_leaves_no_partial_state() {
        let (store, profile) = seeded("0").await;

        let err = store
            .commit_deposit(entry(profile.id, Some(Uuid::new_v4()), None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(store.find_profile(profile.id).await.unwrap().unwrap().points, Decimal::ZERO);
        assert!(store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_idempotency_key_replays_without_effects() {
        let (store, profile) = seeded("0").await;

        let first = store.commit_deposit(entry(profile.id, None, Some("k-1"))).await.unwrap();
        let second = store.commit_deposit(entry(profile.id, None, Some("k-1"))).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.transaction.id, second.transaction.id);
        assert_eq!(second.new_balance, d("125"));
        assert_eq!(store.list_transactions_for(profile.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn withdrawal_resolves_only_once() {
        let (store, profile) = seeded("100").await;
        let receipt = store
            .create_withdrawal(NewWithdrawal {
                user_id: profile.id,
                company_id: None,
                points_deducted: d("50"),
                amount_naira: d("200"),
            })
            .await
            .unwrap();
        assert_eq!(receipt.new_balance, d("50"));

        let id = receipt.withdrawal.id;
        let done = store.resolve_withdrawal(id, WithdrawalOutcome::Failed).await.unwrap();
        assert_eq!(done.status, WithdrawalStatus::Failed);
        assert!(done.processed_at.is_some());

        let err = store.resolve_withdrawal(id, WithdrawalOutcome::Completed).await.unwrap_err();
        assert!(matches!(err, AppError::WithdrawalAlreadyResolved(_)));
        // Saque falho não devolve os pontos
        assert_eq!(store.find_profile(profile.id).await.unwrap().unwrap().points, d("50"));
    }

    #[tokio::test]
    async fn pending_filter_and_stats() {
        let (store, profile) = seeded("100").await;
        store
            .create_withdrawal(NewWithdrawal {
                user_id: profile.id,
                company_id: None,
                points_deducted: d("10"),
                amount_naira: d("40"),
            })
            .await
            .unwrap();
        store.commit_deposit(entry(profile.id, None, None)).await.unwrap();

        let pending = store.list_withdrawals(Some(WithdrawalStatus::Pending), 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].username, "user_HW-0001");
        assert!(store.list_withdrawals(Some(WithdrawalStatus::Completed), 10).await.unwrap().is_empty());

        let stats = store.admin_stats().await.unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_transactions, 1);
        assert_eq!(stats.total_weight_kg, d("2.5"));
        assert_eq!(stats.pending_withdrawals, 1);
    }

    #[tokio::test]
    async fn company_slug_is_unique() {
        let store = MemoryStore::new();
        let new_company = NewCompany {
            owner_user_id: Some(Uuid::new_v4()),
            name: "GreenCycle".into(),
            email: "ops@greencycle.ng".into(),
            phone: "0800".into(),
            address: "Lagos".into(),
            contact_person: "Ada".into(),
            description: None,
            registration_number: None,
            company_slug: "greencycle".into(),
        };
        let company = store.insert_company(new_company.clone()).await.unwrap();
        assert_eq!(company.points_per_kg, Decimal::from(10));
        assert!(!company.cash_reward_enabled);

        let err = store.insert_company(new_company.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::SlugTaken(_)));
        assert!(store.is_company_owner(new_company.owner_user_id.unwrap(), company.id).await.unwrap());
        assert!(!store.is_company_owner(Uuid::new_v4(), company.id).await.unwrap());
    }

    #[tokio::test]
    async fn company_deposit_ignores_locations_of_other_companies() {
        let (store, profile) = seeded("0").await;
        let bin = store
            .create_location(NewLocation {
                company_id: Some(Uuid::new_v4()),
                name: "Yaba Bin".into(),
                address: "Yaba".into(),
                latitude: None,
                longitude: None,
                capacity_kg: d("100"),
            })
            .await
            .unwrap();

        let mut deposit = entry(profile.id, Some(bin.id), None);
        deposit.company_id = Some(Uuid::new_v4());
        let err = store.commit_deposit(deposit).await.unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(store.find_profile(profile.id).await.unwrap().unwrap().points, Decimal::ZERO);
        assert_eq!(store.find_location(bin.id).await.unwrap().unwrap().current_weight_kg, Decimal::ZERO);
        assert!(store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn balance_overflow_is_rejected_without_changes() {
        let (store, profile) = seeded("0").await;
        store.credit(profile.id, Decimal::MAX).await.unwrap();

        let err = store.credit(profile.id, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = store.commit_deposit(entry(profile.id, None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.find_profile(profile.id).await.unwrap().unwrap().points, Decimal::MAX);
        assert!(store.list_transactions_for(profile.id, 10).await.unwrap().is_empty());
    }
}
