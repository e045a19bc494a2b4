// src/db/store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        company::{Company, CompanySettings, NewCompany},
        dashboard::{AdminStats, AdminTransactionRow, AdminWithdrawalRow},
        deposit::{CommittedDeposit, DepositEntry, WasteTransaction},
        location::{Location, LocationChanges, LocationState, NewLocation},
        profile::{LeaderboardEntry, NewProfile, Profile},
        withdrawal::{NewWithdrawal, Withdrawal, WithdrawalOutcome, WithdrawalReceipt, WithdrawalStatus},
    },
};

/// Tudo o que os serviços pedem ao armazenamento.
///
/// Cada método é uma unidade atômica: ou grava tudo, ou nada. Saldo
/// (`profiles.points`) e estado do local (`current_weight_kg`, `status`)
/// só são escritos por `credit`/`debit`, `accumulate` e pelas unidades
/// compostas (`commit_deposit`, `create_withdrawal`), sempre com a linha
/// serializada (lock de linha ou update condicional).
///
/// Implementações: `PgStore` (produção) e `MemoryStore` (testes e
/// desenvolvimento local).
#[async_trait]
pub trait RewardsStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // --- Diretório de identidade ---

    async fn find_profile_by_code(&self, unique_code: &str) -> Result<Option<Profile>, AppError>;
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError>;
    /// Falha com `UniqueCodeTaken` se o código já pertence a alguém.
    async fn insert_profile(&self, new_profile: NewProfile) -> Result<Profile, AppError>;
    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError>;

    // --- Ledger ---

    async fn credit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError>;
    /// Falha com `InsufficientBalance` sem alterar nada se o saldo não cobre.
    async fn debit(&self, profile_id: Uuid, amount: Decimal) -> Result<Decimal, AppError>;

    // --- Depósitos ---

    /// Transação + crédito + acúmulo no local, numa única unidade.
    async fn commit_deposit(&self, entry: DepositEntry) -> Result<CommittedDeposit, AppError>;
    async fn list_transactions_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<WasteTransaction>, AppError>;
    async fn recent_transactions(&self, limit: i64) -> Result<Vec<AdminTransactionRow>, AppError>;

    // --- Locais ---

    async fn create_location(&self, new_location: NewLocation) -> Result<Location, AppError>;
    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError>;
    async fn list_locations(&self, company_id: Option<Uuid>) -> Result<Vec<Location>, AppError>;
    async fn update_location(&self, id: Uuid, changes: LocationChanges) -> Result<Location, AppError>;
    async fn delete_location(&self, id: Uuid) -> Result<(), AppError>;
    async fn accumulate(&self, location_id: Uuid, weight_kg: Decimal) -> Result<LocationState, AppError>;

    // --- Saques ---

    /// Debita os pontos e cria o saque `pending` na mesma unidade.
    async fn create_withdrawal(&self, new_withdrawal: NewWithdrawal) -> Result<WithdrawalReceipt, AppError>;
    /// Só sai de `pending`; qualquer outro estado é `WithdrawalAlreadyResolved`.
    async fn resolve_withdrawal(&self, id: Uuid, outcome: WithdrawalOutcome) -> Result<Withdrawal, AppError>;
    async fn find_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>, AppError>;
    async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
        limit: i64,
    ) -> Result<Vec<AdminWithdrawalRow>, AppError>;
    async fn list_withdrawals_for(&self, profile_id: Uuid, limit: i64) -> Result<Vec<Withdrawal>, AppError>;

    // --- Empresas ---

    /// Falha com `SlugTaken` se o slug já existe.
    async fn insert_company(&self, new_company: NewCompany) -> Result<Company, AppError>;
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;
    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError>;
    async fn list_companies(&self) -> Result<Vec<Company>, AppError>;
    async fn update_company(&self, id: Uuid, settings: CompanySettings) -> Result<Company, AppError>;
    async fn is_company_owner(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError>;

    // --- Painel ---

    async fn admin_stats(&self) -> Result<AdminStats, AppError>;
}
