// src/services/identity_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::{
        dashboard::HistoryResponse,
        policy::RewardRules,
        profile::{
            CheckUserResponse, LeaderboardEntry, MeResponse, NewProfile, Profile, RegisterUserResponse,
            SignupPayload,
        },
    },
};

pub const HARDWARE_USER_CREATED: &str =
    "Hardware user created successfully. Complete registration online to access full features.";
pub const HARDWARE_USER_EXISTS: &str = "User already exists";

/// Tira espaços nas pontas; código vazio não é código.
pub(crate) fn normalize_code(raw: &str) -> Result<String, AppError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AppError::InvalidInput("unique_code is required".into()));
    }
    Ok(code.to_string())
}

// ---
// Diretório de identidade: código do hardware -> conta
// ---
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn RewardsStore>,
    rules: RewardRules,
}

impl IdentityService {
    pub fn new(store: Arc<dyn RewardsStore>, rules: RewardRules) -> Self {
        Self { store, rules }
    }

    /// Busca sem criar. Código desconhecido = `UnknownCode`.
    pub async fn lookup(&self, unique_code: &str) -> Result<Profile, AppError> {
        let code = normalize_code(unique_code)?;
        self.store
            .find_profile_by_code(&code)
            .await?
            .ok_or(AppError::UnknownCode(code))
    }

    /// Busca a conta do código ou cria o placeholder. O bool diz se criou.
    ///
    /// Duas chamadas simultâneas com o mesmo código novo: uma cria, a outra
    /// perde na constraint única e relê a conta criada.
    pub async fn resolve_or_create(&self, unique_code: &str) -> Result<(Profile, bool), AppError> {
        let code = normalize_code(unique_code)?;

        if let Some(profile) = self.store.find_profile_by_code(&code).await? {
            return Ok((profile, false));
        }

        match self.store.insert_profile(NewProfile::placeholder(&code)).await {
            Ok(profile) => {
                tracing::info!(profile_id = %profile.id, unique_code = %code, "Conta placeholder criada");
                Ok((profile, true))
            }
            Err(AppError::UniqueCodeTaken(_)) => {
                let profile = self
                    .store
                    .find_profile_by_code(&code)
                    .await?
                    .ok_or_else(|| AppError::Conflict(format!("unique code {code} is being created")))?;
                Ok((profile, false))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn check(&self, unique_code: &str) -> Result<CheckUserResponse, AppError> {
        let code = normalize_code(unique_code)?;
        let profile = self.store.find_profile_by_code(&code).await?;
        Ok(CheckUserResponse::from(profile))
    }

    /// Bootstrap do hardware. O bool diz se a conta foi criada agora.
    pub async fn register_hardware(&self, unique_code: &str) -> Result<(RegisterUserResponse, bool), AppError> {
        let (profile, created) = self.resolve_or_create(unique_code).await?;
        let message = if created { HARDWARE_USER_CREATED } else { HARDWARE_USER_EXISTS };

        Ok((
            RegisterUserResponse {
                success: true,
                user_id: profile.id,
                message: message.to_string(),
                is_registered: profile.is_registered,
            },
            created,
        ))
    }

    /// Cadastro self-service. O id vem do token; código já usado é conflito
    /// (não existe fusão com o placeholder).
    pub async fn signup(&self, user_id: Uuid, payload: SignupPayload) -> Result<Profile, AppError> {
        let unique_code = normalize_code(&payload.unique_code)?;

        if self.store.find_profile(user_id).await?.is_some() {
            return Err(AppError::Conflict(format!("profile {user_id} already exists")));
        }

        let profile = self
            .store
            .insert_profile(NewProfile {
                id: user_id,
                full_name: payload.full_name.trim().to_string(),
                username: payload.username.trim().to_string(),
                unique_code,
                is_registered: true,
            })
            .await?;

        tracing::info!(profile_id = %profile.id, "Conta registrada");
        Ok(profile)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<MeResponse, AppError> {
        let profile = self.profile(user_id).await?;
        let naira_balance = self
            .rules
            .withdrawal_for(None)
            .conversion
            .naira_for(profile.points)
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("saldo em naira não cabe num Decimal")))?;
        Ok(MeResponse { profile, naira_balance })
    }

    pub async fn history(&self, user_id: Uuid, limit: i64) -> Result<HistoryResponse, AppError> {
        self.profile(user_id).await?;
        Ok(HistoryResponse {
            transactions: self.store.list_transactions_for(user_id, limit).await?,
            withdrawals: self.store.list_withdrawals_for(user_id, limit).await?,
        })
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.store.leaderboard(limit).await
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        self.store
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("profile".into()))
    }
}
