// src/services/company_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::{
        company::{slugify, Company, CompanySettings, NewCompany, PortalView, RegisterCompanyPayload},
        policy::RewardRules,
    },
    services::ledger_service::LedgerService,
};

// Tentativas de sufixo (-2, -3, ...) antes de desistir do slug
const MAX_SLUG_ATTEMPTS: u32 = 50;

#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn RewardsStore>,
    rules: RewardRules,
}

impl CompanyService {
    pub fn new(store: Arc<dyn RewardsStore>, rules: RewardRules) -> Self {
        Self { store, rules }
    }

    /// Registro de empresa. `owner == None` quando quem registra é o admin.
    /// O slug sai do nome; em colisão ganha sufixo numérico.
    pub async fn register(&self, owner: Option<Uuid>, payload: RegisterCompanyPayload) -> Result<Company, AppError> {
        let base = slugify(&payload.name);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let company_slug = if attempt == 1 { base.clone() } else { format!("{base}-{attempt}") };
            let new_company = NewCompany {
                owner_user_id: owner,
                name: payload.name.trim().to_string(),
                email: payload.email.trim().to_string(),
                phone: payload.phone.trim().to_string(),
                address: payload.address.trim().to_string(),
                contact_person: payload.contact_person.trim().to_string(),
                description: payload.description.clone(),
                registration_number: payload.registration_number.clone(),
                company_slug,
            };

            match self.store.insert_company(new_company).await {
                Ok(company) => {
                    tracing::info!(
                        company_id = %company.id,
                        slug = %company.company_slug,
                        owner = ?company.owner_user_id,
                        "Empresa registrada"
                    );
                    return Ok(company);
                }
                Err(AppError::SlugTaken(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::SlugTaken(base))
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        self.store.list_companies().await
    }

    pub async fn get(&self, company_id: Uuid) -> Result<Company, AppError> {
        self.store
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("company".into()))
    }

    pub async fn update_settings(&self, company_id: Uuid, settings: CompanySettings) -> Result<Company, AppError> {
        if let Some(rate) = settings.points_per_kg {
            LedgerService::check_amount("points_per_kg", rate)?;
        }
        if let Some(minimum) = settings.min_withdrawal_amount {
            LedgerService::check_amount("min_withdrawal_amount", minimum)?;
        }

        let company = self.store.update_company(company_id, settings).await?;
        tracing::info!(
            %company_id,
            points_per_kg = %company.points_per_kg,
            cash_reward_enabled = company.cash_reward_enabled,
            "Configurações da empresa atualizadas"
        );
        Ok(company)
    }

    /// Empresa pelo slug, sem checar o portal (canal de depósito).
    pub async fn by_slug(&self, slug: &str) -> Result<Company, AppError> {
        self.store
            .find_company_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("company".into()))
    }

    /// Empresa pelo slug, exigindo o portal de recompensas ativo.
    pub async fn portal_company(&self, slug: &str) -> Result<Company, AppError> {
        let company = self.by_slug(slug).await?;
        if !company.cash_reward_enabled {
            return Err(AppError::PortalDisabled);
        }
        Ok(company)
    }

    pub async fn portal(&self, slug: &str) -> Result<PortalView, AppError> {
        let company = self.portal_company(slug).await?;
        let min_withdrawal_amount = self.rules.withdrawal_for(Some(&company)).minimum_naira;

        Ok(PortalView {
            name: company.name,
            company_slug: company.company_slug,
            logo_url: company.logo_url,
            primary_color: company.primary_color,
            secondary_color: company.secondary_color,
            welcome_message: company.welcome_message,
            points_per_kg: company.points_per_kg,
            min_withdrawal_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{company_payload, d, Fixture};

    #[tokio::test]
    async fn slug_collisions_get_numeric_suffixes() {
        let fx = Fixture::new();

        let a = fx.companies.register(Some(Uuid::new_v4()), company_payload("Green Cycle")).await.unwrap();
        let b = fx.companies.register(Some(Uuid::new_v4()), company_payload("Green  Cycle!")).await.unwrap();
        let c = fx.companies.register(None, company_payload("green cycle")).await.unwrap();

        assert_eq!(a.company_slug, "green-cycle");
        assert_eq!(b.company_slug, "green-cycle-2");
        assert_eq!(c.company_slug, "green-cycle-3");
        assert_eq!(c.owner_user_id, None);
        assert_eq!(a.points_per_kg, Decimal::from(10));
        assert_eq!(fx.companies.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn portal_requires_cash_rewards() {
        let fx = Fixture::new();
        let company = fx.company("Portal Co").await;

        assert!(matches!(fx.companies.portal("portal-co").await, Err(AppError::PortalDisabled)));
        assert!(fx.companies.by_slug("portal-co").await.is_ok());
        assert!(matches!(fx.companies.portal("nope").await, Err(AppError::ResourceNotFound(_))));

        let settings = CompanySettings {
            cash_reward_enabled: Some(true),
            welcome_message: Some("Bem-vindo".into()),
            ..Default::default()
        };
        fx.companies.update_settings(company.id, settings).await.unwrap();

        let view = fx.companies.portal("portal-co").await.unwrap();
        assert_eq!(view.welcome_message.as_deref(), Some("Bem-vindo"));
        assert_eq!(view.min_withdrawal_amount, d("1000"));
    }

    #[tokio::test]
    async fn settings_reject_negative_numbers() {
        let fx = Fixture::new();
        let company = fx.company("Strict Co").await;

        let negative_rate = CompanySettings { points_per_kg: Some(d("-1")), ..Default::default() };
        assert!(matches!(
            fx.companies.update_settings(company.id, negative_rate).await,
            Err(AppError::InvalidInput(_))
        ));

        let negative_min = CompanySettings { min_withdrawal_amount: Some(d("-5")), ..Default::default() };
        assert!(matches!(
            fx.companies.update_settings(company.id, negative_min).await,
            Err(AppError::InvalidInput(_))
        ));

        let rate = CompanySettings { points_per_kg: Some(d("12.5")), ..Default::default() };
        let updated = fx.companies.update_settings(company.id, rate).await.unwrap();
        assert_eq!(updated.points_per_kg, d("12.5"));
        assert_eq!(updated.name, "Strict Co");
    }
}
