// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation_on, error::AppError},
    models::company::{Company, NewCompany},
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new_company: &NewCompany) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (
                owner_user_id, name, email, phone, address, contact_person,
                description, registration_number, company_slug
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new_company.owner_user_id)
        .bind(&new_company.name)
        .bind(&new_company.email)
        .bind(&new_company.phone)
        .bind(&new_company.address)
        .bind(&new_company.contact_person)
        .bind(new_company.description.as_deref())
        .bind(new_company.registration_number.as_deref())
        .bind(&new_company.company_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation_on(&e, "company_slug") {
                return AppError::SlugTaken(new_company.company_slug.clone());
            }
            e.into()
        })
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE company_slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }

    /// Grava as configurações do painel. Slug e dono não mudam.
    pub async fn save<'e, E>(&self, executor: E, company: &Company) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = $2, phone = $3, address = $4, contact_person = $5,
                description = $6, points_per_kg = $7, cash_reward_enabled = $8,
                logo_url = $9, primary_color = $10, secondary_color = $11,
                welcome_message = $12, min_withdrawal_amount = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.phone)
        .bind(&company.address)
        .bind(&company.contact_person)
        .bind(company.description.as_deref())
        .bind(company.points_per_kg)
        .bind(company.cash_reward_enabled)
        .bind(company.logo_url.as_deref())
        .bind(company.primary_color.as_deref())
        .bind(company.secondary_color.as_deref())
        .bind(company.welcome_message.as_deref())
        .bind(company.min_withdrawal_amount)
        .fetch_one(executor)
        .await?;
        Ok(saved)
    }

    pub async fn is_owner(&self, user_id: Uuid, company_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1 AND owner_user_id = $2)",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
