// src/db/profile_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation_on, error::AppError},
    models::profile::{LeaderboardEntry, NewProfile, Profile},
};

// O repositório de profiles: identidade e o saldo de pontos.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras simples (usam a pool principal)
    // ---

    pub async fn find_by_code(&self, unique_code: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE unique_code = $1")
            .bind(unique_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT id, username, full_name, points
            FROM profiles
            ORDER BY points DESC, created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // Cria um novo profile. Saldo sempre começa em zero.
    pub async fn insert(&self, new_profile: &NewProfile) -> Result<Profile, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, full_name, username, unique_code, points, is_registered)
            VALUES ($1, $2, $3, $4, 0, $5)
            RETURNING *
            "#,
        )
        .bind(new_profile.id)
        .bind(&new_profile.full_name)
        .bind(&new_profile.username)
        .bind(&new_profile.unique_code)
        .bind(new_profile.is_registered)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte a violação de chave única num erro de domínio
            if unique_violation_on(&e, "unique_code") {
                return AppError::UniqueCodeTaken(new_profile.unique_code.clone());
            }
            if unique_violation_on(&e, "pkey") {
                return AppError::Conflict(format!("profile {} already exists", new_profile.id));
            }
            e.into()
        })
    }

    // ---
    // Funções do Ledger (rodam dentro de uma transação)
    // ---

    /// Soma ao saldo de forma atômica. `None` se o profile não existe.
    pub async fn credit<'e, E>(
        &self,
        executor: E,
        profile_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE profiles
            SET points = points + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING points
            "#,
        )
        .bind(profile_id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Débito condicional: só subtrai se `points >= amount`.
    /// É um único UPDATE, então não existe janela entre ler e gravar.
    /// `None` = saldo insuficiente ou profile inexistente.
    pub async fn try_debit<'e, E>(
        &self,
        executor: E,
        profile_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE profiles
            SET points = points - $2, updated_at = NOW()
            WHERE id = $1 AND points >= $2
            RETURNING points
            "#,
        )
        .bind(profile_id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    pub async fn get_points<'e, E>(&self, executor: E, profile_id: Uuid) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let points = sqlx::query_scalar::<_, Decimal>("SELECT points FROM profiles WHERE id = $1")
            .bind(profile_id)
            .fetch_optional(executor)
            .await?;
        Ok(points)
    }
}
