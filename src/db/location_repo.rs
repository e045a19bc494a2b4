// src/db/location_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::location::{Location, LocationState, NewLocation},
};

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn find(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    /// `None` lista todos; `Some` filtra pela empresa.
    pub async fn list(&self, company_id: Option<Uuid>) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE ($1::uuid IS NULL OR company_id = $1)
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    /// Lê o local travando a linha até o fim da transação.
    /// Depósitos simultâneos no mesmo local ficam em fila aqui.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(location)
    }

    // ---
    // Escritas
    // ---

    pub async fn insert(&self, new_location: &NewLocation) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (company_id, name, address, latitude, longitude, capacity_kg)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_location.company_id)
        .bind(&new_location.name)
        .bind(&new_location.address)
        .bind(new_location.latitude)
        .bind(new_location.longitude)
        .bind(new_location.capacity_kg)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    /// Grava os campos administrativos. Peso acumulado fica de fora.
    pub async fn save<'e, E>(&self, executor: E, location: &Location) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = $2, address = $3, latitude = $4, longitude = $5,
                capacity_kg = $6, status = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(&location.address)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.capacity_kg)
        .bind(location.status)
        .fetch_one(executor)
        .await?;
        Ok(saved)
    }

    /// Grava peso e status calculados por `Location::accumulate`.
    pub async fn write_fill_state<'e, E>(&self, executor: E, state: &LocationState) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE locations
            SET current_weight_kg = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(state.location_id)
        .bind(state.current_weight_kg)
        .bind(state.status)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// `false` se o local não existia.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
