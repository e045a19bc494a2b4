// src/models/location.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "location_status", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum LocationStatus {
    Available,
    Full,
    Maintenance,
}

impl LocationStatus {
    /// Status recalculado a cada depósito atribuído ao local.
    ///
    /// Cheio quando o peso acumulado atinge a capacidade; caso contrário
    /// volta para `Available`, inclusive se um operador tinha marcado
    /// `Maintenance`. Toda a regra de recálculo mora aqui.
    pub fn after_accumulation(self, new_weight_kg: Decimal, capacity_kg: Decimal) -> LocationStatus {
        if new_weight_kg >= capacity_kg {
            LocationStatus::Full
        } else {
            LocationStatus::Available
        }
    }
}

// ---
// Location (o "Ponto de Coleta")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Location {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    #[schema(example = "Yaba Market Bin")]
    pub name: String,
    pub address: String,
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Decimal>,
    #[schema(value_type = f64, example = 500.0)]
    pub capacity_kg: Decimal,
    #[schema(value_type = f64, example = 120.5)]
    pub current_weight_kg: Decimal,
    pub status: LocationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Aplica um depósito ao local e devolve o novo estado.
    /// Não grava nada: quem persiste é o store, sob lock da linha.
    pub fn accumulate(&self, weight_kg: Decimal) -> Result<LocationState, AppError> {
        let current_weight_kg = self
            .current_weight_kg
            .checked_add(weight_kg)
            .ok_or_else(|| AppError::InvalidInput("weight_kg overflows the location fill level".into()))?;
        let status = self.status.after_accumulation(current_weight_kg, self.capacity_kg);
        Ok(LocationState {
            location_id: self.id,
            company_id: self.company_id,
            name: self.name.clone(),
            previous_status: self.status,
            status,
            current_weight_kg,
            capacity_kg: self.capacity_kg,
            became_full: self.status == LocationStatus::Available && status == LocationStatus::Full,
        })
    }
}

/// Resultado de `accumulate`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LocationState {
    pub location_id: Uuid,
    pub company_id: Option<Uuid>,
    pub name: String,
    pub previous_status: LocationStatus,
    pub status: LocationStatus,
    #[schema(value_type = f64)]
    pub current_weight_kg: Decimal,
    #[schema(value_type = f64)]
    pub capacity_kg: Decimal,
    // Transição available -> full (gatilho da notificação)
    pub became_full: bool,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub company_id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub capacity_kg: Decimal,
}

/// Alterações administrativas. O peso acumulado nunca passa por aqui.
#[derive(Debug, Clone, Default)]
pub struct LocationChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub capacity_kg: Option<Decimal>,
    pub status: Option<LocationStatus>,
}

impl LocationChanges {
    pub fn apply_to(&self, location: &mut Location) {
        if let Some(name) = &self.name {
            location.name = name.clone();
        }
        if let Some(address) = &self.address {
            location.address = address.clone();
        }
        if self.latitude.is_some() {
            location.latitude = self.latitude;
        }
        if self.longitude.is_some() {
            location.longitude = self.longitude;
        }
        if let Some(capacity) = self.capacity_kg {
            location.capacity_kg = capacity;
        }
        if let Some(status) = self.status {
            location.status = status;
        }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(required(message = "capacity_kg is required"))]
    #[schema(value_type = f64)]
    pub capacity_kg: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Decimal>,
    // Usado apenas pelo admin; a rota da empresa usa a empresa do contexto.
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLocationPayload {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "address cannot be empty"))]
    pub address: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub capacity_kg: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Decimal>,
    pub status: Option<LocationStatus>,
}

impl From<UpdateLocationPayload> for LocationChanges {
    fn from(p: UpdateLocationPayload) -> Self {
        Self {
            name: p.name,
            address: p.address,
            latitude: p.latitude,
            longitude: p.longitude,
            capacity_kg: p.capacity_kg,
            status: p.status,
        }
    }
}
