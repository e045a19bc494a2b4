// src/services/location_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RewardsStore,
    models::location::{CreateLocationPayload, Location, LocationChanges, LocationState, NewLocation},
    services::{ledger_service::LedgerService, notifier::CapacityNotifier},
};

fn check_capacity(capacity_kg: Decimal) -> Result<(), AppError> {
    if capacity_kg <= Decimal::ZERO {
        return Err(AppError::InvalidInput("capacity_kg must be greater than 0".into()));
    }
    Ok(())
}

// ---
// Pontos de coleta e o rastreador de capacidade
// ---
// `scope`: `None` = admin (qualquer local); `Some(company)` = só os locais
// daquela empresa. Local de outra empresa responde como inexistente.
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn RewardsStore>,
    notifier: Arc<dyn CapacityNotifier>,
}

impl LocationService {
    pub fn new(store: Arc<dyn RewardsStore>, notifier: Arc<dyn CapacityNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn list(&self, company_id: Option<Uuid>) -> Result<Vec<Location>, AppError> {
        self.store.list_locations(company_id).await
    }

    pub async fn create(&self, payload: CreateLocationPayload, scope: Option<Uuid>) -> Result<Location, AppError> {
        let capacity_kg = payload
            .capacity_kg
            .ok_or_else(|| AppError::InvalidInput("capacity_kg is required".into()))?;
        check_capacity(capacity_kg)?;

        let company_id = match scope {
            Some(company_id) => Some(company_id),
            None => payload.company_id,
        };
        if let Some(company_id) = company_id {
            if self.store.find_company(company_id).await?.is_none() {
                return Err(AppError::ResourceNotFound("company".into()));
            }
        }

        let location = self
            .store
            .create_location(NewLocation {
                company_id,
                name: payload.name.trim().to_string(),
                address: payload.address.trim().to_string(),
                latitude: payload.latitude,
                longitude: payload.longitude,
                capacity_kg,
            })
            .await?;

        tracing::info!(location_id = %location.id, company_id = ?location.company_id, "Local de coleta criado");
        Ok(location)
    }

    pub async fn update(&self, id: Uuid, changes: LocationChanges, scope: Option<Uuid>) -> Result<Location, AppError> {
        if let Some(capacity_kg) = changes.capacity_kg {
            check_capacity(capacity_kg)?;
        }
        self.find_in_scope(id, scope).await?;

        let location = self.store.update_location(id, changes).await?;
        tracing::info!(location_id = %location.id, status = ?location.status, "Local de coleta atualizado");
        Ok(location)
    }

    pub async fn delete(&self, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        self.find_in_scope(id, scope).await?;
        self.store.delete_location(id).await?;
        tracing::info!(location_id = %id, "Local de coleta removido");
        Ok(())
    }

    /// Soma o peso ao local e recalcula o status sob lock da linha.
    pub async fn accumulate(&self, location_id: Uuid, weight_kg: Decimal) -> Result<LocationState, AppError> {
        LedgerService::check_amount("weight_kg", weight_kg)?;

        let state = self.store.accumulate(location_id, weight_kg).await?;
        if state.became_full {
            self.notifier.notify_full(&state);
        }
        Ok(state)
    }

    async fn find_in_scope(&self, id: Uuid, scope: Option<Uuid>) -> Result<Location, AppError> {
        let location = self
            .store
            .find_location(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("location".into()))?;

        match scope {
            Some(company_id) if location.company_id != Some(company_id) => {
                Err(AppError::ResourceNotFound("location".into()))
            }
            _ => Ok(location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::location::LocationStatus,
        services::testing::{d, Fixture},
    };

    fn payload(capacity: Option<&str>) -> CreateLocationPayload {
        CreateLocationPayload {
            name: " Yaba Market ".into(),
            address: "Yaba, Lagos".into(),
            capacity_kg: capacity.map(d),
            latitude: None,
            longitude: None,
            company_id: None,
        }
    }

    #[tokio::test]
    async fn capacity_must_be_positive() {
        let fx = Fixture::new();
        assert!(matches!(fx.locations.create(payload(Some("0")), None).await, Err(AppError::InvalidInput(_))));
        assert!(matches!(fx.locations.create(payload(None), None).await, Err(AppError::InvalidInput(_))));

        let created = fx.locations.create(payload(Some("50")), None).await.unwrap();
        assert_eq!(created.name, "Yaba Market");
        assert_eq!(created.status, LocationStatus::Available);
    }

    #[tokio::test]
    async fn accumulate_sums_in_any_order() {
        let fx = Fixture::new();
        let location = fx.location(None, "10").await;

        for w in ["4", "2.5", "0", "3.5"] {
            fx.locations.accumulate(location.id, d(w)).await.unwrap();
        }

        let stored = fx.store.find_location(location.id).await.unwrap().unwrap();
        assert_eq!(stored.current_weight_kg, d("10"));
        assert_eq!(stored.status, LocationStatus::Full);
        assert_eq!(fx.notified(), vec![location.id]);
    }

    #[tokio::test]
    async fn concurrent_accumulation_loses_nothing() {
        let fx = Fixture::new();
        let location = fx.location(None, "1000").await;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = fx.locations.clone();
                tokio::spawn(async move { service.accumulate(location.id, d("1.5")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = fx.store.find_location(location.id).await.unwrap().unwrap();
        assert_eq!(stored.current_weight_kg, d("30"));
    }

    #[tokio::test]
    async fn accumulate_overwrites_maintenance() {
        let fx = Fixture::new();
        let location = fx.location(None, "10").await;
        let changes = LocationChanges { status: Some(LocationStatus::Maintenance), ..Default::default() };
        fx.locations.update(location.id, changes, None).await.unwrap();

        let state = fx.locations.accumulate(location.id, Decimal::ZERO).await.unwrap();

        assert_eq!(state.previous_status, LocationStatus::Maintenance);
        assert_eq!(state.status, LocationStatus::Available);
    }

    #[tokio::test]
    async fn company_scope_hides_foreign_locations() {
        let fx = Fixture::new();
        let company = fx.company("Scoped Co").await;
        let own = fx.location(Some(company.id), "10").await;
        let foreign = fx.location(None, "10").await;

        let rename = || LocationChanges { name: Some("Renamed".into()), ..Default::default() };
        assert!(fx.locations.update(own.id, rename(), Some(company.id)).await.is_ok());
        assert!(matches!(
            fx.locations.update(foreign.id, rename(), Some(company.id)).await,
            Err(AppError::ResourceNotFound(_))
        ));
        assert!(matches!(
            fx.locations.delete(foreign.id, Some(company.id)).await,
            Err(AppError::ResourceNotFound(_))
        ));

        assert_eq!(fx.locations.list(Some(company.id)).await.unwrap().len(), 1);
        assert_eq!(fx.locations.list(None).await.unwrap().len(), 2);

        fx.locations.delete(own.id, Some(company.id)).await.unwrap();
        assert!(fx.locations.list(Some(company.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updates_never_touch_accumulated_weight() {
        let fx = Fixture::new();
        let location = fx.location(None, "10").await;
        fx.locations.accumulate(location.id, d("4")).await.unwrap();

        let changes = LocationChanges { capacity_kg: Some(d("20")), ..Default::default() };
        let updated = fx.locations.update(location.id, changes, None).await.unwrap();

        assert_eq!(updated.current_weight_kg, d("4"));
        assert_eq!(updated.capacity_kg, d("20"));

        let bad = LocationChanges { capacity_kg: Some(d("-1")), ..Default::default() };
        assert!(matches!(fx.locations.update(location.id, bad, None).await, Err(AppError::InvalidInput(_))));
    }
}
