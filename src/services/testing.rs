// src/services/testing.rs

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db::{MemoryStore, RewardsStore},
    models::{
        company::{Company, CompanySettings, RegisterCompanyPayload},
        deposit::DepositPayload,
        location::{CreateLocationPayload, Location, LocationState},
        policy::RewardRules,
        profile::Profile,
    },
    services::{notifier::CapacityNotifier, Services},
};

pub(crate) fn d(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

pub(crate) fn deposit(code: &str, weight: &str) -> DepositPayload {
    DepositPayload {
        unique_code: Some(code.to_string()),
        weight_kg: Some(d(weight)),
        location_id: None,
        waste_type: None,
        idempotency_key: None,
    }
}

pub(crate) fn company_payload(name: &str) -> RegisterCompanyPayload {
    RegisterCompanyPayload {
        name: name.to_string(),
        email: "ops@example.ng".to_string(),
        phone: "+234 800 000 0000".to_string(),
        address: "Ikeja, Lagos".to_string(),
        contact_person: "Chidi".to_string(),
        description: None,
        registration_number: None,
    }
}

/// Guarda os locais avisados, na ordem.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    full: Mutex<Vec<Uuid>>,
}

impl CapacityNotifier for RecordingNotifier {
    fn notify_full(&self, location: &LocationState) {
        self.full.lock().expect("notifier lock").push(location.location_id);
    }
}

/// Serviços montados sobre um `MemoryStore` novo.
pub(crate) struct Fixture {
    pub store: Arc<dyn RewardsStore>,
    pub services: Services,
    pub notifier: Arc<RecordingNotifier>,
}

impl std::ops::Deref for Fixture {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}

impl Fixture {
    pub fn new() -> Self {
        let store: Arc<dyn RewardsStore> = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let services = Services::new(store.clone(), RewardRules::default(), notifier.clone());
        Self { store, services, notifier }
    }

    pub async fn profile(&self, code: &str) -> Profile {
        self.identity.resolve_or_create(code).await.expect("profile").0
    }

    pub async fn funded(&self, code: &str, points: &str) -> Profile {
        let profile = self.profile(code).await;
        self.ledger.credit(profile.id, d(points)).await.expect("credit");
        profile
    }

    pub async fn company(&self, name: &str) -> Company {
        self.companies
            .register(Some(Uuid::new_v4()), company_payload(name))
            .await
            .expect("company")
    }

    /// Empresa com o portal de recompensas ligado.
    pub async fn portal_company(&self, name: &str, min_withdrawal: Option<&str>) -> Company {
        let company = self.company(name).await;
        let settings = CompanySettings {
            cash_reward_enabled: Some(true),
            min_withdrawal_amount: min_withdrawal.map(d),
            ..Default::default()
        };
        self.companies.update_settings(company.id, settings).await.expect("settings")
    }

    pub async fn location(&self, company_id: Option<Uuid>, capacity: &str) -> Location {
        let payload = CreateLocationPayload {
            name: "Bin".to_string(),
            address: "Surulere, Lagos".to_string(),
            capacity_kg: Some(d(capacity)),
            latitude: None,
            longitude: None,
            company_id,
        };
        self.locations.create(payload, None).await.expect("location")
    }

    pub fn notified(&self) -> Vec<Uuid> {
        self.notifier.full.lock().expect("notifier lock").clone()
    }
}
