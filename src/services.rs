use std::sync::Arc;

use crate::{db::RewardsStore, models::policy::RewardRules};

pub mod company_service;
pub mod dashboard_service;
pub mod deposit_service;
pub mod identity_service;
pub mod ledger_service;
pub mod location_service;
pub mod notifier;
pub mod withdrawal_service;

#[cfg(test)]
pub(crate) mod testing;

use company_service::CompanyService;
use dashboard_service::DashboardService;
use deposit_service::DepositService;
use identity_service::IdentityService;
use ledger_service::LedgerService;
use location_service::LocationService;
use notifier::CapacityNotifier;
use withdrawal_service::WithdrawalService;

// --- Monta o gráfico de dependências dos serviços ---
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityService,
    pub ledger: LedgerService,
    pub deposits: DepositService,
    pub locations: LocationService,
    pub withdrawals: WithdrawalService,
    pub companies: CompanyService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(store: Arc<dyn RewardsStore>, rules: RewardRules, notifier: Arc<dyn CapacityNotifier>) -> Self {
        let identity = IdentityService::new(store.clone(), rules.clone());
        Self {
            ledger: LedgerService::new(store.clone()),
            deposits: DepositService::new(store.clone(), identity.clone(), rules.clone(), notifier.clone()),
            locations: LocationService::new(store.clone(), notifier),
            withdrawals: WithdrawalService::new(store.clone(), rules.clone()),
            companies: CompanyService::new(store.clone(), rules),
            dashboard: DashboardService::new(store),
            identity,
        }
    }
}
