pub mod store;
pub use store::RewardsStore;

pub mod profile_repo;
pub use profile_repo::ProfileRepository;
pub mod transaction_repo;
pub use transaction_repo::TransactionRepository;
pub mod location_repo;
pub use location_repo::LocationRepository;
pub mod withdrawal_repo;
pub use withdrawal_repo::WithdrawalRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;

pub mod pg_store;
pub use pg_store::PgStore;
pub mod memory_store;
pub use memory_store::MemoryStore;
