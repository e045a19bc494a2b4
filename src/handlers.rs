pub mod companies;
pub mod dashboard;
pub mod hardware;
pub mod health;
pub mod locations;
pub mod portal;
pub mod profiles;
pub mod withdrawals;
