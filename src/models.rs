pub mod auth;
pub mod company;
pub mod dashboard;
pub mod deposit;
pub mod location;
pub mod policy;
pub mod profile;
pub mod withdrawal;
