pub mod factory;
pub mod payment;
pub mod repositories;
