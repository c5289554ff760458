pub mod availability;
pub mod booking;
pub mod health;
pub mod owner;
pub mod parking;
pub mod payment;
