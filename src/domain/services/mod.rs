pub mod availability;
pub mod booking_service;
pub mod conflict;
pub mod earnings;
pub mod pricing;
pub mod refund_policy;
