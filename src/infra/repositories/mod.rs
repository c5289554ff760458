pub(crate) mod rows;

pub mod sqlite_availability_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_parking_repo;
pub mod sqlite_payout_repo;

pub mod postgres_availability_repo;
pub mod postgres_booking_repo;
pub mod postgres_parking_repo;
pub mod postgres_payout_repo;
