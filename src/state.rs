use std::sync::Arc;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, ParkingRepository, PaymentGateway, PayoutRepository,
};
use crate::domain::services::booking_service::BookingService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub parking_repo: Arc<dyn ParkingRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payout_repo: Arc<dyn PayoutRepository>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    /// Wires the booking service on top of the given ports.
    pub fn new(
        config: Config,
        parking_repo: Arc<dyn ParkingRepository>,
        availability_repo: Arc<dyn AvailabilityRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        payout_repo: Arc<dyn PayoutRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            parking_repo.clone(),
            payment_gateway.clone(),
            config.policy.clone(),
        ));

        Self {
            config,
            parking_repo,
            availability_repo,
            booking_repo,
            payout_repo,
            payment_gateway,
            booking_service,
        }
    }
}
