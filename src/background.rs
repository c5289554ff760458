use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, Instrument};
use crate::state::AppState;

/// Periodically releases pending bookings whose payment hold has lapsed.
/// Availability never depends on this running; it only keeps stored status
/// in line with what readers already compute.
pub async fn start_background_worker(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.expiry_sweep_interval_secs.max(1));
    info!("Starting pending-expiry worker (every {:?})...", interval);

    loop {
        let span = info_span!("pending_expiry_sweep");
        async {
            match state.booking_service.sweep_expired(Utc::now()).await {
                Ok(0) => debug!("No stale pending bookings"),
                Ok(count) => info!("Expired {} stale pending bookings", count),
                Err(e) => error!("Pending-expiry sweep failed: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(interval).await;
    }
}
