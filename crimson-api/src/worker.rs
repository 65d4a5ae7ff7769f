use std::sync::Arc;

use chrono::Utc;
use crimson_core::repository::InventoryRepository;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Background sweep for lapsed reservations. Copies whose hold expired go
/// back to In Store so abandoned carts cannot strand inventory.
pub async fn start_reservation_sweeper(
    inventory: Arc<dyn InventoryRepository>,
    interval_seconds: u64,
) {
    info!(interval_seconds, "Reservation sweeper started");

    loop {
        sleep(Duration::from_secs(interval_seconds)).await;

        match inventory.release_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(released) => info!(released, "expired reservations released"),
            Err(e) => error!("Failed to sweep expired reservations: {}", e),
        }
    }
}
