use crate::models::{CurrentWater, DailyWaterLog};
use crate::storage::Store;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Mirrors `log` onto the user's `currentWater` in a detached task. The
/// request path never awaits the handle; failures are only logged.
pub fn spawn_current_water_sync(
    store: Arc<Store>,
    user_id: Uuid,
    log: &DailyWaterLog,
) -> JoinHandle<()> {
    let current = CurrentWater {
        date: log.date.clone(),
        count: log.count,
    };

    tokio::spawn(async move {
        match store.mirror_current_water(user_id, current).await {
            Ok(()) => debug!(%user_id, "mirrored current water onto user"),
            Err(err) => warn!(%user_id, error = %err, "failed to mirror current water onto user"),
        }
    })
}
