//! Image Repair Task
//!
//! Background task that periodically clears `hasImage` on discovery entries
//! whose photo is no longer in the image cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::entities::DiscoveryLog;

/// Spawns a background task that periodically reconciles the discovery log
/// with the image cache.
///
/// The first pass runs right away, then the task sleeps for the interval
/// between passes. A failed pass is logged and retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let repair_handle = spawn_repair_task(state.discoveries.clone(), 3600);
/// // Later, during shutdown:
/// repair_handle.abort();
/// ```
pub fn spawn_repair_task(discoveries: DiscoveryLog, repair_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(repair_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting image repair task with interval of {} seconds",
            repair_interval_secs
        );

        loop {
            match discoveries.repair_images().await {
                Ok(0) => debug!("Image repair: nothing to fix"),
                Ok(repaired) => info!("Image repair: fixed {} entries", repaired),
                Err(e) => error!("Image repair failed: {}", e),
            }

            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::cache::{ImageCache, ImageInput, MemoryCacheStorage};
    use crate::entities::NewDiscovery;
    use crate::store::{MemoryKv, Records};

    fn log() -> (DiscoveryLog, ImageCache) {
        let records = Records::new(Arc::new(MemoryKv::new()));
        let images = ImageCache::new(Arc::new(MemoryCacheStorage::new()));
        (DiscoveryLog::new(records, images.clone()), images)
    }

    #[tokio::test]
    async fn test_repair_task_clears_missing_images() {
        let (log, images) = log();
        let entry = log
            .add(NewDiscovery {
                nom: "Lierre".into(),
                nom_sci: "Hedera helix".into(),
                image: Some(ImageInput::Bytes(Bytes::from_static(b"photo"))),
            })
            .await
            .unwrap()
            .entry;
        images.delete(entry.id).await;

        let handle = spawn_repair_task(log.clone(), 3600);

        // The first pass runs immediately
        tokio::time::sleep(Duration::from_millis(200)).await;

        let entries = log.list().await.unwrap();
        assert!(!entries[0].has_image, "Missing image should be repaired");

        handle.abort();
    }

    #[tokio::test]
    async fn test_repair_task_can_be_aborted() {
        let (log, _) = log();

        let handle = spawn_repair_task(log, 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
