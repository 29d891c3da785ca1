//! Cache Garbage Collector
//!
//! Purges every partition left behind by earlier deploys.

use tracing::info;

use crate::cache::{CacheStorage, USER_IMAGE_PARTITION};
use crate::error::Result;

/// Deletes every partition except `current_version` and the user-image
/// partition, returning the names that were purged.
///
/// Only call this after confirming `current_version` was not cached before
/// the install began; another open client may still be using a partition of
/// the same version.
pub async fn collect_stale(storage: &dyn CacheStorage, current_version: &str) -> Result<Vec<String>> {
    let mut purged = Vec::new();

    for name in storage.keys().await? {
        if name == current_version || name == USER_IMAGE_PARTITION {
            continue;
        }
        info!("Deleting stale cache partition {}", name);
        if storage.delete(&name).await? {
            purged.push(name);
        }
    }

    Ok(purged)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStorage, StoredResponse};

    async fn storage_with(names: &[&str]) -> MemoryCacheStorage {
        let storage = MemoryCacheStorage::new();
        for name in names {
            storage
                .put(name, "/", StoredResponse::ok("text/html", "x"))
                .await
                .unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_keeps_current_and_user_images() {
        let storage = storage_with(&["v1", "v2", USER_IMAGE_PARTITION, "v3"]).await;

        let purged = collect_stale(&storage, "v3").await.unwrap();

        assert_eq!(purged, vec!["v1", "v2"]);
        assert_eq!(storage.keys().await.unwrap(), vec![USER_IMAGE_PARTITION, "v3"]);
    }

    #[tokio::test]
    async fn test_nothing_to_purge() {
        let storage = storage_with(&["v3"]).await;

        let purged = collect_stale(&storage, "v3").await.unwrap();

        assert!(purged.is_empty());
        assert_eq!(storage.keys().await.unwrap(), vec!["v3"]);
    }

    #[tokio::test]
    async fn test_purges_unrelated_names() {
        let storage = storage_with(&["scratch", "bioquartier-user-images-old"]).await;

        let purged = collect_stale(&storage, "v1").await.unwrap();

        assert_eq!(purged.len(), 2);
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
