//! Typed access to the four persisted records.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::models::{DiscoveryEntry, Favorite, Observation, Position};
use crate::store::KeyValueStore;

pub const POSITION_KEY: &str = "BIOQUARTIER_LAST_POS";
pub const FAVORITES_KEY: &str = "BIOQUARTIER_FAVORIS";
pub const RESULTS_KEY: &str = "BIOQUARTIER_LAST_RESULTS";
pub const DISCOVERIES_KEY: &str = "BIOQUARTIER_DEX";

/// JSON records over a key-value store. Every read goes to the store; nothing
/// is cached in memory here.
#[derive(Clone)]
pub struct Records {
    kv: Arc<dyn KeyValueStore>,
}

impl Records {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.kv.get(key).await? {
            None => Ok(T::default()),
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("Record {} is unreadable, treating it as empty: {}", key, e);
                    Ok(T::default())
                }
            },
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.kv.set(key, text).await
    }

    pub async fn position(&self) -> Result<Option<Position>> {
        self.load(POSITION_KEY).await
    }

    pub async fn set_position(&self, position: Position) -> Result<()> {
        self.save(POSITION_KEY, &position).await
    }

    pub async fn favorites(&self) -> Result<Vec<Favorite>> {
        self.load(FAVORITES_KEY).await
    }

    pub async fn set_favorites(&self, favorites: &[Favorite]) -> Result<()> {
        self.save(FAVORITES_KEY, favorites).await
    }

    pub async fn results(&self) -> Result<Vec<Observation>> {
        self.load(RESULTS_KEY).await
    }

    pub async fn set_results(&self, results: &[Observation]) -> Result<()> {
        self.save(RESULTS_KEY, results).await
    }

    pub async fn discoveries(&self) -> Result<Vec<DiscoveryEntry>> {
        self.load(DISCOVERIES_KEY).await
    }

    pub async fn set_discoveries(&self, entries: &[DiscoveryEntry]) -> Result<()> {
        self.save(DISCOVERIES_KEY, entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;

    fn records() -> (Records, Arc<MemoryKv>) {
        let kv = Arc::new(MemoryKv::new());
        (Records::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn test_absent_records_read_empty() {
        let (records, _) = records();
        assert!(records.position().await.unwrap().is_none());
        assert!(records.favorites().await.unwrap().is_empty());
        assert!(records.results().await.unwrap().is_empty());
        assert!(records.discoveries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_position_stored_as_plain_object() {
        let (records, kv) = records();
        records.set_position(Position::new(45.5, 4.25)).await.unwrap();

        let raw = kv.get(POSITION_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["lat"], 45.5);
        assert_eq!(json["lng"], 4.25);
        assert_eq!(records.position().await.unwrap(), Some(Position::new(45.5, 4.25)));
    }

    #[tokio::test]
    async fn test_favorites_written_by_older_clients_load() {
        let (records, kv) = records();
        kv.set(
            FAVORITES_KEY,
            r#"[{"id":12,"nom":"Mésange","image":"https://x/1.jpg"}]"#.into(),
        )
        .await
        .unwrap();

        let favorites = records.favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].nom, "Mésange");
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_empty() {
        let (records, kv) = records();
        kv.set(DISCOVERIES_KEY, "{not json".into()).await.unwrap();

        assert!(records.discoveries().await.unwrap().is_empty());
    }
}
