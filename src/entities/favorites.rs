//! Favorites Manager
//!
//! Starred observations, at most one per observation id, in insertion order.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{Favorite, Observation};
use crate::store::Records;

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggled {
    pub id: u64,
    /// True if the observation is a favorite after the call
    pub favorite: bool,
}

#[derive(Clone)]
pub struct Favorites {
    records: Records,
}

impl Favorites {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn list(&self) -> Result<Vec<Favorite>> {
        self.records.favorites().await
    }

    pub async fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.list().await?.iter().any(|fav| fav.id == id))
    }

    // == Toggle ==
    /// Adds the observation if absent, removes it if present.
    pub async fn toggle(&self, observation: &Observation) -> Result<Toggled> {
        let mut favorites = self.records.favorites().await?;

        let favorite = match favorites.iter().position(|fav| fav.id == observation.id) {
            Some(index) => {
                favorites.remove(index);
                info!("Removed favorite {}", observation.id);
                false
            }
            None => {
                favorites.push(Favorite::from(observation));
                info!("Added favorite {}", observation.id);
                true
            }
        };

        self.records.set_favorites(&favorites).await?;
        Ok(Toggled {
            id: observation.id,
            favorite,
        })
    }

    /// Toggles an observation picked from the last stored search results.
    pub async fn toggle_from_results(&self, id: u64) -> Result<Toggled> {
        let results = self.records.results().await?;
        let observation = results
            .iter()
            .find(|obs| obs.id == id)
            .ok_or_else(|| AppError::NotFound(format!("observation {} not in last results", id)))?;
        self.toggle(observation).await
    }

    // == Remove ==
    /// Removes by id. Returns false if the id was not a favorite.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        let mut favorites = self.records.favorites().await?;
        let before = favorites.len();
        favorites.retain(|fav| fav.id != id);

        if favorites.len() == before {
            debug!("Favorite {} already absent", id);
            return Ok(false);
        }
        self.records.set_favorites(&favorites).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;
    use std::sync::Arc;

    fn observation(id: u64, name: &str) -> Observation {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "taxon": {"name": name},
            "photos": [{"url": format!("https://img/{}.jpg", id)}]
        }))
        .unwrap()
    }

    fn favorites() -> (Favorites, Records) {
        let records = Records::new(Arc::new(MemoryKv::new()));
        (Favorites::new(records.clone()), records)
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_list() {
        let (favorites, _) = favorites();
        favorites.toggle(&observation(1, "a")).await.unwrap();
        let before = favorites.list().await.unwrap();

        let first = favorites.toggle(&observation(2, "b")).await.unwrap();
        let second = favorites.toggle(&observation(2, "b")).await.unwrap();

        assert!(first.favorite);
        assert!(!second.favorite);
        assert_eq!(favorites.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_toggle_from_results() {
        let (favorites, records) = favorites();
        records.set_results(&[observation(1, "Bellis perennis")]).await.unwrap();

        favorites.toggle_from_results(1).await.unwrap();
        let list = favorites.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].nom, "Bellis perennis");
        assert_eq!(list[0].image, "https://img/1.jpg");

        favorites.toggle_from_results(1).await.unwrap();
        assert!(favorites.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_unknown_result() {
        let (favorites, _) = favorites();
        let result = favorites.toggle_from_results(99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insertion_order_kept_after_removal() {
        let (favorites, _) = favorites();
        for id in 1..=4 {
            favorites.toggle(&observation(id, "x")).await.unwrap();
        }

        assert!(favorites.remove(2).await.unwrap());
        assert!(!favorites.remove(2).await.unwrap());

        let ids: Vec<u64> = favorites.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert!(favorites.contains(3).await.unwrap());
        assert!(!favorites.contains(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_by_id_ignores_stale_positions() {
        let (favorites, _) = favorites();
        for id in [10, 20, 30] {
            favorites.toggle(&observation(id, "x")).await.unwrap();
        }
        // Another writer removes the first entry; ids still address the
        // right favorite even though every index shifted
        favorites.remove(10).await.unwrap();
        favorites.remove(30).await.unwrap();

        let ids: Vec<u64> = favorites.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![20]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_last_write_wins() {
        let (favorites, records) = favorites();
        // Two clients read the same empty list, then each writes its own
        let mut tab_a = records.favorites().await.unwrap();
        let mut tab_b = records.favorites().await.unwrap();
        tab_a.push(Favorite::from(&observation(1, "a")));
        tab_b.push(Favorite::from(&observation(2, "b")));
        records.set_favorites(&tab_a).await.unwrap();
        records.set_favorites(&tab_b).await.unwrap();

        let ids: Vec<u64> = favorites.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2]);
    }
}
