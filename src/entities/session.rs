//! Session state
//!
//! The in-memory view of the current search: position, last observations
//! and filters. Position and observations are written through to the
//! records so the next start picks up where this one stopped.

use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::models::{Observation, Position};
use crate::store::Records;

/// Default search radius in kilometres.
pub const DEFAULT_RADIUS_KM: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub position: Option<Position>,
    pub observations: Vec<Observation>,
    pub radius_km: u32,
    /// Iconic taxon filter; `None` searches every group
    pub taxon: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            position: None,
            observations: Vec::new(),
            radius_km: DEFAULT_RADIUS_KM,
            taxon: None,
        }
    }
}

impl Session {
    /// Position to center the map on.
    pub fn center(&self) -> Position {
        self.position.unwrap_or_else(Position::default_center)
    }
}

pub struct SessionState {
    inner: RwLock<Session>,
    records: Records,
}

impl SessionState {
    /// Loads the last position and results from the records.
    pub async fn restore(records: Records) -> Result<Self> {
        let session = Session {
            position: records.position().await?,
            observations: records.results().await?,
            ..Session::default()
        };
        if session.position.is_some() {
            info!(
                "Restored last position and {} observations",
                session.observations.len()
            );
        }
        Ok(Self {
            inner: RwLock::new(session),
            records,
        })
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    pub async fn set_position(&self, position: Position) -> Result<()> {
        self.records.set_position(position).await?;
        self.inner.write().await.position = Some(position);
        Ok(())
    }

    /// Updates the search filters. An empty taxon clears the filter.
    pub async fn set_filters(&self, radius_km: Option<u32>, taxon: Option<String>) {
        let mut session = self.inner.write().await;
        if let Some(radius) = radius_km {
            session.radius_km = radius;
        }
        if let Some(taxon) = taxon {
            session.taxon = if taxon.trim().is_empty() {
                None
            } else {
                Some(taxon)
            };
        }
    }

    /// Replaces the current observations and persists them as the last
    /// search results.
    pub async fn replace_observations(&self, observations: Vec<Observation>) -> Result<()> {
        self.records.set_results(&observations).await?;
        self.inner.write().await.observations = observations;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;
    use std::sync::Arc;

    fn records() -> Records {
        Records::new(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn test_fresh_session_defaults() {
        let state = SessionState::restore(records()).await.unwrap();
        let session = state.snapshot().await;

        assert_eq!(session.radius_km, DEFAULT_RADIUS_KM);
        assert!(session.taxon.is_none());
        assert_eq!(session.center(), Position::default_center());
    }

    #[tokio::test]
    async fn test_restore_picks_up_persisted_state() {
        let records = records();
        {
            let state = SessionState::restore(records.clone()).await.unwrap();
            state.set_position(Position::new(48.1, -1.6)).await.unwrap();
            let obs: Observation = serde_json::from_str(r#"{"id":5}"#).unwrap();
            state.replace_observations(vec![obs]).await.unwrap();
        }

        let restored = SessionState::restore(records).await.unwrap().snapshot().await;
        assert_eq!(restored.position, Some(Position::new(48.1, -1.6)));
        assert_eq!(restored.observations.len(), 1);
        assert_eq!(restored.observations[0].id, 5);
    }

    #[tokio::test]
    async fn test_filters() {
        let state = SessionState::restore(records()).await.unwrap();

        state.set_filters(Some(5), Some("Aves".into())).await;
        let session = state.snapshot().await;
        assert_eq!(session.radius_km, 5);
        assert_eq!(session.taxon.as_deref(), Some("Aves"));

        state.set_filters(None, Some(String::new())).await;
        let session = state.snapshot().await;
        assert_eq!(session.radius_km, 5);
        assert!(session.taxon.is_none());
    }
}
