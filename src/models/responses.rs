//! Response DTOs for the companion API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{FetchStats, WorkerState};
use crate::entities::{FavoriteBadges, HerbariumRank, Session};
use crate::models::{DiscoveryEntry, Favorite, Observation, Position};
use crate::remote::Candidate;

/// Response body for GET/PUT /api/position
#[derive(Debug, Clone, Serialize)]
pub struct PositionResponse {
    /// Last known position, or the default map center
    pub position: Position,
    /// False while no position was ever recorded
    pub known: bool,
}

impl PositionResponse {
    pub fn from_session(session: &Session) -> Self {
        Self {
            position: session.center(),
            known: session.position.is_some(),
        }
    }
}

/// Response body for POST /api/search and GET /api/results
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub center: Position,
    pub radius_km: u32,
    pub taxon: Option<String>,
    pub count: usize,
    pub results: Vec<Observation>,
}

impl SearchResponse {
    pub fn from_session(session: Session) -> Self {
        Self {
            center: session.center(),
            radius_km: session.radius_km,
            taxon: session.taxon,
            count: session.observations.len(),
            results: session.observations,
        }
    }
}

/// Response body for GET /api/favorites
#[derive(Debug, Clone, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<Favorite>,
    pub progress: FavoriteBadges,
}

/// Response body for POST /api/favorites/toggle
#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub id: u64,
    pub favorite: bool,
    /// Number of favorites after the toggle
    pub count: usize,
    pub message: String,
}

impl ToggleResponse {
    pub fn new(id: u64, favorite: bool, count: usize) -> Self {
        let message = if favorite {
            "Ajouté aux favoris !"
        } else {
            "Retiré des favoris"
        };
        Self {
            id,
            favorite,
            count,
            message: message.to_string(),
        }
    }
}

/// A discovery entry with the URL its photo is shown from.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryView {
    #[serde(flatten)]
    pub entry: DiscoveryEntry,
    pub image: String,
}

/// Response body for GET /api/discoveries
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveriesResponse {
    pub entries: Vec<DiscoveryView>,
    pub rank: HerbariumRank,
}

/// Response body for POST /api/discoveries
#[derive(Debug, Clone, Serialize)]
pub struct AddDiscoveryResponse {
    pub accepted: bool,
    pub message: String,
    pub entry: DiscoveryEntry,
    /// Set when the photo was stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl AddDiscoveryResponse {
    pub fn new(accepted: bool, entry: DiscoveryEntry, image_url: Option<String>) -> Self {
        let message = if accepted {
            format!("{} ajouté à votre Herbier !", entry.nom)
        } else {
            "Vous avez déjà cette plante !".to_string()
        };
        Self {
            accepted,
            message,
            entry,
            image_url,
        }
    }
}

/// Response body for POST /api/identify
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResponse {
    pub candidates: Vec<Candidate>,
    /// Resized photo as a data URL, ready to send back with an add request
    pub photo: String,
}

/// Response body for DELETE /api/favorites/:id and /api/discoveries/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub id: u64,
    /// False when the id was not present
    pub removed: bool,
}

impl DeleteResponse {
    pub fn new(id: u64, removed: bool) -> Self {
        Self { id, removed }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Asset cache version
    pub version: String,
    pub worker: WorkerState,
    pub stats: FetchStats,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(version: impl Into<String>, worker: WorkerState, stats: FetchStats) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: version.into(),
            worker,
            stats,
        }
    }
}
