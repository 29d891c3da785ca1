//! Record, request and response models
//!
//! Persisted record shapes plus the DTOs used for serializing and
//! deserializing HTTP request and response bodies.

pub mod records;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use records::{
    DiscoveryEntry, Favorite, Observation, Photo, Position, Taxon, PLANT_CATEGORY, UNKNOWN_SPECIES,
};
pub use requests::{AddDiscoveryRequest, SearchRequest, ToggleFavoriteRequest};
pub use responses::{
    AddDiscoveryResponse, DeleteResponse, DiscoveriesResponse, DiscoveryView, FavoritesResponse,
    HealthResponse, IdentifyResponse, PositionResponse, SearchResponse, ToggleResponse,
};
