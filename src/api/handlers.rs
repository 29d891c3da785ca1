//! API Handlers
//!
//! HTTP request handlers for each companion endpoint. The entity operations
//! live on `AppState` so the event dispatcher can reuse them.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use url::Url;

use crate::cache::{
    default_manifest, AssetWorker, CacheStorage, FileCacheStorage, ImageCache, ImageInput,
    MemoryCacheStorage, Network, OriginNetwork, PLACEHOLDER_IMAGE,
};
use crate::config::Config;
use crate::entities::{
    favorite_badges, herbarium_rank, DiscoveryLog, Favorites, NewDiscovery, SessionState,
};
use crate::error::{AppError, Result};
use crate::imaging;
use crate::models::{
    AddDiscoveryRequest, AddDiscoveryResponse, DeleteResponse, DiscoveriesResponse,
    DiscoveryView, FavoritesResponse, HealthResponse, IdentifyResponse, Position,
    PositionResponse, SearchRequest, SearchResponse, ToggleFavoriteRequest, ToggleResponse,
};
use crate::remote::{HttpSpeciesApi, SearchQuery, SpeciesApi};
use crate::store::{FileKv, KeyValueStore, MemoryKv, Records};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionState>,
    pub favorites: Favorites,
    pub discoveries: DiscoveryLog,
    pub images: ImageCache,
    pub worker: Arc<AssetWorker>,
    pub species: Arc<dyn SpeciesApi>,
}

impl AppState {
    /// Wires the managers over one record store and one cache storage.
    ///
    /// `worker` must sit on the same `storage` so stored user images are
    /// reachable through fetch interception.
    pub async fn new(
        kv: Arc<dyn KeyValueStore>,
        storage: Arc<dyn CacheStorage>,
        worker: Arc<AssetWorker>,
        species: Arc<dyn SpeciesApi>,
    ) -> Result<Self> {
        let records = Records::new(kv);
        let images = ImageCache::new(storage);
        Ok(Self {
            session: Arc::new(SessionState::restore(records.clone()).await?),
            favorites: Favorites::new(records.clone()),
            discoveries: DiscoveryLog::new(records, images.clone()),
            images,
            worker,
            species,
        })
    }

    /// Creates a new AppState from configuration.
    ///
    /// Records and cache partitions go to `data_dir`, the latter under
    /// `cache/`; both stay in memory when it is unset. The worker is built
    /// but not installed.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| AppError::Internal(format!("invalid APP_ORIGIN {}: {}", config.origin, e)))?;

        let kv: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileKv::new(dir.clone())),
            None => Arc::new(MemoryKv::new()),
        };
        let storage: Arc<dyn CacheStorage> = match &config.data_dir {
            Some(dir) => Arc::new(FileCacheStorage::new(dir.join("cache"))),
            None => Arc::new(MemoryCacheStorage::new()),
        };
        let network: Arc<dyn Network> =
            Arc::new(OriginNetwork::new(origin.clone(), config.asset_dir.clone()));
        let worker = Arc::new(AssetWorker::new(
            config.version.clone(),
            origin,
            default_manifest(),
            storage.clone(),
            network,
        ));
        let species = Arc::new(HttpSpeciesApi::from_config(config)?);

        Self::new(kv, storage, worker, species).await
    }

    // == Entity Operations ==
    pub async fn toggle_favorite(&self, id: u64) -> Result<ToggleResponse> {
        let toggled = self.favorites.toggle_from_results(id).await?;
        let count = self.favorites.list().await?.len();
        Ok(ToggleResponse::new(toggled.id, toggled.favorite, count))
    }

    pub async fn remove_favorite(&self, id: u64) -> Result<DeleteResponse> {
        let removed = self.favorites.remove(id).await?;
        Ok(DeleteResponse::new(id, removed))
    }

    pub async fn add_discovery(&self, req: AddDiscoveryRequest) -> Result<AddDiscoveryResponse> {
        if let Some(error_msg) = req.validate() {
            return Err(AppError::InvalidRequest(error_msg));
        }

        let outcome = self
            .discoveries
            .add(NewDiscovery {
                nom: req.nom,
                nom_sci: req.nom_sci,
                image: req.image.map(ImageInput::DataUrl),
            })
            .await?;
        Ok(AddDiscoveryResponse::new(
            outcome.accepted,
            outcome.entry,
            outcome.image_url,
        ))
    }

    pub async fn remove_discovery(&self, id: u64) -> Result<DeleteResponse> {
        let removed = self.discoveries.remove(id).await?;
        Ok(DeleteResponse::new(id, removed))
    }
}

/// Handler for GET /api/position
pub async fn get_position_handler(State(state): State<AppState>) -> Json<PositionResponse> {
    let session = state.session.snapshot().await;
    Json(PositionResponse::from_session(&session))
}

/// Handler for PUT /api/position
///
/// Overwrites the stored position, e.g. after a map click.
pub async fn put_position_handler(
    State(state): State<AppState>,
    Json(position): Json<Position>,
) -> Result<Json<PositionResponse>> {
    if !position.is_valid() {
        return Err(AppError::InvalidRequest("Coordinates out of range".to_string()));
    }
    state.session.set_position(position).await?;

    let session = state.session.snapshot().await;
    Ok(Json(PositionResponse::from_session(&session)))
}

/// Handler for GET /api/results
pub async fn results_handler(State(state): State<AppState>) -> Json<SearchResponse> {
    Json(SearchResponse::from_session(state.session.snapshot().await))
}

/// Handler for POST /api/search
///
/// Records the position and filters, searches around it and persists the
/// results. The position is kept even if the search fails.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    state.session.set_filters(req.radius, req.taxon).await;
    state.session.set_position(Position::new(req.lat, req.lng)).await?;

    let session = state.session.snapshot().await;
    let query = SearchQuery {
        lat: req.lat,
        lng: req.lng,
        radius_km: session.radius_km,
        taxon: session.taxon,
    };
    let observations = state.species.search(&query).await?;
    info!(
        "Search at ({}, {}) within {} km: {} observations",
        query.lat,
        query.lng,
        query.radius_km,
        observations.len()
    );
    state.session.replace_observations(observations).await?;

    Ok(Json(SearchResponse::from_session(state.session.snapshot().await)))
}

/// Handler for GET /api/favorites
pub async fn list_favorites_handler(
    State(state): State<AppState>,
) -> Result<Json<FavoritesResponse>> {
    let favorites = state.favorites.list().await?;
    let progress = favorite_badges(favorites.len());
    Ok(Json(FavoritesResponse {
        favorites,
        progress,
    }))
}

/// Handler for POST /api/favorites/toggle
pub async fn toggle_favorite_handler(
    State(state): State<AppState>,
    Json(req): Json<ToggleFavoriteRequest>,
) -> Result<Json<ToggleResponse>> {
    Ok(Json(state.toggle_favorite(req.id).await?))
}

/// Handler for DELETE /api/favorites/:id
pub async fn delete_favorite_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    Ok(Json(state.remove_favorite(id).await?))
}

/// Handler for GET /api/discoveries
///
/// Each entry carries the URL its photo is shown from, the placeholder when
/// the photo is missing.
pub async fn list_discoveries_handler(
    State(state): State<AppState>,
) -> Result<Json<DiscoveriesResponse>> {
    let entries = state.discoveries.list().await?;
    let rank = herbarium_rank(entries.len());

    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
        let image = if entry.has_image {
            state.images.resolve(entry.id).await
        } else {
            PLACEHOLDER_IMAGE.to_string()
        };
        views.push(DiscoveryView { entry, image });
    }

    Ok(Json(DiscoveriesResponse {
        entries: views,
        rank,
    }))
}

/// Handler for POST /api/discoveries
///
/// 201 when the entry was added, 200 with `accepted: false` when the
/// scientific name was already logged.
pub async fn add_discovery_handler(
    State(state): State<AppState>,
    Json(req): Json<AddDiscoveryRequest>,
) -> Result<(StatusCode, Json<AddDiscoveryResponse>)> {
    let response = state.add_discovery(req).await?;
    let status = if response.accepted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

/// Handler for DELETE /api/discoveries/:id
pub async fn delete_discovery_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    Ok(Json(state.remove_discovery(id).await?))
}

/// Handler for POST /api/identify
///
/// Takes the first file part of a multipart body, resizes it and sends it
/// for identification.
pub async fn identify_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IdentifyResponse>> {
    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_some() || field.name() == Some("photo") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidRequest(format!("Invalid photo part: {}", e)))?;
            photo = Some(bytes);
            break;
        }
    }
    let photo = photo.ok_or_else(|| AppError::InvalidRequest("No photo supplied".to_string()))?;
    debug!("Received photo of {} bytes", photo.len());

    let jpeg = imaging::prepare_photo(photo.to_vec()).await?;
    let data_url = imaging::to_data_url(&jpeg);
    let candidates = state.species.identify(jpeg).await?;

    Ok(Json(IdentifyResponse {
        candidates,
        photo: data_url,
    }))
}

/// Handler for GET /health
///
/// Returns health status with the asset cache version and worker state.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.worker.version(),
        state.worker.state().await,
        state.worker.stats().await,
    ))
}
