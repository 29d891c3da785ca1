//! User Image Cache
//!
//! Photos attached to discovery log entries, stored as synthetic responses
//! under `/user-img/<id>` in a partition that survives version upgrades.
//! Every operation is best-effort: failures are logged and turned into
//! sentinels so the caller never aborts because of an image.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::cache::{CacheStorage, StoredResponse, USER_IMAGE_PARTITION};
use crate::error::{AppError, Result};

/// Shown whenever a stored image cannot be read.
pub const PLACEHOLDER_IMAGE: &str = "img/placeholder.png";

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Synthetic request path for an image id.
pub fn image_path(id: u64) -> String {
    format!("/user-img/{}", id)
}

// == Image Input ==
/// Raw bytes or a `data:` URL.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Bytes(Bytes),
    DataUrl(String),
}

impl ImageInput {
    /// Normalizes the input to binary.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            ImageInput::Bytes(bytes) => Ok(bytes),
            ImageInput::DataUrl(url) => decode_data_url(&url),
        }
    }
}

fn decode_data_url(url: &str) -> Result<Bytes> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Image("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Image("data URL without payload".to_string()))?;

    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map(Bytes::from)
            .map_err(|e| AppError::Image(format!("invalid base64 payload: {}", e)))
    } else {
        Ok(Bytes::copy_from_slice(payload.as_bytes()))
    }
}

// == Stored Image ==
#[derive(Debug, Clone, PartialEq)]
pub enum StoredImage {
    Cached { url: String, body: Bytes },
    /// Storage failed while reading; display the placeholder instead
    Placeholder(&'static str),
}

impl StoredImage {
    pub fn url(&self) -> &str {
        match self {
            StoredImage::Cached { url, .. } => url,
            StoredImage::Placeholder(path) => path,
        }
    }
}

// == Image Cache ==
#[derive(Clone)]
pub struct ImageCache {
    storage: Arc<dyn CacheStorage>,
}

impl ImageCache {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Stores an image and returns its URL, or `None` if anything failed.
    pub async fn put(&self, id: u64, source: ImageInput) -> Option<String> {
        let path = image_path(id);
        let body = match source.into_bytes() {
            Ok(body) => body,
            Err(e) => {
                error!("Could not decode image {}: {}", path, e);
                return None;
            }
        };

        let response = StoredResponse::ok(IMAGE_CONTENT_TYPE, body);
        match self.storage.put(USER_IMAGE_PARTITION, &path, response).await {
            Ok(()) => {
                info!("Image stored in cache: {}", path);
                Some(path)
            }
            Err(e) => {
                error!("Could not store image {}: {}", path, e);
                None
            }
        }
    }

    /// `None` on a miss, the placeholder if storage failed.
    pub async fn get(&self, id: u64) -> Option<StoredImage> {
        let path = image_path(id);
        match self.storage.match_in(USER_IMAGE_PARTITION, &path).await {
            Ok(Some(response)) => Some(StoredImage::Cached {
                url: path,
                body: response.body,
            }),
            Ok(None) => None,
            Err(e) => {
                error!("Could not read image {}: {}", path, e);
                Some(StoredImage::Placeholder(PLACEHOLDER_IMAGE))
            }
        }
    }

    /// URL to display for an id; the placeholder on miss or failure.
    pub async fn resolve(&self, id: u64) -> String {
        self.get(id)
            .await
            .map(|image| image.url().to_string())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }

    /// Removes an image. Missing ids and storage failures are not errors.
    pub async fn delete(&self, id: u64) {
        let path = image_path(id);
        if let Err(e) = self.storage.remove(USER_IMAGE_PARTITION, &path).await {
            warn!("Could not delete image {}: {}", path, e);
        }
    }
}
