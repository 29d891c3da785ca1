//! Network Module
//!
//! Where cache misses and the install fetches end up. Only the app origin is
//! served, from the deployed asset directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::cache::StoredResponse;
use crate::error::{AppError, Result};

// == Network Trait ==
/// Fetches a URL. Transport failures are errors; HTTP error statuses are not.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<StoredResponse>;
}

/// Content type for a static asset, from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" | "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

// == Origin Network ==
/// Production network: the asset directory behind the app origin.
#[derive(Debug, Clone)]
pub struct OriginNetwork {
    origin: Url,
    asset_dir: PathBuf,
}

impl OriginNetwork {
    pub fn new(origin: Url, asset_dir: PathBuf) -> Self {
        Self { origin, asset_dir }
    }

    /// Maps a URL path onto the asset directory, refusing to leave it.
    fn local_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut relative = url_path.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index.html");
        }
        let relative = Path::new(&relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.asset_dir.join(relative))
    }

    async fn fetch_local(&self, url: &Url) -> Result<StoredResponse> {
        let Some(path) = self.local_path(url.path()) else {
            return Ok(StoredResponse::not_found());
        };
        match fs::read(&path).await {
            Ok(body) => {
                let name = path.to_string_lossy();
                Ok(StoredResponse::ok(content_type_for(&name), body))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Asset not found on disk: {}", path.display());
                Ok(StoredResponse::not_found())
            }
            Err(e) => Err(AppError::Upstream(format!("{}: {}", path.display(), e))),
        }
    }
}

#[async_trait]
impl Network for OriginNetwork {
    async fn fetch(&self, url: &Url) -> Result<StoredResponse> {
        if url.origin() != self.origin.origin() {
            return Err(AppError::InvalidRequest(format!(
                "refusing to fetch {}: not the app origin",
                url
            )));
        }
        self.fetch_local(url).await
    }
}

// == Test Double ==
#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Canned responses keyed by full URL, with a call counter.
    #[derive(Default)]
    pub struct MockNetwork {
        responses: Mutex<HashMap<String, StoredResponse>>,
        failing: Mutex<HashSet<String>>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl MockNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: &str, response: StoredResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub fn fail(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Network for MockNetwork {
        async fn fetch(&self, url: &Url) -> Result<StoredResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(url.to_string());
            if self.failing.lock().unwrap().contains(url.as_str()) {
                return Err(AppError::Upstream(format!("connection refused: {}", url)));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(StoredResponse::not_found))
        }
    }
}
