//! Asset Worker Module
//!
//! Versioned snapshot of the static assets plus the fetch interception
//! rules: cross-origin requests are redirected to their own host and never
//! fetched here, same-origin requests are answered cache-first.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{gc, CacheStorage, FetchStats, Network, StoredResponse};
use crate::error::{AppError, Result};

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Uninstalled,
    Installing,
    Active,
}

// == Install Report ==
/// What an install run did.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub version: String,
    /// Number of manifest entries fetched and stored
    pub fetched: usize,
    /// Stale partitions removed afterwards
    pub purged: Vec<String>,
    /// True when the version partition already existed and nothing was done
    pub reused: bool,
}

// == Served Response ==
/// Where an intercepted request was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    Passthrough,
}

impl ServedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedFrom::Cache => "cache",
            ServedFrom::Network => "network",
            ServedFrom::Passthrough => "passthrough",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: StoredResponse,
    pub from: ServedFrom,
}

// == Asset Worker ==
pub struct AssetWorker {
    version: String,
    origin: Url,
    manifest: Vec<String>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    stats: RwLock<FetchStats>,
}

impl AssetWorker {
    // == Constructor ==
    pub fn new(
        version: impl Into<String>,
        origin: Url,
        manifest: Vec<String>,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            version: version.into(),
            origin,
            manifest,
            storage,
            network,
            state: RwLock::new(WorkerState::Uninstalled),
            stats: RwLock::new(FetchStats::new()),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub async fn stats(&self) -> FetchStats {
        self.stats.read().await.clone()
    }

    // == Install ==
    /// Caches the manifest under the version partition and purges stale
    /// partitions. A failure to cache the manifest leaves the worker
    /// uninstalled and is returned to the caller; a failed purge is logged.
    pub async fn install(&self) -> Result<InstallReport> {
        info!("Installing asset cache version {}", self.version);
        *self.state.write().await = WorkerState::Installing;

        match self.install_assets().await {
            Ok(report) => {
                *self.state.write().await = WorkerState::Active;
                Ok(report)
            }
            Err(e) => {
                error!("Install of version {} failed: {}", self.version, e);
                *self.state.write().await = WorkerState::Uninstalled;
                Err(e)
            }
        }
    }

    async fn install_assets(&self) -> Result<InstallReport> {
        let existing = self
            .storage
            .keys()
            .await
            .map_err(|e| AppError::Install(e.to_string()))?;

        if existing.iter().any(|name| name == &self.version) {
            info!("Version {} already cached, skipping fetch", self.version);
            return Ok(InstallReport {
                version: self.version.clone(),
                fetched: 0,
                purged: Vec::new(),
                reused: true,
            });
        }

        // Fetch everything before touching storage so a failure leaves no
        // partial partition behind.
        let mut entries = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let url = self
                .origin
                .join(path)
                .map_err(|e| AppError::Install(format!("{}: {}", path, e)))?;
            let response = self
                .network
                .fetch(&url)
                .await
                .map_err(|e| AppError::Install(format!("{}: {}", path, e)))?;
            if !response.is_success() {
                return Err(AppError::Install(format!(
                    "{}: HTTP {}",
                    path, response.status
                )));
            }
            entries.push((cache_key(&url), response));
        }

        let fetched = entries.len();
        info!("Caching {} static assets", fetched);
        self.storage
            .put_all(&self.version, entries)
            .await
            .map_err(|e| AppError::Install(e.to_string()))?;

        // Leftovers are purged again by the next version bump
        let purged = match gc::collect_stale(self.storage.as_ref(), &self.version).await {
            Ok(purged) => purged,
            Err(e) => {
                error!("Purging stale partitions after installing {} failed: {}", self.version, e);
                Vec::new()
            }
        };

        Ok(InstallReport {
            version: self.version.clone(),
            fetched,
            purged,
            reused: false,
        })
    }

    // == Request Resolution ==
    /// Absolute URL for an incoming request target. Origin-form targets are
    /// resolved against the app origin.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        let parsed = if target.starts_with('/') {
            self.origin.join(target)
        } else {
            Url::parse(target)
        };
        parsed.map_err(|e| AppError::InvalidRequest(format!("bad request target {}: {}", target, e)))
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    // == Fetch ==
    /// Answers an intercepted request. Other origins get a redirect so the
    /// client talks to them directly.
    pub async fn handle_fetch(&self, url: &Url) -> Result<Served> {
        if !self.is_same_origin(url) {
            self.stats.write().await.record_passthrough();
            debug!("Passthrough {}", url);
            return Ok(Served {
                response: StoredResponse::redirect(url.as_str()),
                from: ServedFrom::Passthrough,
            });
        }

        if self.state().await == WorkerState::Active {
            let key = cache_key(url);
            match self.lookup(&key).await {
                Ok(Some(response)) => {
                    self.stats.write().await.record_hit();
                    return Ok(Served {
                        response,
                        from: ServedFrom::Cache,
                    });
                }
                Ok(None) => debug!("Cache miss {}", key),
                Err(e) => warn!("Cache lookup for {} failed: {}", key, e),
            }
            self.stats.write().await.record_miss();
        }

        let response = self.network.fetch(url).await?;
        Ok(Served {
            response,
            from: ServedFrom::Network,
        })
    }

    async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>> {
        if let Some(hit) = self.storage.match_in(&self.version, key).await? {
            return Ok(Some(hit));
        }
        self.storage.match_any(key).await
    }
}

/// Cache key for a URL: its path plus query string.
pub fn cache_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
