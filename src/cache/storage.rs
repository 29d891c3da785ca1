//! Cache Storage Module
//!
//! Named partitions of request-path to response pairs. Partitions are
//! created implicitly on first write and listed in creation order.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::StoredResponse;
use crate::error::Result;

// == Cache Storage Trait ==
/// Partitioned response storage shared by the asset cache and the image cache.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all partitions, oldest first.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Whether a partition with exactly this name exists.
    async fn has(&self, partition: &str) -> Result<bool>;

    /// Deletes a whole partition. Returns false if it did not exist.
    async fn delete(&self, partition: &str) -> Result<bool>;

    /// Stores one response, creating the partition if needed.
    async fn put(&self, partition: &str, path: &str, response: StoredResponse) -> Result<()>;

    /// Creates or fills a partition with every entry in one step.
    async fn put_all(&self, partition: &str, entries: Vec<(String, StoredResponse)>)
        -> Result<()>;

    /// Looks up a path in one partition.
    async fn match_in(&self, partition: &str, path: &str) -> Result<Option<StoredResponse>>;

    /// Looks up a path across every partition, oldest partition first.
    async fn match_any(&self, path: &str) -> Result<Option<StoredResponse>>;

    /// Removes one entry. Returns false if nothing was stored there.
    async fn remove(&self, partition: &str, path: &str) -> Result<bool>;
}

// == Partition ==
#[derive(Debug, Default)]
struct Partition {
    name: String,
    entries: HashMap<String, StoredResponse>,
}

// == Memory Cache Storage ==
/// In-process cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    partitions: RwLock<Vec<Partition>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a partition, 0 if absent.
    pub async fn len(&self, partition: &str) -> usize {
        let partitions = self.partitions.read().await;
        partitions
            .iter()
            .find(|p| p.name == partition)
            .map(|p| p.entries.len())
            .unwrap_or(0)
    }
}

fn partition_mut<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
    match partitions.iter().position(|p| p.name == name) {
        Some(index) => &mut partitions[index],
        None => {
            debug!("Creating cache partition {}", name);
            partitions.push(Partition {
                name: name.to_string(),
                entries: HashMap::new(),
            });
            let last = partitions.len() - 1;
            &mut partitions[last]
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> Result<Vec<String>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn has(&self, partition: &str) -> Result<bool> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().any(|p| p.name == partition))
    }

    async fn delete(&self, partition: &str) -> Result<bool> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != partition);
        Ok(partitions.len() != before)
    }

    async fn put(&self, partition: &str, path: &str, response: StoredResponse) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partition_mut(&mut partitions, partition)
            .entries
            .insert(path.to_string(), response);
        Ok(())
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(String, StoredResponse)>,
    ) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partition_mut(&mut partitions, partition).entries.extend(entries);
        Ok(())
    }

    async fn match_in(&self, partition: &str, path: &str) -> Result<Option<StoredResponse>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == partition)
            .and_then(|p| p.entries.get(path).cloned()))
    }

    async fn match_any(&self, path: &str) -> Result<Option<StoredResponse>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find_map(|p| p.entries.get(path).cloned()))
    }

    async fn remove(&self, partition: &str, path: &str) -> Result<bool> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .iter_mut()
            .find(|p| p.name == partition)
            .map(|p| p.entries.remove(path).is_some())
            .unwrap_or(false))
    }
}

// == File Cache Storage ==
/// Cache storage on disk, surviving restarts and version bumps.
///
/// Layout under the root directory:
/// - `partitions.json`: partition names in creation order
/// - `p<name>/e<path>.body` and `p<name>/e<path>.meta`: one entry, names
///   base64url encoded
///
/// A partition only becomes visible once it is listed in the index, and an
/// entry only once its `.meta` file is in place.
#[derive(Debug)]
pub struct FileCacheStorage {
    root: PathBuf,
    // Serializes index rewrites and entry writes
    write_lock: Mutex<()>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    status: u16,
    content_type: String,
    stored_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

const INDEX_FILE: &str = "partitions.json";

fn encode_name(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name.as_bytes())
}

async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl FileCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        self.root.join(format!("p{}", encode_name(partition)))
    }

    fn entry_paths(&self, partition: &str, path: &str) -> (PathBuf, PathBuf) {
        let dir = self.partition_dir(partition);
        let stem = format!("e{}", encode_name(path));
        (
            dir.join(format!("{}.body", stem)),
            dir.join(format!("{}.meta", stem)),
        )
    }

    async fn read_index(&self) -> Result<Vec<String>> {
        match fs::read_to_string(self.root.join(INDEX_FILE)).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, names: &[String]) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        write_atomic(&self.root.join(INDEX_FILE), serde_json::to_vec(names)?).await
    }

    /// Adds a partition to the index if it is not listed yet. Caller holds
    /// the write lock.
    async fn register(&self, partition: &str) -> Result<()> {
        let mut names = self.read_index().await?;
        if !names.iter().any(|n| n == partition) {
            debug!("Creating cache partition {}", partition);
            names.push(partition.to_string());
            self.write_index(&names).await?;
        }
        Ok(())
    }

    /// Body first, then metadata. Caller holds the write lock.
    async fn write_entry(&self, partition: &str, path: &str, response: StoredResponse) -> Result<()> {
        let (body_path, meta_path) = self.entry_paths(partition, path);
        fs::create_dir_all(self.partition_dir(partition)).await?;

        let meta = EntryMeta {
            status: response.status,
            content_type: response.content_type,
            stored_at: response.stored_at,
            location: response.location,
        };
        write_atomic(&body_path, &response.body).await?;
        write_atomic(&meta_path, serde_json::to_vec(&meta)?).await
    }

    async fn read_entry(&self, partition: &str, path: &str) -> Result<Option<StoredResponse>> {
        let (body_path, meta_path) = self.entry_paths(partition, path);
        let meta: EntryMeta = match fs::read(&meta_path).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let body = match fs::read(&body_path).await {
            Ok(body) => Bytes::from(body),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut response = StoredResponse::new(meta.status, meta.content_type, body);
        response.stored_at = meta.stored_at;
        response.location = meta.location;
        Ok(Some(response))
    }
}

#[async_trait]
impl CacheStorage for FileCacheStorage {
    async fn keys(&self) -> Result<Vec<String>> {
        self.read_index().await
    }

    async fn has(&self, partition: &str) -> Result<bool> {
        Ok(self.read_index().await?.iter().any(|n| n == partition))
    }

    async fn delete(&self, partition: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut names = self.read_index().await?;
        let before = names.len();
        names.retain(|n| n != partition);
        let existed = names.len() != before;
        if existed {
            self.write_index(&names).await?;
        }

        match fs::remove_dir_all(self.partition_dir(partition)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn put(&self, partition: &str, path: &str, response: StoredResponse) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_entry(partition, path, response).await?;
        self.register(partition).await
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(String, StoredResponse)>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        for (path, response) in entries {
            self.write_entry(partition, &path, response).await?;
        }
        self.register(partition).await
    }

    async fn match_in(&self, partition: &str, path: &str) -> Result<Option<StoredResponse>> {
        if !self.has(partition).await? {
            return Ok(None);
        }
        self.read_entry(partition, path).await
    }

    async fn match_any(&self, path: &str) -> Result<Option<StoredResponse>> {
        for name in self.read_index().await? {
            if let Some(hit) = self.read_entry(&name, path).await? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    async fn remove(&self, partition: &str, path: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if !self.has(partition).await? {
            return Ok(false);
        }
        let (body_path, meta_path) = self.entry_paths(partition, path);
        let removed = remove_if_present(&meta_path).await?;
        remove_if_present(&body_path).await?;
        Ok(removed)
    }
}
