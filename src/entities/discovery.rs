//! Discovery Log Manager
//!
//! Identified plants, newest first, at most one entry per scientific name.
//! An entry's photo lives in the image cache under the entry id.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::{ImageCache, ImageInput};
use crate::error::Result;
use crate::models::{DiscoveryEntry, PLANT_CATEGORY};
use crate::store::Records;

/// Candidate entry for the log.
#[derive(Debug, Clone)]
pub struct NewDiscovery {
    pub nom: String,
    pub nom_sci: String,
    pub image: Option<ImageInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub accepted: bool,
    /// The stored entry, or the one already holding this scientific name
    pub entry: DiscoveryEntry,
    /// URL of the stored photo if the image write succeeded
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct DiscoveryLog {
    records: Records,
    images: ImageCache,
    // Held across every read-modify-write of the log
    write_lock: Arc<Mutex<()>>,
}

/// Creation timestamp, bumped past every existing id.
fn next_id(now_ms: u64, entries: &[DiscoveryEntry]) -> u64 {
    match entries.iter().map(|entry| entry.id).max() {
        Some(max) if max >= now_ms => max + 1,
        _ => now_ms,
    }
}

impl DiscoveryLog {
    pub fn new(records: Records, images: ImageCache) -> Self {
        Self {
            records,
            images,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<DiscoveryEntry>> {
        self.records.discoveries().await
    }

    // == Add ==
    /// Prepends a new entry unless the scientific name is already logged.
    ///
    /// `hasImage` is set whenever a photo was supplied, even if writing it
    /// to the image cache failed; `repair_images` reconciles that later.
    pub async fn add(&self, candidate: NewDiscovery) -> Result<AddOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.records.discoveries().await?;

        if let Some(existing) = entries.iter().find(|e| e.nom_sci == candidate.nom_sci) {
            info!("{} already in the discovery log", candidate.nom_sci);
            return Ok(AddOutcome {
                accepted: false,
                entry: existing.clone(),
                image_url: None,
            });
        }

        let now = Local::now();
        let id = next_id(now.timestamp_millis().max(0) as u64, &entries);
        let has_image = candidate.image.is_some();

        let image_url = match candidate.image {
            Some(image) => {
                let url = self.images.put(id, image).await;
                if url.is_none() {
                    warn!("Photo for discovery {} was not stored", id);
                }
                url
            }
            None => None,
        };

        let entry = DiscoveryEntry {
            id,
            nom: candidate.nom,
            nom_sci: candidate.nom_sci,
            has_image,
            categorie: PLANT_CATEGORY.to_string(),
            date: now.format("%d/%m/%Y").to_string(),
        };
        entries.insert(0, entry.clone());
        self.records.set_discoveries(&entries).await?;
        info!("Added {} to the discovery log", entry.nom_sci);

        Ok(AddOutcome {
            accepted: true,
            entry,
            image_url,
        })
    }

    // == Remove ==
    /// Removes the entry and, best-effort, its photo. Returns false if the
    /// id was not logged.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.records.discoveries().await?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        self.records.set_discoveries(&entries).await?;
        self.images.delete(id).await;
        Ok(true)
    }

    // == Repair ==
    /// Clears `hasImage` on entries whose photo is missing from the cache.
    /// Entries whose lookup failed are left alone. Returns how many changed.
    ///
    /// Image lookups run without the write lock; the log is then re-read
    /// under it so entries added or removed meanwhile are kept as they are.
    pub async fn repair_images(&self) -> Result<usize> {
        let mut missing = HashSet::new();
        for entry in self.records.discoveries().await? {
            if entry.has_image && self.images.get(entry.id).await.is_none() {
                missing.insert(entry.id);
            }
        }
        if missing.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;
        let mut entries = self.records.discoveries().await?;
        let mut repaired = 0;
        for entry in entries
            .iter_mut()
            .filter(|entry| entry.has_image && missing.contains(&entry.id))
        {
            entry.has_image = false;
            repaired += 1;
        }

        if repaired > 0 {
            self.records.set_discoveries(&entries).await?;
            info!("Cleared hasImage on {} discovery entries", repaired);
        }
        Ok(repaired)
    }
}
