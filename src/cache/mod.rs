//! Cache Module
//!
//! Partitioned response storage, the versioned static asset snapshot and
//! the user image cache.

pub mod gc;
mod images;
pub mod manifest;
pub mod network;
mod response;
mod stats;
pub mod storage;
mod worker;


// Re-export public types
pub use images::{image_path, ImageCache, ImageInput, StoredImage, PLACEHOLDER_IMAGE};
pub use manifest::default_manifest;
pub use network::{Network, OriginNetwork};
pub use response::StoredResponse;
pub use stats::FetchStats;
pub use storage::{CacheStorage, FileCacheStorage, MemoryCacheStorage};
pub use worker::{cache_key, AssetWorker, InstallReport, Served, ServedFrom, WorkerState};

// == Public Constants ==
/// Partition holding user photos; never purged by a version bump.
pub const USER_IMAGE_PARTITION: &str = "bioquartier-user-images";
