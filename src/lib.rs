//! BioQuartier - offline-first species spotting companion
//!
//! Serves the app's static assets from a versioned cache snapshot, keeps the
//! user's favorites, discovery log and photos, and proxies species search
//! and plant identification.

pub mod api;
pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod imaging;
pub mod models;
pub mod remote;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_repair_task;
