//! Store Module
//!
//! Key-value persistence and the JSON records kept in it.

mod kv;
mod records;

pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use records::{Records, DISCOVERIES_KEY, FAVORITES_KEY, POSITION_KEY, RESULTS_KEY};
