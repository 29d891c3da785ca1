//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Image repair: clears `hasImage` on discovery entries whose photo is gone

mod repair;

pub use repair::spawn_repair_task;
