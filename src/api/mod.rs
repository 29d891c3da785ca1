//! API Module
//!
//! HTTP handlers and routing for the companion REST API, the event
//! dispatcher and the fetch interception fallback.

pub mod events;
pub mod fetch;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
