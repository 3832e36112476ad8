// ABOUTME: HTTP server for postview, serving htmx post pages, a JSON API, and SSE view streams.
// ABOUTME: Each open post page is a mounted controller session held in a bounded registry.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod routes;
pub mod sessions;
pub mod web;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, PostviewConfig, StoreKind};
pub use routes::create_router;
pub use sessions::SessionRegistry;
