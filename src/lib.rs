//! prodguard - TTL cache and security heuristics for the production reporting portal
//!
//! Provides a capacity-bounded TTL cache for user profiles and report listings,
//! plus login, session and rate-limit gating with risk-scored event logging.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod security;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::Config;
pub use error::{Error, Result};
pub use security::SecurityEngine;
