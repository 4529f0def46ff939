//! Background Tasks Module
//!
//! Contains the periodic sweep shared by the cache and the security engine.
//!
//! # Tasks
//! - Cache sweep: removes expired cache entries
//! - Security sweep: expires sessions, lockouts and rate-limit blocks

mod sweep;

pub use sweep::{spawn_periodic, SweepHandle};
