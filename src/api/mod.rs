//! API Module
//!
//! HTTP handlers and routing for the portal's cache and security endpoints.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/cache/stats` - Cache statistics
//! - `DELETE /api/cache/users/:user_id` - Drop a user's cached data
//! - `POST /api/auth/login` - Gate a login attempt
//! - `POST /api/auth/password/validate` - Check password strength
//! - `POST /api/sessions` - Register a session
//! - `POST /api/sessions/validate` - Validate a session
//! - `DELETE /api/sessions/:session_id` - Destroy a session
//! - `GET /api/security/dashboard` - Security summary
//! - `POST /api/security/alerts/:id/resolve` - Resolve an alert

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
