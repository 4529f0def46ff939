//! Request and Response models for the HTTP surface
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{LoginAttemptRequest, PasswordRequest, SessionRequest};
pub use responses::{
    DashboardResponse, HealthResponse, InvalidateResponse, LoginAttemptResponse,
    ResolveAlertResponse, SessionResponse, SessionValidationResponse,
};
