//! Shared types for the tab server
//!
//! Domain models and request payloads, the realtime feed protocol,
//! and the error types used across the server and its clients.

pub mod error;
pub mod live;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
