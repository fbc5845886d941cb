//! Data models
//!
//! Shared between tab-server and its clients (via API and the realtime feed).
//! Plain row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! rows with money go through repository row structs (amounts are stored as cents).
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod category;
pub mod client;
pub mod product;
pub mod tab;
pub mod transaction;
pub mod user;

// Re-exports
pub use category::*;
pub use client::*;
pub use product::*;
pub use tab::*;
pub use transaction::*;
pub use user::*;
