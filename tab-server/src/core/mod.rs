//! Core: configuration, shared state, server lifecycle and startup errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ServerError, ServerResult};
pub use server::Server;
pub use state::ServerState;
