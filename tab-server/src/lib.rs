//! Tab Server - bar tab ("comanda") backend
//!
//! # Architecture
//!
//! - **Tabs** (`tabs`): explicit status machine plus item commands
//! - **Ledger** (`ledger`): tab totals and client credit balances
//! - **Live** (`live`): WebSocket fan-out with per-tab rooms
//! - **Auth** (`auth`): federated login, JWT, per-request user reload
//! - **HTTP API** (`api`): JSON routes per resource
//!
//! ```text
//! tab-server/src/
//! ├── core/          # config, state, server, errors
//! ├── auth/          # JWT, OAuth provider, middleware
//! ├── db/            # SQLite pool and repositories
//! ├── ledger/        # money, totals, balances
//! ├── tabs/          # state machine and commands
//! ├── live/          # hub and socket sessions
//! ├── api/           # routers and handlers
//! └── utils/         # logger, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod live;
pub mod tabs;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use shared::error::{AppError, AppResult};

/// Security audit log under the `security` target
///
/// ```ignore
/// security_log!("WARN", "auth_failed", user_id = 7, uri = "/api/tabs");
/// ```
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Install the global logger described by `config`
pub fn setup_environment(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    utils::logger::init_logger(
        &config.log_level,
        !config.is_development(),
        config.log_dir.as_deref(),
    )
}
