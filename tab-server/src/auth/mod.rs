//! Authentication and authorization
//!
//! - [`JwtService`] - token issue and validation
//! - [`CurrentUser`] - authenticated request context
//! - [`require_auth`] / [`require_admin`] - middleware
//! - [`oauth`] - federated identity provider
//! - [`session`] - token → user resolution, login completion

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod session;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
