//! Location logger.
//!
//! A small web service that collects browser geolocation fixes and exposes them
//! through a JSON listing and an HTML table.
//!
//! Run the server with
//! ```not_rust
//! cargo run
//! ```
//!
//! then open the landing page
//! ```not_rust
//! firefox http://localhost:8000
//! ```
//!
//! Configuration comes from `config/default.toml` and `LOCATION_LOGGER__*`
//! environment variables, see [`config::AppConfig`].
//!
//! The read views (`/admin/locations`, `/view-locations`) are open unless
//! `admin.jwt_secret` is set. Do not expose an unguarded instance publicly.
//! Tokens are HS256 JWTs signed with that secret and carrying `sub`, `iat`
//! and `exp` claims ([`jwt_auth::TokenClaims`]); mint them with any JWT tool.

pub mod config;
pub mod handlers;
pub mod jwt_auth;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod security_headers;
pub mod state;
pub mod store;
pub mod views;
