//! HTTP surface of the atlas inventory service.
//!
//! Request flow: the auth middleware classifies the path, validates the
//! bearer token, and attaches an [`auth::AuthContext`]; role guards run per
//! route; handlers acquire a tenant-bound database session from [`state`] and
//! run their queries through the repositories in `atlas-db`.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod metrics;
pub mod password;
pub mod setup;
pub mod state;
pub mod telemetry;
