//! Core domain crate for the atlas inventory service.
//!
//! Holds the configuration, the error taxonomy shared by every layer, and the
//! domain models. Nothing in here touches the network; the HTTP surface lives
//! in `atlas-api` and the persistence layer in `atlas-db`.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, LogLevel};
