//! Order lifecycle and rider ledger for a cash-on-delivery food platform.
//!
//! All writes go through a single [`service::DispatchService`] actor reached
//! with a [`client::DispatchClient`]. [`session::Session`] wraps a client
//! with one user's identity, cart and latest snapshot.

pub mod advisor;
pub mod app_system;
pub mod client;
pub mod domain;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod location;
pub mod messages;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, AppConfig, DispatchSystem};
pub use client::DispatchClient;
pub use error::DispatchError;
pub use session::Session;
