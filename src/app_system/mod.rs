//! System orchestration, configuration, startup, and shutdown logic.

pub mod config;
pub mod dispatch_system;
pub mod tracing;

pub use config::*;
pub use dispatch_system::*;
pub use self::tracing::*;
