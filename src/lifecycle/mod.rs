//! Order lifecycle engine.
//!
//! Pure state-transition logic: every function takes the current order plus a
//! request and either returns the new state (with any ledger effect described
//! in the outcome) or rejects without touching the order. No storage here.
//!
//! ```text
//! PENDING -> PREPARING -> READY_FOR_PICKUP -> OUT_FOR_DELIVERY -> DELIVERED
//!    \___________\______________\__________________\-----------> CANCELLED
//! ```

mod engine;
mod placement;

pub use engine::*;
pub use placement::*;
