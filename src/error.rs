use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{OrderStatus, VerificationStatus};

/// Why a rider may not accept new jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionReason {
    DebtLimitExceeded { owed: Decimal, limit: Decimal },
    Suspended,
}

impl std::fmt::Display for RestrictionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestrictionReason::DebtLimitExceeded { owed, limit } => {
                write!(f, "owes {} which is above the limit of {}", owed, limit)
            }
            RestrictionReason::Suspended => f.write_str("suspended by an administrator"),
        }
    }
}

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order {0} already has a rider")]
    AlreadyAssigned(String),
    #[error("Order {0} has no rider assigned")]
    NoRiderAssigned(String),
    #[error("Rider {rider_id} is restricted: {reason}")]
    RiderRestricted {
        rider_id: String,
        reason: RestrictionReason,
    },
    #[error("Order {0} has already been settled")]
    AlreadySettled(String),
    #[error("Feedback is only accepted once the order is delivered (status {0})")]
    FeedbackNotAllowed(OrderStatus),
    #[error("Feedback already recorded for order {0}")]
    FeedbackAlreadyPresent(String),
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,
    #[error("Invalid quantity for item {0}")]
    InvalidQuantity(String),
    #[error("Restaurant {id} is not approved ({status})")]
    RestaurantNotApproved {
        id: String,
        status: VerificationStatus,
    },
    #[error("Order validation error: {0}")]
    ValidationError(String),
}

/// Errors raised by rider ledger operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Rider not found: {0}")]
    NotFound(String),
    #[error("User {0} is not a rider")]
    NotARider(String),
    #[error("Settlement for rider {expected} applied to {actual}")]
    WrongRider { expected: String, actual: String },
}

/// Errors raised by restaurant operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RestaurantError {
    #[error("Restaurant not found: {0}")]
    NotFound(String),
    #[error("Restaurant {0} is not approved")]
    NotApproved(String),
    #[error("Restaurant validation error: {0}")]
    ValidationError(String),
}

/// Errors from the persistence adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Everything a caller of the dispatch service can get back.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Restaurant(#[from] RestaurantError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("No user is logged in")]
    NotLoggedIn,
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl DispatchError {
    /// True when the rejection is about the rider rather than the order.
    pub fn is_restricted(&self) -> bool {
        matches!(self, DispatchError::Order(OrderError::RiderRestricted { .. }))
    }
}
