//! Currency amounts and the fixed platform charges applied to every order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat fee paid to the rider for a delivery.
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Flat fee retained by the platform on every order.
pub const DEFAULT_PLATFORM_FEE: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Fixed charges stamped onto an order when it is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub delivery_fee: Decimal,
    pub platform_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            delivery_fee: DEFAULT_DELIVERY_FEE,
            platform_fee: DEFAULT_PLATFORM_FEE,
        }
    }
}
