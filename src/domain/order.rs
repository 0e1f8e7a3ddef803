use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CartItem, Location};

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// DELIVERED and CANCELLED accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The single forward step allowed from this status.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::ReadyForPickup),
            OrderStatus::ReadyForPickup => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == OrderStatus::Cancelled || self.next() == Some(target)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

/// A customer's rating of a delivered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: String,
    pub timestamp: i64,
}

/// Rider details attached to an order on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderAssignment {
    pub rider_id: String,
    pub rider_name: String,
    pub rider_phone: String,
}

/// Proof that the delivery's cash was booked against the rider's ledger.
///
/// Written in the same step that moves the order to DELIVERED; its presence
/// prevents the charge from ever being applied twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub rider_id: String,
    pub amount: Decimal,
    pub settled_at: i64,
}

/// The central transactional entity.
///
/// Items and money are snapshots taken at placement and never change. Every
/// other mutation goes through the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) id: String,
    pub(crate) customer_id: String,
    pub(crate) restaurant_id: String,
    pub(crate) restaurant_name: String,
    pub(crate) items: Vec<CartItem>,
    pub(crate) item_total: Decimal,
    pub(crate) delivery_fee: Decimal,
    pub(crate) platform_fee: Decimal,
    pub(crate) total: Decimal,
    pub(crate) status: OrderStatus,
    pub(crate) timestamp: i64,
    pub(crate) delivery_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delivery_location: Option<Location>,
    #[serde(default)]
    pub(crate) payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) rider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) rider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) rider_phone: Option<String>,
    #[serde(default)]
    pub(crate) rider_arrived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) settlement: Option<SettlementRecord>,
}

impl Order {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn restaurant_id(&self) -> &str {
        &self.restaurant_id
    }

    pub fn restaurant_name(&self) -> &str {
        &self.restaurant_name
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item_total(&self) -> Decimal {
        self.item_total
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    pub fn platform_fee(&self) -> Decimal {
        self.platform_fee
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Placement time in epoch milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }

    pub fn delivery_location(&self) -> Option<Location> {
        self.delivery_location
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn rider_id(&self) -> Option<&str> {
        self.rider_id.as_deref()
    }

    pub fn rider(&self) -> Option<RiderAssignment> {
        Some(RiderAssignment {
            rider_id: self.rider_id.clone()?,
            rider_name: self.rider_name.clone().unwrap_or_default(),
            rider_phone: self.rider_phone.clone().unwrap_or_default(),
        })
    }

    pub fn rider_arrived(&self) -> bool {
        self.rider_arrived
    }

    pub fn estimated_time(&self) -> Option<&str> {
        self.estimated_time.as_deref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn settlement(&self) -> Option<&SettlementRecord> {
        self.settlement.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Cash the rider hands over to the platform: everything except their fee.
    pub fn platform_share(&self) -> Decimal {
        self.total - self.delivery_fee
    }
}
