use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::Restaurant;

/// The capability a user acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    None,
    Customer,
    Restaurant,
    Rider,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::None => "none",
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Rider => "rider",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Represents any actor of the platform: customer, restaurant owner, rider or admin.
///
/// Role specific fields are optional. `amount_owed` and `is_suspended` form the
/// rider's ledger and are only ever changed by the ledger module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "non_negative", skip_serializing_if = "Decimal::is_zero")]
    pub(crate) amount_owed: Decimal,
    #[serde(default)]
    pub(crate) is_suspended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_details: Option<Restaurant>,
}

/// A rider can never be owed money by the platform, so a negative stored
/// balance loads as zero.
fn non_negative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(<Decimal as Deserialize>::deserialize(deserializer)?.max(Decimal::ZERO))
}

impl User {
    fn base(id: impl Into<String>, role: Role, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            name: name.into(),
            phone: phone.into(),
            email: String::new(),
            address: None,
            location: None,
            amount_owed: Decimal::ZERO,
            is_suspended: false,
            restaurant_details: None,
        }
    }

    /// A customer with the delivery address picked on the map.
    pub fn customer(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
        location: Location,
    ) -> Self {
        let mut user = Self::base(id, Role::Customer, name, phone);
        user.address = Some(address.into());
        user.location = Some(location);
        user
    }

    /// A rider with a clean ledger.
    pub fn rider(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self::base(id, Role::Rider, name, phone)
    }

    /// A restaurant owner registering the given storefront.
    pub fn restaurant_owner(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        restaurant: Restaurant,
    ) -> Self {
        let mut user = Self::base(id, Role::Restaurant, name, phone);
        user.restaurant_details = Some(restaurant);
        user
    }

    pub fn admin(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::base(id, Role::Admin, name, "")
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn is_rider(&self) -> bool {
        self.role == Role::Rider
    }

    /// Amount the rider owes the platform from cash collected on delivery.
    pub fn amount_owed(&self) -> Decimal {
        self.amount_owed
    }

    /// Administrative suspension, independent of the debt limit.
    pub fn is_suspended(&self) -> bool {
        self.is_suspended
    }

    /// Id of the restaurant this owner manages, if any.
    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_details.as_ref().map(|r| r.id.as_str())
    }
}
