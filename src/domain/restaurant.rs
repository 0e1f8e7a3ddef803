use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Location;

/// Admin approval state of a storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        };
        f.write_str(name)
    }
}

// Catalog records written before verification existed carry no status.
fn legacy_verification() -> VerificationStatus {
    VerificationStatus::Approved
}

/// A dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            image: String::new(),
            category: category.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// What a restaurant owner submits to add a dish. The id is assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
}

/// A menu-bearing storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub delivery_time: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default = "legacy_verification")]
    pub(crate) is_verified: VerificationStatus,
}

impl Restaurant {
    /// A newly registered storefront, awaiting admin approval.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            rating: 0.0,
            delivery_time: String::new(),
            categories: Vec::new(),
            menu: Vec::new(),
            owner_name: None,
            email: None,
            phone: None,
            address: None,
            location: None,
            is_verified: VerificationStatus::Pending,
        }
    }

    pub fn with_menu(mut self, menu: Vec<MenuItem>) -> Self {
        self.menu = menu;
        self
    }

    pub fn with_delivery_time(mut self, delivery_time: impl Into<String>) -> Self {
        self.delivery_time = delivery_time.into();
        self
    }

    pub fn verification(&self) -> VerificationStatus {
        self.is_verified
    }

    /// Order management is only available to approved storefronts.
    pub fn is_approved(&self) -> bool {
        self.is_verified == VerificationStatus::Approved
    }

    pub fn menu_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.menu.iter().find(|m| m.id == item_id)
    }

    /// Copies the profile fields an owner may edit, keeping menu and approval state.
    pub(crate) fn merge_profile(&mut self, submitted: &Restaurant) {
        self.name = submitted.name.clone();
        self.image = submitted.image.clone();
        self.delivery_time = submitted.delivery_time.clone();
        self.categories = submitted.categories.clone();
        self.owner_name = submitted.owner_name.clone();
        self.email = submitted.email.clone();
        self.phone = submitted.phone.clone();
        self.address = submitted.address.clone();
        self.location = submitted.location;
    }
}
