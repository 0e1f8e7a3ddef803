use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::domain::{Order, Restaurant, User};
use crate::store::CollectionKey;

/// Trait that every stored record implements so the dispatch service can load
/// it, run a domain action on it, and write its collection back.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Action: Send + Debug;
    type Outcome: Send + Debug;
    type Error: std::error::Error + Send;

    /// Collection the entity is persisted in.
    const COLLECTION: CollectionKey;

    fn id(&self) -> &str;

    /// Apply a domain action. On error the entity must be left untouched.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::Outcome, Self::Error>;
}

/// Finds an entity by id in a loaded collection.
pub fn position_of<T: Entity>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Replaces the entity with the same id, or appends it.
pub fn upsert<T: Entity>(items: &mut Vec<T>, entity: T) {
    match position_of(items, entity.id()) {
        Some(idx) => items[idx] = entity,
        None => items.push(entity),
    }
}

impl Entity for Order {
    type Action = crate::lifecycle::OrderAction;
    type Outcome = crate::lifecycle::OrderOutcome;
    type Error = crate::error::OrderError;

    const COLLECTION: CollectionKey = CollectionKey::Orders;

    fn id(&self) -> &str {
        &self.id
    }

    fn handle_action(&mut self, action: Self::Action) -> Result<Self::Outcome, Self::Error> {
        crate::lifecycle::apply(self, action)
    }
}

impl Entity for User {
    type Action = crate::ledger::LedgerAction;
    type Outcome = crate::ledger::LedgerOutcome;
    type Error = crate::error::LedgerError;

    const COLLECTION: CollectionKey = CollectionKey::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn handle_action(&mut self, action: Self::Action) -> Result<Self::Outcome, Self::Error> {
        crate::ledger::apply(self, action)
    }
}

/// Administrative and owner actions on a storefront.
#[derive(Debug, Clone)]
pub enum RestaurantAction {
    SetVerification(crate::domain::VerificationStatus),
    AddMenuItem(crate::domain::MenuItem),
}

impl Entity for Restaurant {
    type Action = RestaurantAction;
    type Outcome = ();
    type Error = crate::error::RestaurantError;

    const COLLECTION: CollectionKey = CollectionKey::Restaurants;

    fn id(&self) -> &str {
        &self.id
    }

    fn handle_action(&mut self, action: RestaurantAction) -> Result<(), Self::Error> {
        use crate::error::RestaurantError;
        match action {
            RestaurantAction::SetVerification(status) => {
                self.is_verified = status;
                Ok(())
            }
            RestaurantAction::AddMenuItem(item) => {
                if !self.is_approved() {
                    return Err(RestaurantError::NotApproved(self.id.clone()));
                }
                if item.name.trim().is_empty() {
                    return Err(RestaurantError::ValidationError("Dish name required".to_string()));
                }
                if item.price <= rust_decimal::Decimal::ZERO {
                    return Err(RestaurantError::ValidationError(format!(
                        "Price must be positive, got {}",
                        item.price
                    )));
                }
                if self.menu_item(&item.id).is_some() {
                    return Err(RestaurantError::ValidationError(format!("Duplicate menu item {}", item.id)));
                }
                self.menu.push(item);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MenuItem, VerificationStatus};
    use crate::error::RestaurantError;
    use rust_decimal::Decimal;

    #[test]
    fn test_menu_edits_require_approval() {
        let mut restaurant = Restaurant::new("r9", "Night Kitchen");
        let soup = MenuItem::new("m9", "Soup", Decimal::from(300), "Mains");

        let result = restaurant.handle_action(RestaurantAction::AddMenuItem(soup.clone()));
        assert_eq!(result, Err(RestaurantError::NotApproved("r9".to_string())));

        restaurant
            .handle_action(RestaurantAction::SetVerification(VerificationStatus::Approved))
            .unwrap();
        restaurant.handle_action(RestaurantAction::AddMenuItem(soup)).unwrap();
        assert_eq!(restaurant.menu.len(), 1);
    }

    #[test]
    fn test_menu_item_price_must_be_positive() {
        let mut restaurant = Restaurant::new("r9", "Night Kitchen");
        restaurant.is_verified = VerificationStatus::Approved;
        let free = MenuItem::new("m9", "Water", Decimal::ZERO, "Drinks");
        assert!(matches!(
            restaurant.handle_action(RestaurantAction::AddMenuItem(free)),
            Err(RestaurantError::ValidationError(_))
        ));
        assert!(restaurant.menu.is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut users = vec![User::rider("rider_1", "Bilal", "0300")];
        upsert(&mut users, User::rider("rider_1", "Bilal K", "0300"));
        upsert(&mut users, User::rider("rider_2", "Sana", "0301"));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Bilal K");
    }
}
