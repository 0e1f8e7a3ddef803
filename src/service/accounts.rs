use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{find_user, require_admin, DispatchService};
use crate::domain::{MenuItem, MenuItemDraft, Restaurant, Role, User, VerificationStatus};
use crate::entity::{position_of, upsert, Entity, RestaurantAction};
use crate::error::{DispatchError, LedgerError, RestaurantError};
use crate::ledger::LedgerAction;
use crate::messages::ServiceResult;
use crate::store::CollectionKey;

impl DispatchService {
    /// Upserts the user and makes it the active identity.
    ///
    /// A login can never rewrite a rider's ledger or a restaurant's approval
    /// state: both are taken from the stored records. Storefronts seen for
    /// the first time start out Pending.
    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub(super) async fn handle_login(&self, user: User) -> ServiceResult<User> {
        if user.role == Role::None {
            return Err(DispatchError::InvalidRequest("a role must be chosen before login".to_string()));
        }
        if user.id.trim().is_empty() {
            return Err(DispatchError::InvalidRequest("a user id is required".to_string()));
        }

        let users_before = self.load_users().await?;
        let mut merged = user;
        match users_before.iter().find(|u| u.id == merged.id) {
            Some(existing) if existing.role != merged.role => {
                warn!(stored_role = %existing.role, "Login with a different role rejected");
                return Err(DispatchError::Unauthorized(format!(
                    "{} is registered as {}",
                    existing.id, existing.role
                )));
            }
            Some(existing) => {
                merged.amount_owed = existing.amount_owed;
                merged.is_suspended = existing.is_suspended;
            }
            None => {
                merged.amount_owed = Decimal::ZERO;
                merged.is_suspended = false;
            }
        }

        let restaurants_before: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        let mut restaurants_after = restaurants_before.clone();
        if merged.role == Role::Restaurant {
            if let Some(submitted) = merged.restaurant_details.take() {
                let stored = match position_of(&restaurants_after, &submitted.id) {
                    Some(idx) => {
                        restaurants_after[idx].merge_profile(&submitted);
                        restaurants_after[idx].clone()
                    }
                    None => {
                        let mut fresh = submitted;
                        fresh.is_verified = VerificationStatus::Pending;
                        info!(restaurant_id = %fresh.id, "New restaurant registered, awaiting approval");
                        restaurants_after.push(fresh.clone());
                        fresh
                    }
                };
                merged.restaurant_details = Some(stored);
            } else {
                let known = users_before
                    .iter()
                    .find(|u| u.id == merged.id)
                    .and_then(User::restaurant_id)
                    .and_then(|id| restaurants_after.iter().find(|r| r.id == id));
                merged.restaurant_details = known.cloned();
            }
        } else {
            merged.restaurant_details = None;
        }

        let mut users_after = users_before.clone();
        upsert(&mut users_after, merged.clone());

        self.commit_pair(
            CollectionKey::Restaurants,
            &restaurants_before,
            &restaurants_after,
            CollectionKey::Users,
            &users_after,
        )
        .await?;
        self.collections.set_current_user(Some(&merged)).await?;

        info!("User logged in");
        Ok(merged)
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_logout(&self) -> ServiceResult<()> {
        self.collections.set_current_user(None).await?;
        info!("User logged out");
        Ok(())
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_get_user(&self, id: String) -> ServiceResult<Option<User>> {
        debug!("Processing get user request");
        let users: Vec<User> = self.collections.load_all(CollectionKey::Users).await;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_settle_debt(&self, admin_id: String, rider_id: String) -> ServiceResult<User> {
        self.apply_ledger(&admin_id, &rider_id, LedgerAction::Settle).await
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_set_suspended(
        &self,
        admin_id: String,
        rider_id: String,
        suspended: bool,
    ) -> ServiceResult<User> {
        self.apply_ledger(&admin_id, &rider_id, LedgerAction::SetSuspended(suspended))
            .await
    }

    async fn apply_ledger(&self, admin_id: &str, rider_id: &str, action: LedgerAction) -> ServiceResult<User> {
        let mut users = self.load_users().await?;
        require_admin(&users, admin_id)?;

        let idx = position_of(&users, rider_id).ok_or_else(|| LedgerError::NotFound(rider_id.to_string()))?;
        let outcome = users[idx].handle_action(action)?;
        self.collections.save_all(CollectionKey::Users, &users).await?;

        info!(?outcome, "Rider ledger updated");
        Ok(users.swap_remove(idx))
    }

    /// Approves or rejects a storefront and mirrors the status into its owner.
    #[instrument(skip(self))]
    pub(super) async fn handle_set_verification(
        &self,
        admin_id: String,
        restaurant_id: String,
        status: VerificationStatus,
    ) -> ServiceResult<Restaurant> {
        let users_before = self.load_users().await?;
        require_admin(&users_before, &admin_id)?;

        let mut restaurants: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        let idx = position_of(&restaurants, &restaurant_id)
            .ok_or_else(|| RestaurantError::NotFound(restaurant_id.clone()))?;
        restaurants[idx].handle_action(RestaurantAction::SetVerification(status))?;
        let restaurant = restaurants[idx].clone();

        let mut users_after = users_before.clone();
        mirror_into_owners(&mut users_after, &restaurant);

        self.commit_pair(
            CollectionKey::Users,
            &users_before,
            &users_after,
            CollectionKey::Restaurants,
            &restaurants,
        )
        .await?;

        info!(%status, "Restaurant verification changed");
        Ok(restaurant)
    }

    #[instrument(skip(self, draft), fields(dish = %draft.name))]
    pub(super) async fn handle_add_menu_item(&self, owner_id: String, draft: MenuItemDraft) -> ServiceResult<MenuItem> {
        let users_before = self.load_users().await?;
        let owner = find_user(&users_before, &owner_id)?;
        let restaurant_id = match (owner.role, owner.restaurant_id()) {
            (Role::Restaurant, Some(id)) => id.to_string(),
            _ => {
                return Err(DispatchError::Unauthorized(format!(
                    "{} does not manage a restaurant",
                    owner.id
                )))
            }
        };

        let mut restaurants: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        let idx = position_of(&restaurants, &restaurant_id)
            .ok_or_else(|| RestaurantError::NotFound(restaurant_id.clone()))?;

        let suffix = Uuid::new_v4().simple().to_string();
        let item = MenuItem::new(format!("m-{}", &suffix[..6]), draft.name.trim(), draft.price, draft.category)
            .with_description(draft.description)
            .with_image(draft.image);
        restaurants[idx]
            .handle_action(RestaurantAction::AddMenuItem(item.clone()))
            .inspect_err(|e| warn!(error = %e, "Menu item rejected"))?;

        let mut users_after = users_before.clone();
        mirror_into_owners(&mut users_after, &restaurants[idx]);

        self.commit_pair(
            CollectionKey::Users,
            &users_before,
            &users_after,
            CollectionKey::Restaurants,
            &restaurants,
        )
        .await?;

        info!(item_id = %item.id, %restaurant_id, "Menu item added");
        Ok(item)
    }
}

fn mirror_into_owners(users: &mut [User], restaurant: &Restaurant) {
    for user in users
        .iter_mut()
        .filter(|u| u.restaurant_id() == Some(restaurant.id.as_str()))
    {
        user.restaurant_details = Some(restaurant.clone());
    }
}
