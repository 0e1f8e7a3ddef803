//! The dispatch service: the one actor allowed to write the store.
//!
//! Requests are handled strictly one after another. Each handler reads the
//! collections it needs, runs the pure lifecycle or ledger step, and writes
//! whole collections back, so no other request can observe a half-applied
//! change. Separate processes sharing a [`crate::store::FileStore`] still
//! follow last-write-wins on whole collections.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::client::DispatchClient;
use crate::domain::{FeeSchedule, User};
use crate::error::{DispatchError, StorageError};
use crate::ledger::LedgerPolicy;
use crate::messages::{DispatchRequest, ServiceResult, Snapshot};
use crate::store::{CollectionKey, Collections};

mod accounts;
mod orders;

pub struct DispatchService {
    receiver: mpsc::Receiver<DispatchRequest>,
    collections: Collections,
    fees: FeeSchedule,
    policy: LedgerPolicy,
}

impl DispatchService {
    pub fn new(
        buffer_size: usize,
        collections: Collections,
        fees: FeeSchedule,
        policy: LedgerPolicy,
    ) -> (Self, DispatchClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            collections,
            fees,
            policy,
        };
        (service, DispatchClient::new(sender))
    }

    /// Main actor loop. Stops on `Shutdown` or when every client is dropped.
    #[instrument(name = "dispatch_service", skip(self))]
    pub async fn run(mut self) {
        info!("DispatchService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                DispatchRequest::Login { user, respond_to } => {
                    let _ = respond_to.send(self.handle_login(user).await);
                }
                DispatchRequest::Logout { respond_to } => {
                    let _ = respond_to.send(self.handle_logout().await);
                }
                DispatchRequest::Refresh { respond_to } => {
                    let _ = respond_to.send(self.handle_refresh().await);
                }
                DispatchRequest::GetOrder { id, respond_to } => {
                    let _ = respond_to.send(self.handle_get_order(id).await);
                }
                DispatchRequest::GetUser { id, respond_to } => {
                    let _ = respond_to.send(self.handle_get_user(id).await);
                }
                DispatchRequest::PlaceOrder {
                    customer_id,
                    restaurant_id,
                    items,
                    respond_to,
                } => {
                    let result = self.handle_place_order(customer_id, restaurant_id, items).await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::AdvanceStatus {
                    actor_id,
                    order_id,
                    to,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_advance_status(actor_id, order_id, to).await);
                }
                DispatchRequest::AssignRider {
                    rider_id,
                    order_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_assign_rider(rider_id, order_id).await);
                }
                DispatchRequest::MarkArrived {
                    rider_id,
                    order_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_mark_arrived(rider_id, order_id).await);
                }
                DispatchRequest::AttachFeedback {
                    customer_id,
                    order_id,
                    rating,
                    comment,
                    respond_to,
                } => {
                    let result = self
                        .handle_attach_feedback(customer_id, order_id, rating, comment)
                        .await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::SettleDebt {
                    admin_id,
                    rider_id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_settle_debt(admin_id, rider_id).await);
                }
                DispatchRequest::SetSuspended {
                    admin_id,
                    rider_id,
                    suspended,
                    respond_to,
                } => {
                    let result = self.handle_set_suspended(admin_id, rider_id, suspended).await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::SetVerification {
                    admin_id,
                    restaurant_id,
                    status,
                    respond_to,
                } => {
                    let result = self.handle_set_verification(admin_id, restaurant_id, status).await;
                    let _ = respond_to.send(result);
                }
                DispatchRequest::AddMenuItem {
                    owner_id,
                    draft,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.handle_add_menu_item(owner_id, draft).await);
                }
                DispatchRequest::Shutdown => {
                    info!("DispatchService shutting down");
                    break;
                }
            }
        }

        info!("DispatchService stopped");
    }

    #[instrument(skip(self))]
    async fn handle_refresh(&self) -> ServiceResult<Snapshot> {
        debug!("Processing refresh request");
        let snapshot = Snapshot {
            users: self.collections.load_all(CollectionKey::Users).await,
            orders: self.collections.load_all(CollectionKey::Orders).await,
            restaurants: self.collections.load_all(CollectionKey::Restaurants).await,
            current_user: self.collections.current_user().await,
        };
        debug!(
            users = snapshot.users.len(),
            orders = snapshot.orders.len(),
            restaurants = snapshot.restaurants.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Strict read for paths that write back: a collection that cannot be
    /// read must never be saved over.
    async fn load_users(&self) -> Result<Vec<User>, StorageError> {
        self.collections.try_load_all(CollectionKey::Users).await
    }

    /// Writes two collections as one change. If the second write fails the
    /// first collection is restored so neither change becomes visible.
    async fn commit_pair<A: Serialize, B: Serialize>(
        &self,
        first_key: CollectionKey,
        first_before: &[A],
        first_after: &[A],
        second_key: CollectionKey,
        second_after: &[B],
    ) -> Result<(), StorageError> {
        self.collections.save_all(first_key, first_after).await?;
        if let Err(e) = self.collections.save_all(second_key, second_after).await {
            error!(collection = %second_key, error = %e, "Second write failed, restoring first collection");
            if let Err(restore) = self.collections.save_all(first_key, first_before).await {
                error!(collection = %first_key, error = %restore, "Failed to restore collection");
            }
            return Err(e);
        }
        Ok(())
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn find_user<'a>(users: &'a [User], id: &str) -> Result<&'a User, DispatchError> {
    users
        .iter()
        .find(|u| u.id == id)
        .ok_or_else(|| DispatchError::UserNotFound(id.to_string()))
}

fn require_admin(users: &[User], admin_id: &str) -> Result<(), DispatchError> {
    let admin = find_user(users, admin_id)?;
    if admin.role != crate::domain::Role::Admin {
        return Err(DispatchError::Unauthorized(format!(
            "{} is a {}, admin required",
            admin.id, admin.role
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CartItem, Location, OrderStatus};
    use crate::store::{catalog, BlobStore, MemoryStore};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store whose order writes and user reads can be made to fail.
    struct FlakyStore {
        inner: MemoryStore,
        fail_orders: AtomicBool,
        fail_user_reads: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_orders: AtomicBool::new(false),
                fail_user_reads: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl BlobStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == CollectionKey::Users.storage_key() && self.fail_user_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Backend("read timed out".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            if key == CollectionKey::Orders.storage_key() && self.fail_orders.load(Ordering::SeqCst) {
                return Err(StorageError::Backend("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_order_write_rolls_back_rider_charge() {
        let store = Arc::new(FlakyStore::new());
        let collections = Collections::new(store.clone());
        collections.initialize().await.unwrap();

        let (service, client) =
            DispatchService::new(8, collections, FeeSchedule::default(), LedgerPolicy::default());
        let handle = tokio::spawn(service.run());

        let burger_house = catalog::default_restaurants().remove(0);
        let burger = burger_house.menu[0].clone();
        client
            .login(User::customer("cust_1", "Ayesha", "0301", "Gulberg III, Street 1, House 59", Location::new(31.5204, 74.3587)))
            .await
            .unwrap();
        client
            .login(User::restaurant_owner("owner_1", "Hamza", "0302", burger_house.clone()))
            .await
            .unwrap();
        client.login(User::rider("rider_1", "Bilal", "0303")).await.unwrap();

        let order = client
            .place_order("cust_1".into(), burger_house.id.clone(), vec![CartItem::new(burger, 2)])
            .await
            .unwrap();
        let id = order.id().to_string();
        client.advance_status("owner_1".into(), id.clone(), OrderStatus::Preparing).await.unwrap();
        client.advance_status("owner_1".into(), id.clone(), OrderStatus::ReadyForPickup).await.unwrap();
        client.assign_rider("rider_1".into(), id.clone()).await.unwrap();
        client.advance_status("rider_1".into(), id.clone(), OrderStatus::OutForDelivery).await.unwrap();

        store.fail_orders.store(true, Ordering::SeqCst);
        let result = client.advance_status("rider_1".into(), id.clone(), OrderStatus::Delivered).await;
        assert!(matches!(result, Err(DispatchError::Storage(_))));

        let rider = client.get_user("rider_1".into()).await.unwrap().unwrap();
        assert_eq!(rider.amount_owed(), Decimal::ZERO);
        let stored = client.get_order(id.clone()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::OutForDelivery);
        assert!(stored.settlement().is_none());

        store.fail_orders.store(false, Ordering::SeqCst);
        let delivered = client.advance_status("rider_1".into(), id, OrderStatus::Delivered).await.unwrap();
        let rider = client.get_user("rider_1".into()).await.unwrap().unwrap();
        assert_eq!(rider.amount_owed(), delivered.total() - delivered.delivery_fee());

        client.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreadable_users_are_never_overwritten() {
        let store = Arc::new(FlakyStore::new());
        let collections = Collections::new(store.clone());
        collections.initialize().await.unwrap();

        let mut indebted = User::rider("rider_1", "Bilal", "0303");
        indebted.amount_owed = Decimal::from(6000);
        let seeded = vec![indebted, User::rider("rider_2", "Sana", "0304"), User::admin("admin_1", "Root")];
        collections.save_all(CollectionKey::Users, &seeded).await.unwrap();

        let (service, client) =
            DispatchService::new(8, collections, FeeSchedule::default(), LedgerPolicy::default());
        let handle = tokio::spawn(service.run());

        store.fail_user_reads.store(true, Ordering::SeqCst);
        let login = client.login(User::rider("rider_1", "Bilal", "0303")).await;
        assert!(matches!(login, Err(DispatchError::Storage(_))));
        let settle = client.settle_debt("admin_1".into(), "rider_1".into()).await;
        assert!(matches!(settle, Err(DispatchError::Storage(_))));
        let fresh = client.login(User::rider("rider_3", "Omar", "0305")).await;
        assert!(matches!(fresh, Err(DispatchError::Storage(_))));
        store.fail_user_reads.store(false, Ordering::SeqCst);

        let snapshot = client.refresh().await.unwrap();
        assert_eq!(snapshot.users.len(), 3);
        let rider = client.get_user("rider_1".into()).await.unwrap().unwrap();
        assert_eq!(rider.amount_owed(), Decimal::from(6000));
        assert!(client.get_user("rider_3".into()).await.unwrap().is_none());

        client.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_only_admin_may_settle() {
        let collections = Collections::new(Arc::new(MemoryStore::new()));
        collections.initialize().await.unwrap();
        let (service, client) =
            DispatchService::new(8, collections, FeeSchedule::default(), LedgerPolicy::default());
        let handle = tokio::spawn(service.run());

        client.login(User::rider("rider_1", "Bilal", "0303")).await.unwrap();
        client.login(User::rider("rider_2", "Sana", "0304")).await.unwrap();

        let result = client.settle_debt("rider_2".into(), "rider_1".into()).await;
        assert!(matches!(result, Err(DispatchError::Unauthorized(_))));

        client.login(User::admin("admin_1", "Root")).await.unwrap();
        let settled = client.settle_debt("admin_1".into(), "rider_1".into()).await.unwrap();
        assert_eq!(settled.amount_owed(), Decimal::ZERO);

        client.shutdown().await.unwrap();
        handle.await.unwrap();
    }
}
