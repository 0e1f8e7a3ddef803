//! Session and role context.
//!
//! A [`Session`] is one user's view of the platform: who is logged in, what is
//! in the cart, and the latest [`Snapshot`] read from the store. Every write
//! goes through the [`DispatchClient`]; the session only keeps the state a
//! view renders from. Other sessions' writes become visible on the next
//! [`Session::refresh_data`], either called directly or from a polling task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::advisor::{Advisor, GenerativeBackend};
use crate::client::DispatchClient;
use crate::domain::{
    Cart, MenuItem, MenuItemDraft, Order, OrderStatus, Restaurant, Role, User, VerificationStatus,
};
use crate::error::{DispatchError, OrderError};
use crate::ledger::LedgerPolicy;
use crate::messages::{ServiceResult, Snapshot};

pub mod views;

pub use views::*;

pub struct Session {
    client: DispatchClient,
    policy: LedgerPolicy,
    current_user: Option<User>,
    cart: Cart,
    snapshot: Arc<watch::Sender<Snapshot>>,
}

impl Session {
    pub fn new(client: DispatchClient, policy: LedgerPolicy) -> Self {
        let (sender, _) = watch::channel(Snapshot::default());
        Self {
            client,
            policy,
            current_user: None,
            cart: Cart::new(),
            snapshot: Arc::new(sender),
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    fn require_user(&self) -> ServiceResult<&User> {
        self.current_user.as_ref().ok_or(DispatchError::NotLoggedIn)
    }

    fn require_role(&self, role: Role) -> ServiceResult<&User> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(DispatchError::Unauthorized(format!("{} is not a {}", user.id, role)));
        }
        Ok(user)
    }

    /// Registers or updates the user, makes it active and loads fresh data.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn login(&mut self, user: User) -> ServiceResult<User> {
        let stored = self.client.login(user).await?;
        self.current_user = Some(stored.clone());
        self.cart.clear();
        self.refresh_data().await?;
        info!(role = %stored.role, "Session started");
        Ok(stored)
    }

    /// Ends the session. Persisted data is left as is.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> ServiceResult<()> {
        self.client.logout().await?;
        self.current_user = None;
        self.cart.clear();
        info!("Session ended");
        Ok(())
    }

    /// Re-reads every collection and publishes the result to subscribers.
    ///
    /// The active user is re-resolved from the fresh user list so ledger and
    /// approval changes made by other roles show up here.
    pub async fn refresh_data(&mut self) -> ServiceResult<Snapshot> {
        let snapshot = self.client.refresh().await?;
        if let Some(current) = &self.current_user {
            if let Some(fresh) = snapshot.user(&current.id) {
                self.current_user = Some(fresh.clone());
            }
        }
        self.snapshot.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Re-fetches the snapshot on a fixed period until the handle is stopped
    /// or dropped.
    pub fn spawn_polling(&self, period: Duration) -> PollingHandle {
        let client = self.client.clone();
        let publisher = Arc::clone(&self.snapshot);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match client.refresh().await {
                    Ok(snapshot) => {
                        publisher.send_replace(snapshot);
                        debug!("Polled snapshot published");
                    }
                    Err(DispatchError::ActorCommunicationError(e)) => {
                        warn!(error = %e, "Dispatch service gone, polling stopped");
                        break;
                    }
                    Err(e) => warn!(error = %e, "Polling refresh failed"),
                }
            }
        });
        PollingHandle { handle }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn add_to_cart(&mut self, restaurant_id: &str, item: MenuItem, quantity: u32) {
        self.cart.add(restaurant_id, item, quantity);
    }

    pub fn decrement_cart_item(&mut self, item_id: &str) {
        self.cart.decrement(item_id);
    }

    pub fn remove_from_cart(&mut self, item_id: &str) {
        self.cart.remove(item_id);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Places the cart as one order. The cart is kept if the order is refused.
    #[instrument(skip(self))]
    pub async fn place_order(&mut self) -> ServiceResult<Order> {
        let customer_id = self.require_role(Role::Customer)?.id.clone();
        let restaurant_id = match self.cart.restaurant_id() {
            Some(id) if !self.cart.is_empty() => id.to_string(),
            _ => return Err(OrderError::EmptyCart.into()),
        };
        let order = self
            .client
            .place_order(customer_id, restaurant_id, self.cart.items().to_vec())
            .await?;
        self.cart.clear();
        self.refresh_data().await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn advance_status(&mut self, order_id: &str, to: OrderStatus) -> ServiceResult<Order> {
        let actor_id = self.require_user()?.id.clone();
        let order = self.client.advance_status(actor_id, order_id.to_string(), to).await?;
        self.refresh_data().await?;
        Ok(order)
    }

    pub async fn cancel_order(&mut self, order_id: &str) -> ServiceResult<Order> {
        self.advance_status(order_id, OrderStatus::Cancelled).await
    }

    /// Accepts a job as the logged-in rider.
    #[instrument(skip(self))]
    pub async fn assign_rider(&mut self, order_id: &str) -> ServiceResult<Order> {
        let rider_id = self.require_role(Role::Rider)?.id.clone();
        let order = self.client.assign_rider(rider_id, order_id.to_string()).await?;
        self.refresh_data().await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn mark_arrived(&mut self, order_id: &str) -> ServiceResult<Order> {
        let rider_id = self.require_role(Role::Rider)?.id.clone();
        let order = self.client.mark_arrived(rider_id, order_id.to_string()).await?;
        self.refresh_data().await?;
        Ok(order)
    }

    #[instrument(skip(self, comment))]
    pub async fn attach_feedback(&mut self, order_id: &str, rating: u8, comment: &str) -> ServiceResult<Order> {
        let customer_id = self.require_role(Role::Customer)?.id.clone();
        let order = self
            .client
            .attach_feedback(customer_id, order_id.to_string(), rating, comment.to_string())
            .await?;
        self.refresh_data().await?;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn settle_debt(&mut self, rider_id: &str) -> ServiceResult<User> {
        let admin_id = self.require_role(Role::Admin)?.id.clone();
        let rider = self.client.settle_debt(admin_id, rider_id.to_string()).await?;
        self.refresh_data().await?;
        Ok(rider)
    }

    #[instrument(skip(self))]
    pub async fn set_suspended(&mut self, rider_id: &str, suspended: bool) -> ServiceResult<User> {
        let admin_id = self.require_role(Role::Admin)?.id.clone();
        let rider = self
            .client
            .set_suspended(admin_id, rider_id.to_string(), suspended)
            .await?;
        self.refresh_data().await?;
        Ok(rider)
    }

    #[instrument(skip(self))]
    pub async fn set_verification(
        &mut self,
        restaurant_id: &str,
        status: VerificationStatus,
    ) -> ServiceResult<Restaurant> {
        let admin_id = self.require_role(Role::Admin)?.id.clone();
        let restaurant = self
            .client
            .set_verification(admin_id, restaurant_id.to_string(), status)
            .await?;
        self.refresh_data().await?;
        Ok(restaurant)
    }

    #[instrument(skip(self, draft), fields(dish = %draft.name))]
    pub async fn add_menu_item(&mut self, draft: MenuItemDraft) -> ServiceResult<MenuItem> {
        let owner_id = self.require_role(Role::Restaurant)?.id.clone();
        let item = self.client.add_menu_item(owner_id, draft).await?;
        self.refresh_data().await?;
        Ok(item)
    }

    /// Like [`Session::add_menu_item`], asking the advisor for a description
    /// when the owner left it blank.
    pub async fn add_menu_item_with_advice<B: GenerativeBackend>(
        &mut self,
        mut draft: MenuItemDraft,
        ingredients: &str,
        advisor: &Advisor<B>,
    ) -> ServiceResult<MenuItem> {
        if draft.description.trim().is_empty() {
            draft.description = advisor.suggest_menu_description(&draft.name, ingredients).await;
        }
        self.add_menu_item(draft).await
    }
}

/// Background refresh task started by [`Session::spawn_polling`].
pub struct PollingHandle {
    handle: JoinHandle<()>,
}

impl PollingHandle {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeeSchedule, Location};
    use crate::lifecycle;
    use crate::mock_framework::{answer_refresh, create_mock_client, expect_login, expect_place_order};
    use crate::store::catalog;
    use rust_decimal::Decimal;

    fn customer() -> User {
        User::customer(
            "cust_1",
            "Ayesha",
            "0301",
            "Model Town, Street 1, House 59",
            Location::new(31.5204, 74.3587),
        )
    }

    #[tokio::test]
    async fn test_cart_survives_refused_order_and_clears_on_success() {
        let (client, mut rx) = create_mock_client(10);
        let mut session = Session::new(client, LedgerPolicy::default());
        let burger_house = catalog::default_restaurants().remove(0);
        let burger = burger_house.menu[0].clone();

        let task = tokio::spawn(async move {
            session.login(customer()).await.unwrap();
            session.add_to_cart("r1", burger, 2);
            let refused = session.place_order().await;
            let kept = session.cart().items().len();
            let placed = session.place_order().await;
            (session, refused, kept, placed)
        });

        let (user, responder) = expect_login(&mut rx).await.expect("Expected Login");
        responder.send(Ok(user.clone())).unwrap();
        assert!(answer_refresh(&mut rx, Snapshot::default()).await);

        let (_, restaurant_id, items, responder) = expect_place_order(&mut rx).await.expect("Expected PlaceOrder");
        assert_eq!(restaurant_id, "r1");
        assert_eq!(items[0].quantity, 2);
        responder
            .send(Err(DispatchError::Order(OrderError::ValidationError("kitchen closed".into()))))
            .unwrap();

        let (_, _, items, responder) = expect_place_order(&mut rx).await.expect("Expected PlaceOrder");
        let order = lifecycle::create_order("ord-1".into(), &user, &burger_house, &items, &FeeSchedule::default(), 1)
            .unwrap();
        responder.send(Ok(order.clone())).unwrap();
        assert!(answer_refresh(&mut rx, Snapshot::default()).await);

        let (session, refused, kept, placed) = task.await.unwrap();
        assert!(refused.is_err());
        assert_eq!(kept, 1);
        assert_eq!(placed, Ok(order));
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_operations_require_a_matching_role() {
        let (client, _rx) = create_mock_client(10);
        let mut session = Session::new(client, LedgerPolicy::default());

        assert_eq!(
            session.advance_status("ord-1", OrderStatus::Preparing).await,
            Err(DispatchError::NotLoggedIn)
        );
        assert_eq!(session.place_order().await, Err(DispatchError::NotLoggedIn));

        session.current_user = Some(customer());
        assert!(matches!(
            session.assign_rider("ord-1").await,
            Err(DispatchError::Unauthorized(_))
        ));
        assert_eq!(session.place_order().await, Err(DispatchError::Order(OrderError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_ledger_changes_and_publishes() {
        let (client, mut rx) = create_mock_client(10);
        let mut session = Session::new(client, LedgerPolicy::default());
        session.current_user = Some(User::rider("rider_1", "Bilal", "0303"));
        let mut updates = session.subscribe();

        let mut owing = User::rider("rider_1", "Bilal", "0303");
        owing.amount_owed = Decimal::from(6000);
        let snapshot = Snapshot {
            users: vec![owing],
            ..Snapshot::default()
        };

        let task = tokio::spawn(async move {
            session.refresh_data().await.unwrap();
            session
        });
        assert!(answer_refresh(&mut rx, snapshot.clone()).await);
        let session = task.await.unwrap();

        let rider = session.current_user().unwrap();
        assert_eq!(rider.amount_owed(), Decimal::from(6000));
        assert!(session.policy().is_restricted(rider));
        updates.changed().await.unwrap();
        assert_eq!(*updates.borrow(), snapshot);
    }

    #[tokio::test]
    async fn test_polling_publishes_until_stopped() {
        let (client, mut rx) = create_mock_client(10);
        let session = Session::new(client, LedgerPolicy::default());
        let mut updates = session.subscribe();

        let polling = session.spawn_polling(Duration::from_millis(10));
        for round in 0..2 {
            let snapshot = Snapshot {
                users: vec![User::admin(format!("admin_{}", round), "Root")],
                ..Snapshot::default()
            };
            assert!(answer_refresh(&mut rx, snapshot).await);
            updates.changed().await.unwrap();
            assert_eq!(updates.borrow().users[0].id, format!("admin_{}", round));
        }

        polling.stop();
        tokio::time::sleep(Duration::from_millis(30)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
