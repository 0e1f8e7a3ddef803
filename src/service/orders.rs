use tracing::{debug, info, instrument, warn};

use super::{find_user, now_millis, DispatchService};
use crate::domain::{CartItem, Feedback, Order, OrderStatus, Restaurant, Role, RiderAssignment, User};
use crate::entity::{position_of, Entity};
use crate::error::{DispatchError, LedgerError, OrderError, RestaurantError};
use crate::ledger::LedgerAction;
use crate::lifecycle::{self, OrderAction, OrderOutcome};
use crate::messages::ServiceResult;
use crate::store::CollectionKey;

const FALLBACK_ESTIMATE: &str = "30-45 min";

impl DispatchService {
    #[instrument(skip(self))]
    pub(super) async fn handle_get_order(&self, id: String) -> ServiceResult<Option<Order>> {
        debug!("Processing get order request");
        let orders: Vec<Order> = self.collections.load_all(CollectionKey::Orders).await;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub(super) async fn handle_place_order(
        &self,
        customer_id: String,
        restaurant_id: String,
        items: Vec<CartItem>,
    ) -> ServiceResult<Order> {
        let users = self.load_users().await?;
        let customer = find_user(&users, &customer_id)?;
        let restaurants: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        let restaurant = restaurants
            .iter()
            .find(|r| r.id == restaurant_id)
            .ok_or_else(|| RestaurantError::NotFound(restaurant_id.clone()))?;

        let placed_at = now_millis();
        let order = lifecycle::create_order(
            lifecycle::next_order_id(placed_at),
            customer,
            restaurant,
            &items,
            &self.fees,
            placed_at,
        )
        .inspect_err(|e| warn!(error = %e, "Order rejected"))?;

        let mut orders: Vec<Order> = self.collections.try_load_all(CollectionKey::Orders).await?;
        orders.insert(0, order.clone());
        self.collections.save_all(CollectionKey::Orders, &orders).await?;

        info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Moves an order forward or cancels it.
    ///
    /// Reaching DELIVERED books the settlement on the rider in the same
    /// commit; if either write fails neither change is kept.
    #[instrument(skip(self), fields(to = %to))]
    pub(super) async fn handle_advance_status(
        &self,
        actor_id: String,
        order_id: String,
        to: OrderStatus,
    ) -> ServiceResult<Order> {
        let mut orders: Vec<Order> = self.collections.try_load_all(CollectionKey::Orders).await?;
        let idx = position_of(&orders, &order_id).ok_or_else(|| OrderError::NotFound(order_id.clone()))?;

        let from = orders[idx].status;
        if !from.can_transition_to(to) {
            warn!(%from, "Transition rejected");
            return Err(OrderError::InvalidTransition { from, to }.into());
        }

        let users = self.load_users().await?;
        let actor = find_user(&users, &actor_id)?;
        self.authorize_transition(actor, &orders[idx], to).await?;

        let mut order = orders[idx].clone();
        let outcome = order
            .handle_action(OrderAction::Advance { to, at: now_millis() })
            .inspect_err(|e| warn!(error = %e, "Transition rejected"))?;

        let settlement = match outcome {
            OrderOutcome::Advanced { settlement, .. } => settlement,
            _ => None,
        };

        orders[idx] = order.clone();
        match settlement {
            Some(record) => {
                let mut updated_users = users.clone();
                let rider_idx = position_of(&updated_users, &record.rider_id)
                    .ok_or_else(|| LedgerError::NotFound(record.rider_id.clone()))?;
                let charged = updated_users[rider_idx].handle_action(LedgerAction::Charge(record.clone()))?;
                self.commit_pair(
                    CollectionKey::Users,
                    &users,
                    &updated_users,
                    CollectionKey::Orders,
                    &orders,
                )
                .await?;
                info!(
                    rider_id = %record.rider_id,
                    amount = %record.amount,
                    outcome = ?charged,
                    "Order delivered and settled"
                );
            }
            None => {
                self.collections.save_all(CollectionKey::Orders, &orders).await?;
                info!(%from, "Order status advanced");
            }
        }
        Ok(order)
    }

    async fn authorize_transition(&self, actor: &User, order: &Order, to: OrderStatus) -> ServiceResult<()> {
        let denied = |what: &str| {
            warn!(actor_id = %actor.id, role = %actor.role, "Unauthorized transition");
            Err(DispatchError::Unauthorized(format!("{} may not {}", actor.id, what)))
        };

        match to {
            OrderStatus::Preparing | OrderStatus::ReadyForPickup => {
                if actor.role != Role::Restaurant || actor.restaurant_id() != Some(order.restaurant_id.as_str()) {
                    return denied("manage this restaurant's orders");
                }
                self.require_approved(&order.restaurant_id).await
            }
            OrderStatus::OutForDelivery | OrderStatus::Delivered => match order.rider_id.as_deref() {
                Some(bound) if bound != actor.id => denied("handle another rider's delivery"),
                _ => Ok(()),
            },
            OrderStatus::Cancelled => match actor.role {
                Role::Admin => Ok(()),
                Role::Customer if actor.id == order.customer_id && order.status == OrderStatus::Pending => Ok(()),
                Role::Restaurant
                    if actor.restaurant_id() == Some(order.restaurant_id.as_str())
                        && order.status == OrderStatus::Pending =>
                {
                    self.require_approved(&order.restaurant_id).await
                }
                _ => denied("cancel this order"),
            },
            OrderStatus::Pending => denied("reopen an order"),
        }
    }

    async fn require_approved(&self, restaurant_id: &str) -> ServiceResult<()> {
        let restaurants: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        match restaurants.iter().find(|r| r.id == restaurant_id) {
            Some(r) if r.is_approved() => Ok(()),
            Some(r) => Err(OrderError::RestaurantNotApproved {
                id: r.id.clone(),
                status: r.verification(),
            }
            .into()),
            None => Err(RestaurantError::NotFound(restaurant_id.to_string()).into()),
        }
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_assign_rider(&self, rider_id: String, order_id: String) -> ServiceResult<Order> {
        let mut orders: Vec<Order> = self.collections.try_load_all(CollectionKey::Orders).await?;
        let idx = position_of(&orders, &order_id).ok_or_else(|| OrderError::NotFound(order_id.clone()))?;

        let users = self.load_users().await?;
        let rider = find_user(&users, &rider_id)?;
        if !rider.is_rider() {
            return Err(LedgerError::NotARider(rider.id.clone()).into());
        }
        if let Some(reason) = self.policy.restriction(rider) {
            warn!(%reason, "Restricted rider tried to accept a job");
            return Err(OrderError::RiderRestricted {
                rider_id: rider.id.clone(),
                reason,
            }
            .into());
        }

        let restaurants: Vec<Restaurant> = self.collections.try_load_all(CollectionKey::Restaurants).await?;
        let estimated_time = restaurants
            .iter()
            .find(|r| r.id == orders[idx].restaurant_id)
            .map(|r| r.delivery_time.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_ESTIMATE)
            .to_string();

        let assignment = RiderAssignment {
            rider_id: rider.id.clone(),
            rider_name: rider.name.clone(),
            rider_phone: rider.phone.clone(),
        };
        let mut order = orders[idx].clone();
        order
            .handle_action(OrderAction::AssignRider {
                rider: assignment,
                estimated_time: Some(estimated_time),
            })
            .inspect_err(|e| warn!(error = %e, "Assignment rejected"))?;

        orders[idx] = order.clone();
        self.collections.save_all(CollectionKey::Orders, &orders).await?;
        info!("Rider assigned");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub(super) async fn handle_mark_arrived(&self, rider_id: String, order_id: String) -> ServiceResult<Order> {
        let mut orders: Vec<Order> = self.collections.try_load_all(CollectionKey::Orders).await?;
        let idx = position_of(&orders, &order_id).ok_or_else(|| OrderError::NotFound(order_id.clone()))?;

        if let Some(bound) = orders[idx].rider_id.as_deref() {
            if bound != rider_id {
                warn!(bound_rider = %bound, "Arrival from a rider not bound to the order");
                return Err(DispatchError::Unauthorized(format!(
                    "{} is not the rider on order {}",
                    rider_id, order_id
                )));
            }
        }

        let mut order = orders[idx].clone();
        order.handle_action(OrderAction::MarkArrived)?;
        orders[idx] = order.clone();
        self.collections.save_all(CollectionKey::Orders, &orders).await?;
        info!("Rider arrived at restaurant");
        Ok(order)
    }

    #[instrument(skip(self, comment))]
    pub(super) async fn handle_attach_feedback(
        &self,
        customer_id: String,
        order_id: String,
        rating: u8,
        comment: String,
    ) -> ServiceResult<Order> {
        let mut orders: Vec<Order> = self.collections.try_load_all(CollectionKey::Orders).await?;
        let idx = position_of(&orders, &order_id).ok_or_else(|| OrderError::NotFound(order_id.clone()))?;

        if orders[idx].customer_id != customer_id {
            warn!("Feedback from a user who did not place the order");
            return Err(DispatchError::Unauthorized(format!(
                "{} did not place order {}",
                customer_id, order_id
            )));
        }

        let feedback = Feedback {
            rating,
            comment,
            timestamp: now_millis(),
        };
        let mut order = orders[idx].clone();
        order
            .handle_action(OrderAction::AttachFeedback(feedback))
            .inspect_err(|e| warn!(error = %e, "Feedback rejected"))?;

        orders[idx] = order.clone();
        self.collections.save_all(CollectionKey::Orders, &orders).await?;
        info!(rating, "Feedback recorded");
        Ok(order)
    }
}
