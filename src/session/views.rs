//! Role-scoped read models built from a [`Snapshot`].

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{Order, OrderStatus, Restaurant, Role, User, VerificationStatus};
use crate::error::{DispatchError, OrderError, RestaurantError};
use crate::ledger::{LedgerPolicy, RiderWallet};
use crate::messages::Snapshot;

const RECENT_TRANSACTIONS: usize = 5;

/// A customer's orders, newest first.
pub fn customer_orders<'a>(snapshot: &'a Snapshot, customer_id: &str) -> Vec<&'a Order> {
    snapshot
        .orders
        .iter()
        .filter(|o| o.customer_id() == customer_id)
        .collect()
}

/// Orders for a restaurant's kitchen, newest first.
///
/// Only approved storefronts get a queue.
pub fn restaurant_queue<'a>(snapshot: &'a Snapshot, restaurant_id: &str) -> Result<Vec<&'a Order>, DispatchError> {
    let restaurant = snapshot
        .restaurant(restaurant_id)
        .ok_or_else(|| RestaurantError::NotFound(restaurant_id.to_string()))?;
    if !restaurant.is_approved() {
        return Err(OrderError::RestaurantNotApproved {
            id: restaurant.id.clone(),
            status: restaurant.verification(),
        }
        .into());
    }
    Ok(snapshot
        .orders
        .iter()
        .filter(|o| o.restaurant_id() == restaurant_id)
        .collect())
}

/// The step a kitchen may take next, if any.
pub fn kitchen_action(order: &Order) -> Option<OrderStatus> {
    match order.status() {
        OrderStatus::Pending => Some(OrderStatus::Preparing),
        OrderStatus::Preparing => Some(OrderStatus::ReadyForPickup),
        _ => None,
    }
}

/// An unclaimed job as offered to riders.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOffer {
    pub order: Order,
    pub earnings: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiderBoard {
    pub available: Vec<JobOffer>,
    pub active: Vec<Order>,
    pub wallet: RiderWallet,
}

impl RiderBoard {
    /// Restricted riders still see jobs but cannot accept them.
    pub fn can_accept_jobs(&self) -> bool {
        self.wallet.restriction.is_none()
    }
}

pub fn available_jobs(snapshot: &Snapshot) -> Vec<JobOffer> {
    snapshot
        .orders
        .iter()
        .filter(|o| {
            !o.is_terminal()
                && o.rider_id().is_none()
                && matches!(o.status(), OrderStatus::Preparing | OrderStatus::ReadyForPickup)
        })
        .map(|o| JobOffer {
            order: o.clone(),
            earnings: o.delivery_fee(),
        })
        .collect()
}

pub fn active_deliveries<'a>(snapshot: &'a Snapshot, rider_id: &str) -> Vec<&'a Order> {
    snapshot
        .orders
        .iter()
        .filter(|o| !o.is_terminal() && o.rider_id() == Some(rider_id))
        .collect()
}

pub fn rider_board(snapshot: &Snapshot, rider: &User, policy: &LedgerPolicy) -> RiderBoard {
    RiderBoard {
        available: available_jobs(snapshot),
        active: active_deliveries(snapshot, &rider.id).into_iter().cloned().collect(),
        wallet: policy.wallet(rider),
    }
}

/// Platform-wide figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminStats {
    pub total_revenue: Decimal,
    pub platform_earnings: Decimal,
    pub active_orders: usize,
    pub users_by_role: HashMap<Role, usize>,
    pub outstanding_debt: Decimal,
    pub recent_orders: Vec<Order>,
}

pub fn admin_stats(snapshot: &Snapshot) -> AdminStats {
    let delivered = || {
        snapshot
            .orders
            .iter()
            .filter(|o| o.status() == OrderStatus::Delivered)
    };

    let mut users_by_role = HashMap::new();
    for user in &snapshot.users {
        *users_by_role.entry(user.role).or_insert(0) += 1;
    }

    AdminStats {
        total_revenue: delivered().map(Order::total).sum(),
        platform_earnings: delivered().map(Order::platform_fee).sum(),
        active_orders: snapshot.orders.iter().filter(|o| !o.is_terminal()).count(),
        users_by_role,
        outstanding_debt: snapshot
            .users
            .iter()
            .filter(|u| u.is_rider())
            .map(User::amount_owed)
            .sum(),
        recent_orders: snapshot.orders.iter().take(RECENT_TRANSACTIONS).cloned().collect(),
    }
}

pub fn pending_approvals(snapshot: &Snapshot) -> Vec<&Restaurant> {
    snapshot
        .restaurants
        .iter()
        .filter(|r| r.verification() == VerificationStatus::Pending)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub phone: String,
    pub wallet: RiderWallet,
}

pub fn rider_roster(snapshot: &Snapshot, policy: &LedgerPolicy) -> Vec<RosterEntry> {
    snapshot
        .users
        .iter()
        .filter(|u| u.is_rider())
        .map(|u| RosterEntry {
            name: u.name.clone(),
            phone: u.phone.clone(),
            wallet: policy.wallet(u),
        })
        .collect()
}
