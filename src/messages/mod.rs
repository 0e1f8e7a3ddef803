use tokio::sync::oneshot;

use crate::domain::{CartItem, MenuItem, MenuItemDraft, Order, OrderStatus, Restaurant, User, VerificationStatus};
use crate::error::DispatchError;

/// Generic type aliases for service communication
pub type ServiceResult<T> = std::result::Result<T, DispatchError>;
pub type ServiceResponse<T> = oneshot::Sender<ServiceResult<T>>;

/// Everything a view renders from, read in one pass from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub users: Vec<User>,
    /// Newest first.
    pub orders: Vec<Order>,
    pub restaurants: Vec<Restaurant>,
    pub current_user: Option<User>,
}

impl Snapshot {
    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id() == id)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn restaurant(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }
}

/// Typed messages for the dispatch actor. Each variant carries its parameters
/// and a oneshot channel for the response. `*_id` fields naming a user are the
/// acting user, checked against the capability the request needs.
#[derive(Debug)]
pub enum DispatchRequest {
    Login {
        user: User,
        respond_to: ServiceResponse<User>,
    },
    Logout {
        respond_to: ServiceResponse<()>,
    },
    Refresh {
        respond_to: ServiceResponse<Snapshot>,
    },
    GetOrder {
        id: String,
        respond_to: ServiceResponse<Option<Order>>,
    },
    GetUser {
        id: String,
        respond_to: ServiceResponse<Option<User>>,
    },
    PlaceOrder {
        customer_id: String,
        restaurant_id: String,
        items: Vec<CartItem>,
        respond_to: ServiceResponse<Order>,
    },
    AdvanceStatus {
        actor_id: String,
        order_id: String,
        to: OrderStatus,
        respond_to: ServiceResponse<Order>,
    },
    AssignRider {
        rider_id: String,
        order_id: String,
        respond_to: ServiceResponse<Order>,
    },
    MarkArrived {
        rider_id: String,
        order_id: String,
        respond_to: ServiceResponse<Order>,
    },
    AttachFeedback {
        customer_id: String,
        order_id: String,
        rating: u8,
        comment: String,
        respond_to: ServiceResponse<Order>,
    },
    SettleDebt {
        admin_id: String,
        rider_id: String,
        respond_to: ServiceResponse<User>,
    },
    SetSuspended {
        admin_id: String,
        rider_id: String,
        suspended: bool,
        respond_to: ServiceResponse<User>,
    },
    SetVerification {
        admin_id: String,
        restaurant_id: String,
        status: VerificationStatus,
        respond_to: ServiceResponse<Restaurant>,
    },
    AddMenuItem {
        owner_id: String,
        draft: MenuItemDraft,
        respond_to: ServiceResponse<MenuItem>,
    },
    Shutdown,
}
