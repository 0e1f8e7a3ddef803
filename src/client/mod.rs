use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::domain::{CartItem, MenuItem, MenuItemDraft, Order, OrderStatus, Restaurant, User, VerificationStatus};
use crate::error::DispatchError;
use crate::messages::{DispatchRequest, Snapshot};

/// Generate client methods with oneshot channel boilerplate and automatic tracing.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, DispatchError> {
                debug!("Sending request");
                let (respond_to, response) = oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| DispatchError::ActorCommunicationError("Actor closed".to_string()))?;

                response
                    .await
                    .map_err(|_| DispatchError::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

/// Cloneable handle to the dispatch service.
#[derive(Clone)]
pub struct DispatchClient {
    sender: mpsc::Sender<DispatchRequest>,
}

impl DispatchClient {
    pub fn new(sender: mpsc::Sender<DispatchRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        debug!("Sending shutdown request");
        self.sender
            .send(DispatchRequest::Shutdown)
            .await
            .map_err(|_| DispatchError::ActorCommunicationError("Actor closed".to_string()))
    }

    /// Cancellation is a transition like any other.
    pub async fn cancel_order(&self, actor_id: String, order_id: String) -> Result<Order, DispatchError> {
        self.advance_status(actor_id, order_id, OrderStatus::Cancelled).await
    }
}

client_method!(DispatchClient => fn login(user: User) -> User as DispatchRequest::Login);
client_method!(DispatchClient => fn logout() -> () as DispatchRequest::Logout);
client_method!(DispatchClient => fn refresh() -> Snapshot as DispatchRequest::Refresh);
client_method!(DispatchClient => fn get_order(id: String) -> Option<Order> as DispatchRequest::GetOrder);
client_method!(DispatchClient => fn get_user(id: String) -> Option<User> as DispatchRequest::GetUser);
client_method!(DispatchClient => fn place_order(customer_id: String, restaurant_id: String, items: Vec<CartItem>) -> Order as DispatchRequest::PlaceOrder);
client_method!(DispatchClient => fn advance_status(actor_id: String, order_id: String, to: OrderStatus) -> Order as DispatchRequest::AdvanceStatus);
client_method!(DispatchClient => fn assign_rider(rider_id: String, order_id: String) -> Order as DispatchRequest::AssignRider);
client_method!(DispatchClient => fn mark_arrived(rider_id: String, order_id: String) -> Order as DispatchRequest::MarkArrived);
client_method!(DispatchClient => fn attach_feedback(customer_id: String, order_id: String, rating: u8, comment: String) -> Order as DispatchRequest::AttachFeedback);
client_method!(DispatchClient => fn settle_debt(admin_id: String, rider_id: String) -> User as DispatchRequest::SettleDebt);
client_method!(DispatchClient => fn set_suspended(admin_id: String, rider_id: String, suspended: bool) -> User as DispatchRequest::SetSuspended);
client_method!(DispatchClient => fn set_verification(admin_id: String, restaurant_id: String, status: VerificationStatus) -> Restaurant as DispatchRequest::SetVerification);
client_method!(DispatchClient => fn add_menu_item(owner_id: String, draft: MenuItemDraft) -> MenuItem as DispatchRequest::AddMenuItem);
