//! # Mock Framework
//!
//! Utilities for testing sessions and clients without a running service.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then helpers
//! like [`expect_refresh`] or [`expect_place_order`] to assert what was sent
//! and answer it.

use tokio::sync::mpsc;

use crate::client::DispatchClient;
use crate::domain::{CartItem, OrderStatus, User};
use crate::messages::{DispatchRequest, ServiceResponse, Snapshot};

/// Creates a client whose requests land on a receiver the test controls.
pub fn create_mock_client(buffer_size: usize) -> (DispatchClient, mpsc::Receiver<DispatchRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (DispatchClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Login request
pub async fn expect_login(receiver: &mut mpsc::Receiver<DispatchRequest>) -> Option<(User, ServiceResponse<User>)> {
    match receiver.recv().await {
        Some(DispatchRequest::Login { user, respond_to }) => Some((user, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Refresh request
pub async fn expect_refresh(receiver: &mut mpsc::Receiver<DispatchRequest>) -> Option<ServiceResponse<Snapshot>> {
    match receiver.recv().await {
        Some(DispatchRequest::Refresh { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Answers the next request, which must be a Refresh, with `snapshot`.
pub async fn answer_refresh(receiver: &mut mpsc::Receiver<DispatchRequest>, snapshot: Snapshot) -> bool {
    match expect_refresh(receiver).await {
        Some(respond_to) => respond_to.send(Ok(snapshot)).is_ok(),
        None => false,
    }
}

pub async fn expect_place_order(
    receiver: &mut mpsc::Receiver<DispatchRequest>,
) -> Option<(String, String, Vec<CartItem>, ServiceResponse<crate::domain::Order>)> {
    match receiver.recv().await {
        Some(DispatchRequest::PlaceOrder {
            customer_id,
            restaurant_id,
            items,
            respond_to,
        }) => Some((customer_id, restaurant_id, items, respond_to)),
        _ => None,
    }
}

pub async fn expect_advance_status(
    receiver: &mut mpsc::Receiver<DispatchRequest>,
) -> Option<(String, String, OrderStatus, ServiceResponse<crate::domain::Order>)> {
    match receiver.recv().await {
        Some(DispatchRequest::AdvanceStatus {
            actor_id,
            order_id,
            to,
            respond_to,
        }) => Some((actor_id, order_id, to, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client(10);

        let login_task = tokio::spawn(async move { client.login(User::admin("admin_1", "Root")).await });

        let (user, responder) = expect_login(&mut receiver).await.expect("Expected Login request");
        assert_eq!(user.id, "admin_1");
        responder.send(Ok(user.clone())).unwrap();

        let result = login_task.await.unwrap();
        assert_eq!(result, Ok(user));
    }

    #[tokio::test]
    async fn test_cancel_is_sent_as_transition() {
        let (client, mut receiver) = create_mock_client(10);

        let task = tokio::spawn(async move { client.cancel_order("admin_1".into(), "ord-1".into()).await });

        let (actor_id, order_id, to, responder) =
            expect_advance_status(&mut receiver).await.expect("Expected AdvanceStatus request");
        assert_eq!((actor_id.as_str(), order_id.as_str()), ("admin_1", "ord-1"));
        assert_eq!(to, OrderStatus::Cancelled);
        responder.send(Err(DispatchError::NotLoggedIn)).unwrap();

        assert_eq!(task.await.unwrap(), Err(DispatchError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_dropped_responder_is_reported() {
        let (client, mut receiver) = create_mock_client(10);

        let task = tokio::spawn(async move { client.refresh().await });
        drop(expect_refresh(&mut receiver).await.expect("Expected Refresh request"));

        assert!(matches!(
            task.await.unwrap(),
            Err(DispatchError::ActorCommunicationError(_))
        ));
    }
}
