use crate::domain::{Feedback, Order, OrderStatus, RiderAssignment, SettlementRecord};
use crate::error::OrderError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Requests the engine understands.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Move to `to`, which must be the next forward status or CANCELLED.
    /// `at` stamps the settlement when the move is to DELIVERED.
    Advance { to: OrderStatus, at: i64 },
    /// Bind a rider. Does not change the status.
    AssignRider {
        rider: RiderAssignment,
        estimated_time: Option<String>,
    },
    /// The bound rider reached the restaurant. Advisory only.
    MarkArrived,
    AttachFeedback(Feedback),
}

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Advanced {
        from: OrderStatus,
        to: OrderStatus,
        /// Ledger charge the caller must book in the same write.
        settlement: Option<SettlementRecord>,
    },
    RiderAssigned(RiderAssignment),
    RiderArrived,
    FeedbackRecorded,
}

/// Dispatches an action to the matching transition.
pub fn apply(order: &mut Order, action: OrderAction) -> Result<OrderOutcome, OrderError> {
    match action {
        OrderAction::Advance { to, at } => advance(order, to, at),
        OrderAction::AssignRider { rider, estimated_time } => assign_rider(order, rider, estimated_time),
        OrderAction::MarkArrived => mark_arrived(order),
        OrderAction::AttachFeedback(feedback) => attach_feedback(order, feedback),
    }
}

pub fn advance(order: &mut Order, to: OrderStatus, at: i64) -> Result<OrderOutcome, OrderError> {
    let from = order.status;
    if !from.can_transition_to(to) {
        return Err(OrderError::InvalidTransition { from, to });
    }

    let settlement = match to {
        OrderStatus::OutForDelivery => {
            bound_rider(order)?;
            None
        }
        OrderStatus::Delivered => {
            let rider_id = bound_rider(order)?.to_string();
            if order.settlement.is_some() {
                return Err(OrderError::AlreadySettled(order.id.clone()));
            }
            Some(SettlementRecord {
                rider_id,
                amount: order.platform_share(),
                settled_at: at,
            })
        }
        _ => None,
    };

    order.status = to;
    if let Some(record) = &settlement {
        order.settlement = Some(record.clone());
    }
    Ok(OrderOutcome::Advanced { from, to, settlement })
}

pub fn cancel(order: &mut Order, at: i64) -> Result<OrderOutcome, OrderError> {
    advance(order, OrderStatus::Cancelled, at)
}

pub fn assign_rider(
    order: &mut Order,
    rider: RiderAssignment,
    estimated_time: Option<String>,
) -> Result<OrderOutcome, OrderError> {
    if order.status.is_terminal() {
        return Err(OrderError::ValidationError(format!(
            "Order {} is {} and cannot take a rider",
            order.id, order.status
        )));
    }
    if order.rider_id.is_some() {
        return Err(OrderError::AlreadyAssigned(order.id.clone()));
    }
    if rider.rider_id.trim().is_empty() {
        return Err(OrderError::ValidationError("Rider id required".to_string()));
    }

    order.rider_id = Some(rider.rider_id.clone());
    order.rider_name = Some(rider.rider_name.clone());
    order.rider_phone = Some(rider.rider_phone.clone());
    order.rider_arrived = false;
    if estimated_time.is_some() {
        order.estimated_time = estimated_time;
    }
    Ok(OrderOutcome::RiderAssigned(rider))
}

pub fn mark_arrived(order: &mut Order) -> Result<OrderOutcome, OrderError> {
    if order.status.is_terminal() {
        return Err(OrderError::ValidationError(format!("Order {} is already {}", order.id, order.status)));
    }
    bound_rider(order)?;
    order.rider_arrived = true;
    Ok(OrderOutcome::RiderArrived)
}

pub fn attach_feedback(order: &mut Order, feedback: Feedback) -> Result<OrderOutcome, OrderError> {
    if order.status != OrderStatus::Delivered {
        return Err(OrderError::FeedbackNotAllowed(order.status));
    }
    if order.feedback.is_some() {
        return Err(OrderError::FeedbackAlreadyPresent(order.id.clone()));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&feedback.rating) {
        return Err(OrderError::InvalidRating(feedback.rating));
    }
    order.feedback = Some(feedback);
    Ok(OrderOutcome::FeedbackRecorded)
}

fn bound_rider(order: &Order) -> Result<&str, OrderError> {
    order
        .rider_id
        .as_deref()
        .ok_or_else(|| OrderError::NoRiderAssigned(order.id.clone()))
}
