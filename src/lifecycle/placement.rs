use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{CartItem, FeeSchedule, Order, OrderStatus, PaymentMethod, Restaurant, Role, User};
use crate::error::OrderError;

/// Time-ordered order id, unique within the same millisecond.
pub fn next_order_id(placed_at: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ord-{}-{}", placed_at, &suffix[..6])
}

/// Builds a PENDING order for `customer` from the cart lines.
///
/// Item data is copied from the restaurant's current menu, so later menu edits
/// never reach this order. Money is computed once here and never again.
pub fn create_order(
    id: String,
    customer: &User,
    restaurant: &Restaurant,
    lines: &[CartItem],
    fees: &FeeSchedule,
    placed_at: i64,
) -> Result<Order, OrderError> {
    if customer.role != Role::Customer {
        return Err(OrderError::ValidationError(format!("User {} is not a customer", customer.id)));
    }
    if !restaurant.is_approved() {
        return Err(OrderError::RestaurantNotApproved {
            id: restaurant.id.clone(),
            status: restaurant.verification(),
        });
    }
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    let delivery_address = customer
        .address
        .clone()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| OrderError::ValidationError("Customer has no delivery address".to_string()))?;

    let mut items: Vec<CartItem> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity(line.id().to_string()));
        }
        let menu_item = restaurant.menu_item(line.id()).ok_or_else(|| {
            OrderError::ValidationError(format!("Item {} is not on the menu of {}", line.id(), restaurant.id))
        })?;
        if menu_item.price <= Decimal::ZERO {
            return Err(OrderError::ValidationError(format!("Item {} has no valid price", menu_item.id)));
        }
        match items.iter_mut().find(|i| i.item.id == menu_item.id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| OrderError::InvalidQuantity(menu_item.id.clone()))?;
            }
            None => items.push(CartItem::new(menu_item.clone(), line.quantity)),
        }
    }

    let overflow = || OrderError::ValidationError("Order total is out of range".to_string());
    let mut item_total = Decimal::ZERO;
    for line in &items {
        let line_total = line.checked_line_total().ok_or_else(overflow)?;
        item_total = item_total.checked_add(line_total).ok_or_else(overflow)?;
    }
    let total = item_total
        .checked_add(fees.delivery_fee)
        .and_then(|t| t.checked_add(fees.platform_fee))
        .ok_or_else(overflow)?;

    Ok(Order {
        id,
        customer_id: customer.id.clone(),
        restaurant_id: restaurant.id.clone(),
        restaurant_name: restaurant.name.clone(),
        items,
        item_total,
        delivery_fee: fees.delivery_fee,
        platform_fee: fees.platform_fee,
        total,
        status: OrderStatus::Pending,
        timestamp: placed_at,
        delivery_address,
        delivery_location: customer.location,
        payment_method: PaymentMethod::CashOnDelivery,
        rider_id: None,
        rider_name: None,
        rider_phone: None,
        rider_arrived: false,
        estimated_time: None,
        feedback: None,
        settlement: None,
    })
}
