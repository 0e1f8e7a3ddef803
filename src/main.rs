use rust_decimal::Decimal;
use tracing::{info, warn, Instrument};

use axle_dispatch::advisor::{menu_context, Advisor, OfflineBackend};
use axle_dispatch::app_system::load_config;
use axle_dispatch::domain::{OrderStatus, Restaurant, User};
use axle_dispatch::location::{LocationPicker, PinnedLocation};
use axle_dispatch::{setup_tracing, DispatchSystem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config = load_config()?;
    info!(fees = ?config.fees, debt_limit = %config.ledger.debt_limit, "Starting dispatch demo");

    let system = DispatchSystem::start(config).await;
    let mut customer = system.session();
    let mut kitchen = system.session();
    let mut rider = system.session();
    let mut admin = system.session();

    let order = async {
        let pin = PinnedLocation::default().pick_location();
        customer
            .login(User::customer("cust_demo", "Ayesha", "0301", pin.address.clone(), pin.location()))
            .await?;

        let snapshot = customer.snapshot();
        let restaurant = snapshot
            .restaurant("r1")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("catalog restaurant r1 missing"))?;

        let advisor = Advisor::new(OfflineBackend);
        let tip = advisor
            .recommend_from_query("something hearty", &menu_context(&snapshot.restaurants, Some(&restaurant)))
            .await;
        info!(%tip, "Advisor says");

        for item in restaurant.menu.iter().cloned() {
            customer.add_to_cart(&restaurant.id, item, 1);
        }
        let order = customer.place_order().await?;
        info!(order_id = %order.id(), total = %order.total(), address = %pin.address, "Order placed");
        anyhow::Ok(order)
    }
    .instrument(tracing::info_span!("customer"))
    .await?;

    async {
        let storefront: Restaurant = customer
            .snapshot()
            .restaurant("r1")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("catalog restaurant r1 missing"))?;
        kitchen
            .login(User::restaurant_owner("owner_demo", "Hamza", "0302", storefront))
            .await?;
        kitchen.advance_status(order.id(), OrderStatus::Preparing).await?;
        kitchen.advance_status(order.id(), OrderStatus::ReadyForPickup).await?;
        anyhow::Ok(())
    }
    .instrument(tracing::info_span!("restaurant"))
    .await?;

    async {
        rider.login(User::rider("rider_demo", "Bilal", "0303")).await?;
        rider.assign_rider(order.id()).await?;
        rider.mark_arrived(order.id()).await?;
        rider.advance_status(order.id(), OrderStatus::OutForDelivery).await?;
        let delivered = rider.advance_status(order.id(), OrderStatus::Delivered).await?;

        if let Err(e) = rider.advance_status(order.id(), OrderStatus::Delivered).await {
            warn!(error = %e, "Repeated delivery refused");
        }
        let owed = rider.current_user().map(User::amount_owed).unwrap_or(Decimal::ZERO);
        info!(%owed, collected = %delivered.total(), "Rider wallet after delivery");
        anyhow::Ok(())
    }
    .instrument(tracing::info_span!("rider"))
    .await?;

    async {
        customer.attach_feedback(order.id(), 5, "Still hot on arrival").await?;
        admin.login(User::admin("admin_demo", "Root")).await?;
        let stats = axle_dispatch::session::admin_stats(&admin.snapshot());
        info!(revenue = %stats.total_revenue, debt = %stats.outstanding_debt, "Dashboard");
        let settled = admin.settle_debt("rider_demo").await?;
        info!(owed = %settled.amount_owed(), "Rider settled");
        anyhow::Ok(())
    }
    .instrument(tracing::info_span!("admin"))
    .await?;

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
