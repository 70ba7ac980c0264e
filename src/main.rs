use serde_json::json;
use tracing::{error, info, warn, Instrument};

use lilian_orders::domain::{catalog, find_product};
use lilian_orders::storage::PersistenceEvent;
use lilian_orders::{setup_tracing, AppConfig, Cart, OrderSystem, PaymentOutcome, PaymentRequest};

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = AppConfig::load().map_err(|e| e.to_string())?;
    setup_tracing(&config.log.filter);

    info!(dir = %config.storage.dir.display(), "Starting order system");
    let mut system = OrderSystem::new(&config);

    // Surface slot problems without blocking the store.
    if let Some(mut events) = system.take_persistence_events() {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    PersistenceEvent::LoadFailed { key, error } | PersistenceEvent::SaveFailed { key, error } => {
                        warn!(slot = %key, %error, "Orders are only held in memory")
                    }
                    _ => {}
                }
            }
        });
    }

    info!(products = catalog().len(), "Catalog loaded");

    // Fill a cart the way the shop page would.
    let mut cart = Cart::new();
    for (product_id, quantity) in [("lavender-01", 2), ("face-serum-01", 1)] {
        let product = find_product(product_id).ok_or_else(|| format!("Unknown product {}", product_id))?;
        cart.add(&product, quantity);
    }
    info!(items = cart.item_count(), subtotal = cart.subtotal(), "Cart ready");

    let params = cart
        .to_order_create()
        .with_customer(json!({"name": "Lilian", "email": "lilian@example.com"}).as_object().cloned().unwrap_or_default());

    let span = tracing::info_span!("checkout");
    let checkout = async {
        let order = system.order_client.create_order(params).await?;
        info!(order_id = %order.id, amount = order.payment.amount, "Order created");

        // The payment provider's approval callback reconciles here.
        let request = PaymentRequest::new()
            .with_payer_info(json!({"givenName": "Lilian"}))
            .with_captured_amount(order.payment.amount);
        system.order_client.process_payment(&order.id, request).await
    }
    .instrument(span)
    .await;

    match checkout {
        Ok(PaymentOutcome::Succeeded { order, receipt }) => {
            info!(order_id = %order.id, transaction_id = %receipt.transaction_id, "Payment settled");
            cart.clear();
        }
        Ok(PaymentOutcome::Failed { error }) => warn!(%error, "Payment failed"),
        Err(e) => error!(error = %e, "Checkout failed"),
    }

    let stats = system.order_client.stats().await.map_err(|e| e.to_string())?;
    info!(
        total = stats.total,
        completed = stats.completed,
        revenue = stats.total_revenue,
        "Order statistics"
    );

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
