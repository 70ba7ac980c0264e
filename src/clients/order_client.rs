use tracing::{debug, info, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{sort_newest_first, Order, OrderCreate, OrderStats, OrderStatus};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError, PaymentOutcome, PaymentRequest, StatusOverride};

/// Handle to the order store.
///
/// Cheap to clone; every clone talks to the same store actor, which applies
/// requests one at a time.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params), fields(items = params.items.len()))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!("Sending request");
        let order = self.inner.create(params).await?;
        info!(order_id = %order.id, "Order stored");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        self.inner.get(id.to_string()).await
    }

    /// All orders, most recent first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let mut orders = self.inner.list().await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn list_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let mut orders = self.list_orders().await?;
        orders.retain(|order| order.status == status);
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<OrderStats, OrderError> {
        debug!("Sending request");
        let orders = self.inner.list().await?;
        Ok(OrderStats::from_orders(&orders))
    }

    /// Administrative override. Sets any status, including on completed or
    /// cancelled orders; prefer [`process_payment`](Self::process_payment)
    /// and [`cancel_order`](Self::cancel_order) for normal flows.
    #[instrument(skip(self))]
    pub async fn override_status(&self, id: &str, patch: StatusOverride) -> Result<Order, OrderError> {
        debug!("Sending request");
        self.inner.update(id.to_string(), patch).await
    }

    /// Reconciles a payment the checkout has settled with the provider.
    ///
    /// Settlement rejections come back as [`PaymentOutcome::Failed`]; only a
    /// missing order or an illegal state is an `Err`.
    #[instrument(skip(self))]
    pub async fn process_payment(&self, id: &str, request: PaymentRequest) -> Result<PaymentOutcome, OrderError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id.to_string(), OrderAction::ProcessPayment(request))
            .await?
        {
            OrderActionResult::ProcessPayment(outcome) => Ok(outcome),
            _ => Err(OrderError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: &str, reason: Option<String>) -> Result<Order, OrderError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id.to_string(), OrderAction::Cancel { reason })
            .await?
        {
            OrderActionResult::Cancel(order) => Ok(order),
            _ => Err(OrderError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    /// Wipes every order. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<usize, OrderError> {
        debug!("Sending request");
        self.inner.clear().await
    }

    /// Flushes the store and stops its actor. Every clone of this client
    /// fails afterwards.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        debug!("Sending request");
        self.inner.shutdown().await
    }
}
