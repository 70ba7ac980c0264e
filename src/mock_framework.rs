//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then answer the
//! requests it sends with helpers like [`expect_list`] or [`expect_action`].
//! No actor and no slot are involved, so replies (including failures) are
//! fully under the test's control.

use crate::actor_framework::{Entity, ResourceClient, ResourceRequest, Response};
use tokio::sync::mpsc;

/// Creates a mock client and a receiver for asserting requests.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(receiver: &mut mpsc::Receiver<ResourceRequest<T>>) -> Option<Response<Vec<T>, T::Error>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Patch, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::OrderClient;
    use crate::domain::{LineItem, Order, OrderCreate, OrderStatus};
    use crate::order_actor::{OrderAction, OrderActionResult, OrderError, PaymentRequest, StatusOverride};
    use chrono::{TimeZone, Utc};

    fn order_at(id: &str, millis: i64, status: OrderStatus, amount: f64) -> Order {
        let created = Utc.timestamp_millis_opt(millis).unwrap();
        let params = OrderCreate::new(vec![LineItem::new("a", "Soap", amount, 1)]);
        let mut order = Order::from_create(id.into(), params, created).unwrap();
        order.status = status;
        order
    }

    #[tokio::test]
    async fn test_list_sorts_and_filters_client_side() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move { client.list_orders_by_status(OrderStatus::Pending).await });

        let responder = expect_list(&mut receiver).await.expect("Expected List");
        responder
            .send(Ok(vec![
                order_at("ORD-1-000", 1_000, OrderStatus::Pending, 60.0),
                order_at("ORD-3-000", 3_000, OrderStatus::Completed, 60.0),
                order_at("ORD-2-000", 2_000, OrderStatus::Pending, 60.0),
            ]))
            .unwrap();

        let orders = task.await.unwrap().unwrap();
        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["ORD-2-000", "ORD-1-000"]);
    }

    #[tokio::test]
    async fn test_stats_count_every_status() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move { client.stats().await });

        let responder = expect_list(&mut receiver).await.expect("Expected List");
        let orders: Vec<Order> = OrderStatus::ALL
            .iter()
            .enumerate()
            .map(|(i, status)| order_at(&format!("ORD-{}-000", i), i as i64, *status, 50.0 + i as f64))
            .chain(std::iter::once(order_at("ORD-9-000", 9, OrderStatus::Completed, 100.0)))
            .collect();
        responder.send(Ok(orders)).unwrap();

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.total, 6);
        for status in OrderStatus::ALL {
            let expected = if status == OrderStatus::Completed { 2 } else { 1 };
            assert_eq!(stats.count(status), expected, "{}", status);
        }
        assert_eq!(stats.total_revenue, 52.0 + 100.0);
    }

    #[tokio::test]
    async fn test_process_payment_sends_action() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move {
            client
                .process_payment("ORD-1-000", PaymentRequest::new().with_transaction_id("PP-1"))
                .await
        });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action");
        assert_eq!(id, "ORD-1-000");
        match action {
            OrderAction::ProcessPayment(request) => assert_eq!(request.transaction_id.as_deref(), Some("PP-1")),
            _ => panic!("Unexpected action: {:?}", action),
        }
        // A mismatched reply is surfaced as a communication error.
        let cancelled = order_at("ORD-1-000", 1, OrderStatus::Cancelled, 60.0);
        responder.send(Ok(OrderActionResult::Cancel(cancelled))).unwrap();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(OrderError::ActorCommunicationError(_))));
    }

    #[tokio::test]
    async fn test_override_and_create_forward_errors() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner);

        let override_client = client.clone();
        let task = tokio::spawn(async move {
            override_client
                .override_status("ORD-missing", StatusOverride::to(OrderStatus::Failed))
                .await
        });
        let (id, patch, responder) = expect_update(&mut receiver).await.expect("Expected Update");
        assert_eq!(id, "ORD-missing");
        assert_eq!(patch.status, OrderStatus::Failed);
        responder.send(Err(OrderError::NotFound(id))).unwrap();
        assert_eq!(task.await.unwrap(), Err(OrderError::NotFound("ORD-missing".into())));

        let task = tokio::spawn(async move {
            client
                .create_order(OrderCreate::new(vec![LineItem::new("a", "Soap", 60.0, 2)]))
                .await
        });
        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Create");
        assert_eq!(params.items[0].quantity, 2);
        drop(responder);
        assert!(matches!(task.await.unwrap(), Err(OrderError::ActorCommunicationError(_))));
    }
}
