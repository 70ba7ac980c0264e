use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::actions::{OrderAction, OrderActionResult, PaymentOutcome, PaymentReceipt, PaymentRequest, StatusOverride};
use super::error::OrderError;
use crate::actor_framework::Entity;
use crate::domain::{generate_transaction_id, Order, OrderCreate, OrderStatus, CANCELLATION_REASON_KEY};

/// Largest difference between captured and ordered amounts still treated as equal.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Patch = StatusOverride;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Validates the input and builds a pending order stamped with the
    /// current instant.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        Order::from_create(id, params, Utc::now())
    }

    fn on_create(&mut self) -> Result<(), OrderError> {
        info!(order_id = %self.id, amount = self.payment.amount, items = self.items.len(), "Order created");
        Ok(())
    }

    /// Applies an administrative override. No transition rules apply here,
    /// so terminal orders can be reopened.
    fn on_update(&mut self, patch: StatusOverride) -> Result<(), OrderError> {
        warn!(order_id = %self.id, from = %self.status, to = %patch.status, "Administrative status override");
        self.set_status(patch.status, Utc::now());
        if let Some(transaction_id) = patch.transaction_id {
            self.payment.transaction_id = Some(transaction_id);
        }
        if let Some(payment_status) = patch.payment_status {
            self.payment.status = payment_status;
        }
        if let Some(payer_info) = patch.payer_info {
            self.payment.payer_info = Some(payer_info);
        }
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::ProcessPayment(request) => self.process_payment(request).map(OrderActionResult::ProcessPayment),
            OrderAction::Cancel { reason } => self.cancel(reason).map(OrderActionResult::Cancel),
        }
    }
}

impl Order {
    fn process_payment(&mut self, request: PaymentRequest) -> Result<PaymentOutcome, OrderError> {
        if self.status == OrderStatus::Completed {
            return Err(OrderError::InvalidState(format!("Order {} already completed", self.id)));
        }

        self.set_status(OrderStatus::Processing, Utc::now());
        debug!(order_id = %self.id, "Settling payment");

        match settle(self, &request) {
            Ok(receipt) => {
                self.payment.transaction_id = Some(receipt.transaction_id.clone());
                self.payment.status = "completed".to_string();
                if let Some(payer_info) = request.payer_info {
                    self.payment.payer_info = Some(payer_info);
                }
                self.set_status(OrderStatus::Completed, receipt.timestamp);
                info!(order_id = %self.id, transaction_id = %receipt.transaction_id, "Payment completed");
                Ok(PaymentOutcome::Succeeded {
                    order: self.clone(),
                    receipt,
                })
            }
            Err(error) => {
                self.payment.status = "failed".to_string();
                self.set_status(OrderStatus::Failed, Utc::now());
                warn!(order_id = %self.id, %error, "Payment failed");
                Ok(PaymentOutcome::Failed { error })
            }
        }
    }

    fn cancel(&mut self, reason: Option<String>) -> Result<Order, OrderError> {
        if self.status == OrderStatus::Completed {
            return Err(OrderError::InvalidState(format!("Cannot cancel completed order {}", self.id)));
        }
        let reason = reason.unwrap_or_default();
        info!(order_id = %self.id, from = %self.status, %reason, "Order cancelled");
        self.metadata
            .insert(CANCELLATION_REASON_KEY.to_string(), Value::String(reason));
        self.set_status(OrderStatus::Cancelled, Utc::now());
        Ok(self.clone())
    }
}

fn settle(order: &Order, request: &PaymentRequest) -> Result<PaymentReceipt, String> {
    if let Some(captured) = request.captured_amount {
        if !captured.is_finite() || (captured - order.payment.amount).abs() > AMOUNT_TOLERANCE {
            return Err(format!(
                "Captured amount {:.2} does not match order amount {:.2}",
                captured, order.payment.amount
            ));
        }
    }

    let now = Utc::now();
    let transaction_id = request
        .transaction_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| generate_transaction_id(now));
    Ok(PaymentReceipt {
        transaction_id,
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineItem;
    use serde_json::json;

    fn pending_order() -> Order {
        let params = OrderCreate::new(vec![LineItem::new("a", "Soap", 60.0, 2)]);
        Order::from_create_params("ORD-1-001".into(), params).unwrap()
    }

    fn pay(order: &mut Order, request: PaymentRequest) -> Result<PaymentOutcome, OrderError> {
        match order.handle_action(OrderAction::ProcessPayment(request))? {
            OrderActionResult::ProcessPayment(outcome) => Ok(outcome),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_payment_completes_with_supplied_transaction() {
        let mut order = pending_order();
        let outcome = pay(
            &mut order,
            PaymentRequest::new()
                .with_transaction_id("PAYPAL-123")
                .with_payer_info(json!({"name": "Lilian"}))
                .with_captured_amount(120.0),
        )
        .unwrap();

        let PaymentOutcome::Succeeded { order: settled, receipt } = outcome else {
            panic!("payment should succeed");
        };
        assert_eq!(receipt.transaction_id, "PAYPAL-123");
        assert_eq!(settled, order);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.payment.status, "completed");
        assert_eq!(order.payment.transaction_id.as_deref(), Some("PAYPAL-123"));
        assert_eq!(order.payment.payer_info, Some(json!({"name": "Lilian"})));
    }

    #[test]
    fn test_payment_generates_transaction_when_blank() {
        let mut order = pending_order();
        let outcome = pay(&mut order, PaymentRequest::new().with_transaction_id("  ")).unwrap();

        assert!(outcome.is_success());
        assert!(order.payment.transaction_id.unwrap().starts_with("TXN-"));
        assert_eq!(order.payment.payer_info, None);
    }

    #[test]
    fn test_amount_mismatch_fails_order() {
        let mut order = pending_order();
        let outcome = pay(&mut order, PaymentRequest::new().with_captured_amount(100.0)).unwrap();

        assert!(matches!(outcome, PaymentOutcome::Failed { ref error } if error.contains("does not match")));
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.payment.status, "failed");

        // A failed order may be retried.
        assert!(pay(&mut order, PaymentRequest::new()).unwrap().is_success());
    }

    #[test]
    fn test_payment_rejected_only_once_completed() {
        let mut order = pending_order();
        pay(&mut order, PaymentRequest::new()).unwrap();
        assert!(matches!(pay(&mut order, PaymentRequest::new()), Err(OrderError::InvalidState(_))));

        // A cancelled order can still be settled.
        let mut order = pending_order();
        order.handle_action(OrderAction::Cancel { reason: None }).unwrap();
        assert!(pay(&mut order, PaymentRequest::new()).unwrap().is_success());
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn test_cancel_records_reason() {
        let mut order = pending_order();
        order
            .handle_action(OrderAction::Cancel { reason: Some("Changed mind".into()) })
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some("Changed mind"));

        let mut order = pending_order();
        order.handle_action(OrderAction::Cancel { reason: None }).unwrap();
        assert_eq!(order.cancellation_reason(), Some(""));
    }

    #[test]
    fn test_override_can_reopen_completed_order() {
        let mut order = pending_order();
        pay(&mut order, PaymentRequest::new()).unwrap();
        let before = order.timestamps.updated;

        order
            .on_update(StatusOverride::to(OrderStatus::Pending).with_payment_status("refunded"))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment.status, "refunded");
        assert!(order.payment.transaction_id.is_some());
        assert!(order.timestamps.updated >= before);
    }
}
