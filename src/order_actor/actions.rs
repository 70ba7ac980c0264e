use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Order, OrderStatus};

/// Lifecycle actions for Order entities.
///
/// Unlike [`StatusOverride`], these respect the status machine.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves the order through `processing` to `completed`, or to `failed`
    /// when settlement is rejected.
    ///
    /// # Errors
    /// Rejected with `InvalidState` when the order is already completed.
    ProcessPayment(PaymentRequest),
    /// Cancels any order that is not completed.
    Cancel { reason: Option<String> },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    ProcessPayment(PaymentOutcome),
    Cancel(Order),
}

/// Settlement details reported by the checkout once the payment provider has
/// approved the purchase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub transaction_id: Option<String>,
    pub payer_info: Option<Value>,
    /// Amount the provider says it captured. Must match the order amount.
    pub captured_amount: Option<f64>,
}

impl PaymentRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_payer_info(mut self, payer_info: Value) -> Self {
        self.payer_info = Some(payer_info);
        self
    }

    pub fn with_captured_amount(mut self, amount: f64) -> Self {
        self.captured_amount = Some(amount);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Succeeded { order: Order, receipt: PaymentReceipt },
    Failed { error: String },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded { .. })
    }
}

/// Administrative override: sets any status on any order, bypassing the
/// lifecycle rules, and optionally patches payment fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverride {
    pub status: OrderStatus,
    pub transaction_id: Option<String>,
    pub payment_status: Option<String>,
    pub payer_info: Option<Value>,
}

impl StatusOverride {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            transaction_id: None,
            payment_status: None,
            payer_info: None,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_payment_status(mut self, payment_status: impl Into<String>) -> Self {
        self.payment_status = Some(payment_status.into());
        self
    }

    pub fn with_payer_info(mut self, payer_info: Value) -> Self {
        self.payer_info = Some(payer_info);
        self
    }
}
