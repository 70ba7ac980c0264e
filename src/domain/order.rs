use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::order_actor::OrderError;

/// Free-form JSON object used for customer details and metadata.
pub type Attributes = Map<String, Value>;

/// Metadata key written by a cancellation.
pub const CANCELLATION_REASON_KEY: &str = "cancellationReason";

const BASE36_UPPER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Position of an order in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::ValidationError(format!("Unknown order status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Paypal,
    Card,
    Cash,
}

/// A catalog entry reference with quantity and price captured at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    fn validate(&self) -> Result<(), OrderError> {
        if self.id.trim().is_empty() {
            return Err(OrderError::ValidationError(format!("Invalid item in order: missing id ({})", self.name)));
        }
        if self.name.trim().is_empty() {
            return Err(OrderError::ValidationError(format!("Invalid item in order: missing name ({})", self.id)));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(OrderError::ValidationError(format!(
                "Invalid price for item {}: {}",
                self.id, self.price
            )));
        }
        if self.quantity < 1 {
            return Err(OrderError::ValidationError(format!(
                "Invalid quantity for item {}: {}",
                self.id, self.quantity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: String,
    pub transaction_id: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// A customer's requested set of line items plus payment and lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub customer: Attributes,
    pub payment: Payment,
    pub timestamps: Timestamps,
    #[serde(default)]
    pub metadata: Attributes,
}

impl Order {
    /// Builds a pending order. The payment amount is fixed here and never
    /// recomputed afterwards.
    pub fn from_create(id: String, params: OrderCreate, now: DateTime<Utc>) -> Result<Self, OrderError> {
        params.validate()?;
        let amount = order_total(&params.items);
        Ok(Self {
            id,
            status: OrderStatus::Pending,
            items: params.items,
            customer: params.customer,
            payment: Payment {
                method: params.payment_method,
                status: "pending".to_string(),
                transaction_id: None,
                amount,
                payer_info: None,
            },
            timestamps: Timestamps { created: now, updated: now },
            metadata: params.metadata,
        })
    }

    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.timestamps.updated = now;
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.metadata.get(CANCELLATION_REASON_KEY).and_then(Value::as_str)
    }
}

/// Input for creating an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub customer: Attributes,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub metadata: Attributes,
}

impl OrderCreate {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self {
            items,
            customer: Attributes::new(),
            payment_method: PaymentMethod::default(),
            metadata: Attributes::new(),
        }
    }

    pub fn with_customer(mut self, customer: Attributes) -> Self {
        self.customer = customer;
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_metadata(mut self, metadata: Attributes) -> Self {
        self.metadata = metadata;
        self
    }

    /// Parses order input as supplied by a checkout page. Missing or
    /// malformed fields are validation failures.
    pub fn from_json(json: &str) -> Result<Self, OrderError> {
        let params: OrderCreate = serde_json::from_str(json)
            .map_err(|e| OrderError::ValidationError(format!("Malformed order data: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::ValidationError("Order must have at least one item".to_string()));
        }
        self.items.iter().try_for_each(LineItem::validate)
    }
}

pub fn order_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::line_total).sum()
}

/// `ORD-<millis>-<3 digits>`. Not unique by construction; the store retries
/// on collision.
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("ORD-{}-{:03}", now.timestamp_millis(), suffix)
}

/// `TXN-<millis>-<9 uppercase base36 chars>`.
pub fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let tail: String = (0..9)
        .map(|_| BASE36_UPPER[rng.gen_range(0..BASE36_UPPER.len())] as char)
        .collect();
    format!("TXN-{}-{}", now.timestamp_millis(), tail)
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_revenue: f64,
}

impl OrderStats {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Completed => {
                    stats.completed += 1;
                    stats.total_revenue += order.payment.amount;
                }
                OrderStatus::Failed => stats.failed += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            stats
        })
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Processing => self.processing,
            OrderStatus::Completed => self.completed,
            OrderStatus::Failed => self.failed,
            OrderStatus::Cancelled => self.cancelled,
        }
    }
}

/// Most recent first; equal creation instants fall back to id, descending,
/// so the order is stable across reloads.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.timestamps
            .created
            .cmp(&a.timestamps.created)
            .then_with(|| b.id.cmp(&a.id))
    });
}
