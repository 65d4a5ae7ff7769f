use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of one line item within a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Fulfilled,
    Processing,
    New,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Fulfilled => "Fulfilled",
            OrderStatus::Processing => "Processing",
            OrderStatus::New => "New",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fulfilled" => Ok(OrderStatus::Fulfilled),
            "Processing" => Ok(OrderStatus::Processing),
            "New" => Ok(OrderStatus::New),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// One checkout event for one customer, grouping its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: i64,
    pub date_of_transaction: DateTime<Utc>,
    pub customer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// The sale record of one copy within a transaction, credited to the staff
/// member assigned to fulfill it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub order_id: i64,
    pub transaction_id: i64,
    pub copy_id: i64,
    pub status: OrderStatus,
    pub staff_id: i64,
}
