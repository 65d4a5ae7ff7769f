use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the caller, passed explicitly into the workflow instead of
/// being held as ambient state. `session_id` owns the reservations; two
/// logins by the same customer are two sessions with two carts.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub customer_id: i64,
    pub session_id: String,
}

/// Checkout input. When `items` is given, it must be a subset of the copies
/// this session holds; anything not held any more is reported as failed
/// rather than silently skipped. When omitted, the whole held set is bought.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Option<Vec<i64>>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// One copy successfully purchased within a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub copy_id: i64,
    pub isbn: String,
    pub price_cents: i64,
    pub order_id: i64,
    pub staff_id: i64,
}

/// One copy that could not be purchased. Its reservation (if the customer
/// still held one) is intact, so the client can retry the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedItem {
    pub copy_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_id: i64,
    pub customer_id: i64,
    pub purchased: Vec<PurchasedItem>,
    pub total_cents: i64,
}

/// Client-facing view of one cart entry. Quantity is fixed at 1: a copy is
/// a unique physical unit.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    pub copy_id: i64,
    pub isbn: String,
    pub price_cents: i64,
    pub quantity: u32,
    pub reserved_until: Option<DateTime<Utc>>,
}

impl From<&crimson_core::BookCopy> for CartEntry {
    fn from(copy: &crimson_core::BookCopy) -> Self {
        CartEntry {
            copy_id: copy.copy_id,
            isbn: copy.isbn.clone(),
            price_cents: copy.price_cents,
            quantity: 1,
            reserved_until: copy.reserved_until,
        }
    }
}
