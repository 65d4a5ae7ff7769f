use crimson_core::StoreError;
use thiserror::Error;

use crate::models::{FailedItem, PurchasedItem};

/// Checkout failure taxonomy.
///
/// The client errors (`EmptyCart`, `InvalidCustomer`, `IdempotencyKeyInUse`)
/// and `NoStaffAvailable` are raised before any inventory mutation.
/// `PartialFailure` is the per-item commit outcome: purchased items stay
/// committed, failed items are rolled back to Reserved.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("customer {0} not found")]
    InvalidCustomer(i64),

    #[error("no staff available to process the order")]
    NoStaffAvailable,

    #[error("idempotency key was already used by another customer")]
    IdempotencyKeyInUse,

    #[error("failed to create transaction: {0}")]
    TransactionCreateFailed(String),

    #[error("{} of {} items could not be purchased", failed.len(), failed.len() + purchased.len())]
    PartialFailure {
        /// None when no item succeeded and the transaction row was voided.
        transaction_id: Option<i64>,
        purchased: Vec<PurchasedItem>,
        failed: Vec<FailedItem>,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CheckoutError::StoreUnavailable(msg),
            other => CheckoutError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Cart operation failures, surfaced verbatim to the UI.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("copy {0} not found")]
    NotFound(i64),

    #[error("copy {0} is already sold")]
    AlreadySold(i64),

    #[error("copy {0} is reserved by another cart")]
    AlreadyReserved(i64),

    #[error("copy {0} is already in your cart")]
    DuplicateItem(i64),

    #[error("copy {0} is not held by this cart")]
    NotHeld(i64),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CartError {
    fn from(err: StoreError) -> Self {
        CartError::Store(err)
    }
}
