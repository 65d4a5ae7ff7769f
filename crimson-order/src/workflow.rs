use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use crimson_core::inventory::BookCopy;
use crimson_core::order::{OrderStatus, Transaction};
use crimson_core::repository::{AccountRepository, InventoryRepository, OrderRepository};
use crimson_core::StoreError;
use tracing::{error, info, warn};

use crate::assignment::StaffAssigner;
use crate::error::CheckoutError;
use crate::models::{CheckoutRequest, FailedItem, PurchasedItem, Receipt, SessionContext};

/// Converts a session's reserved copies into a durable purchase record.
///
/// The grouping guarantee: from the customer's perspective either an item is
/// Sold with exactly one line item under the returned transaction, or it is
/// still Reserved by them with no line item. Each transition is a
/// compare-and-set, and failed items are compensated back to Reserved in the
/// same call, so no partial purchase is ever left behind.
pub struct CheckoutWorkflow {
    inventory: Arc<dyn InventoryRepository>,
    accounts: Arc<dyn AccountRepository>,
    orders: Arc<dyn OrderRepository>,
    assigner: StaffAssigner,
    reservation_ttl: Duration,
}

impl CheckoutWorkflow {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        accounts: Arc<dyn AccountRepository>,
        orders: Arc<dyn OrderRepository>,
        reservation_ttl: Duration,
    ) -> Self {
        Self {
            inventory,
            accounts,
            orders,
            assigner: StaffAssigner::new(),
            reservation_ttl,
        }
    }

    pub async fn checkout(
        &self,
        session: &SessionContext,
        request: CheckoutRequest,
    ) -> Result<Receipt, CheckoutError> {
        // 1. Idempotent retry: a transaction already recorded under this key
        // is returned as-is, with no inventory side effects. The key is
        // scoped to its customer; replaying someone else's key must not
        // hand out their receipt.
        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(tx) = self.orders.find_transaction_by_idempotency_key(key).await? {
                if tx.customer_id != session.customer_id {
                    warn!(
                        transaction_id = tx.transaction_id,
                        customer_id = session.customer_id,
                        "idempotency key replay from a different customer"
                    );
                    return Err(CheckoutError::IdempotencyKeyInUse);
                }
                info!(transaction_id = tx.transaction_id, key, "checkout replayed");
                return self.rebuild_receipt(tx).await;
            }
        }

        // 2. Preconditions: identity, then the held set. No side effects yet.
        let customer = self
            .accounts
            .get_customer(session.customer_id)
            .await?
            .ok_or(CheckoutError::InvalidCustomer(session.customer_id))?;

        let held = self
            .inventory
            .list_reserved_by(&session.session_id)
            .await?;

        let (to_commit, mut failed) = partition_requested(&held, request.items.as_deref());

        if to_commit.is_empty() && failed.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 3. Staff assignment pool, checked before any inventory mutation.
        let staff = self.accounts.list_staff().await?;
        if staff.is_empty() {
            return Err(CheckoutError::NoStaffAvailable);
        }

        if to_commit.is_empty() {
            // Everything the client asked for is gone already.
            return Err(CheckoutError::PartialFailure {
                transaction_id: None,
                purchased: Vec::new(),
                failed,
            });
        }

        // 4. One transaction row for the whole checkout.
        let tx = self
            .orders
            .create_transaction(
                customer.customer_id,
                Utc::now(),
                request.idempotency_key.as_deref(),
            )
            .await
            .map_err(|e| CheckoutError::TransactionCreateFailed(e.to_string()))?;

        // 5. Per-item commit: CAS the copy to Sold, then record the line
        // item. Any failure compensates that item back to Reserved.
        let mut purchased = Vec::new();
        for copy in &to_commit {
            let staff_member = self
                .assigner
                .assign(&staff)
                .ok_or(CheckoutError::NoStaffAvailable)?;

            match self
                .commit_item(session, &tx, copy, staff_member.staff_id)
                .await
            {
                Ok(item) => purchased.push(item),
                Err(reason) => {
                    warn!(
                        copy_id = copy.copy_id,
                        transaction_id = tx.transaction_id,
                        %reason,
                        "checkout item failed, rolled back"
                    );
                    failed.push(FailedItem {
                        copy_id: copy.copy_id,
                        reason,
                    });
                }
            }
        }

        if failed.is_empty() {
            let total_cents = purchased.iter().map(|p| p.price_cents).sum();
            info!(
                transaction_id = tx.transaction_id,
                customer_id = customer.customer_id,
                items = purchased.len(),
                "checkout complete"
            );
            return Ok(Receipt {
                transaction_id: tx.transaction_id,
                customer_id: customer.customer_id,
                purchased,
                total_cents,
            });
        }

        // Nothing sold: void the empty transaction row.
        if purchased.is_empty() {
            if let Err(e) = self.orders.delete_transaction(tx.transaction_id).await {
                error!(
                    transaction_id = tx.transaction_id,
                    error = %e,
                    "failed to void empty transaction"
                );
            }
            return Err(CheckoutError::PartialFailure {
                transaction_id: None,
                purchased,
                failed,
            });
        }

        Err(CheckoutError::PartialFailure {
            transaction_id: Some(tx.transaction_id),
            purchased,
            failed,
        })
    }

    /// Sells one copy and records its line item, compensating on failure.
    async fn commit_item(
        &self,
        session: &SessionContext,
        tx: &Transaction,
        copy: &BookCopy,
        staff_id: i64,
    ) -> Result<PurchasedItem, String> {
        match self
            .inventory
            .mark_sold(copy.copy_id, &session.session_id)
            .await
        {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) | Err(StoreError::NotFound { .. }) => {
                return Err("copy is no longer available".to_string());
            }
            Err(other) => return Err(other.to_string()),
        }

        match self
            .orders
            .create_line_item(tx.transaction_id, copy.copy_id, staff_id, OrderStatus::Fulfilled)
            .await
        {
            Ok(item) => Ok(PurchasedItem {
                copy_id: copy.copy_id,
                isbn: copy.isbn.clone(),
                price_cents: copy.price_cents,
                order_id: item.order_id,
                staff_id,
            }),
            Err(e) => {
                // Compensate: the copy goes back to Reserved, still owned by
                // this session, so the customer can retry it.
                let until = Utc::now() + self.reservation_ttl;
                if let Err(revert_err) = self
                    .inventory
                    .revert_sold(copy.copy_id, &session.session_id, until)
                    .await
                {
                    error!(
                        copy_id = copy.copy_id,
                        error = %revert_err,
                        "rollback of sold copy failed"
                    );
                }
                Err(e.to_string())
            }
        }
    }

    /// Rebuilds the receipt for an already-committed checkout (idempotent
    /// retry path).
    async fn rebuild_receipt(&self, tx: Transaction) -> Result<Receipt, CheckoutError> {
        let items = self
            .orders
            .list_items_by_transaction(tx.transaction_id)
            .await?;

        let mut purchased = Vec::with_capacity(items.len());
        for item in items {
            let (isbn, price_cents) = match self.inventory.get_copy(item.copy_id).await? {
                Some(copy) => (copy.isbn, copy.price_cents),
                None => (String::new(), 0),
            };
            purchased.push(PurchasedItem {
                copy_id: item.copy_id,
                isbn,
                price_cents,
                order_id: item.order_id,
                staff_id: item.staff_id,
            });
        }

        let total_cents = purchased.iter().map(|p| p.price_cents).sum();
        Ok(Receipt {
            transaction_id: tx.transaction_id,
            customer_id: tx.customer_id,
            purchased,
            total_cents,
        })
    }
}

/// Splits the requested item ids into (still held, already lost). With no
/// explicit list the whole held set is committed.
fn partition_requested(
    held: &[BookCopy],
    requested: Option<&[i64]>,
) -> (Vec<BookCopy>, Vec<FailedItem>) {
    match requested {
        None => (held.to_vec(), Vec::new()),
        Some(ids) => {
            let mut to_commit = Vec::new();
            let mut failed = Vec::new();
            let mut seen = HashSet::new();
            for &id in ids {
                if !seen.insert(id) {
                    continue;
                }
                match held.iter().find(|c| c.copy_id == id) {
                    Some(copy) => to_commit.push(copy.clone()),
                    None => failed.push(FailedItem {
                        copy_id: id,
                        reason: "copy is not reserved by this cart".to_string(),
                    }),
                }
            }
            (to_commit, failed)
        }
    }
}
