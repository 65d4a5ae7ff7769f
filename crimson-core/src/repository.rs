use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{Customer, NewAccount, Staff};
use crate::catalog::{Author, Book, NewAuthor};
use crate::error::StoreError;
use crate::inventory::{BookCopy, CopyStatus, NewCopy};
use crate::order::{OrderLineItem, OrderStatus, Transaction};

/// Data access for book copies.
///
/// Every status transition here is a compare-and-set: a single conditional
/// update against the expected prior state. A mismatch returns
/// `StoreError::Conflict` and writes nothing. Read-then-write pairs are
/// never used for transitions.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn get_copy(&self, copy_id: i64) -> Result<Option<BookCopy>, StoreError>;

    async fn list_copies(&self) -> Result<Vec<BookCopy>, StoreError>;

    async fn list_copies_by_isbn(&self, isbn: &str) -> Result<Vec<BookCopy>, StoreError>;

    async fn list_copies_by_status(&self, status: CopyStatus) -> Result<Vec<BookCopy>, StoreError>;

    /// Stocks a new copy, status In Store.
    async fn create_copy(&self, copy: &NewCopy) -> Result<BookCopy, StoreError>;

    /// Updates the descriptive fields of a copy (edition, price, condition).
    /// Status is deliberately not writable here.
    async fn update_copy(&self, copy: &BookCopy) -> Result<(), StoreError>;

    /// Deletes a copy. Sold copies are purchase history and cannot be
    /// deleted; attempting to returns `Conflict`.
    async fn delete_copy(&self, copy_id: i64) -> Result<(), StoreError>;

    /// Compare-and-set on status, for staff corrections. Transitions into
    /// Reserved are rejected: holds always carry an owner and expiry, and
    /// only `reserve_copy` stamps them.
    async fn set_copy_status(
        &self,
        copy_id: i64,
        expected: CopyStatus,
        new: CopyStatus,
    ) -> Result<(), StoreError>;

    /// In Store -> Reserved, stamping the owning session and expiry.
    async fn reserve_copy(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Reserved -> In Store, only if held by `session_id`.
    async fn release_copy(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError>;

    /// Reserved -> Sold, only if held by `session_id`. Clears the owner.
    async fn mark_sold(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError>;

    /// Checkout compensation: Sold -> Reserved, restoring the owner so the
    /// customer keeps the hold on a failed item.
    async fn revert_sold(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The server-side view of a cart: copies currently Reserved by a session.
    async fn list_reserved_by(&self, session_id: &str) -> Result<Vec<BookCopy>, StoreError>;

    /// Releases every reservation held by a session (logout). Returns the
    /// number of copies released.
    async fn release_all_for_session(&self, session_id: &str) -> Result<u64, StoreError>;

    /// Releases reservations whose expiry has passed (TTL sweep).
    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Data access for books and authors (read-mostly reference data).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError>;
    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, StoreError>;
    async fn create_book(&self, book: &Book) -> Result<(), StoreError>;
    async fn update_book(&self, book: &Book) -> Result<(), StoreError>;
    async fn delete_book(&self, isbn: &str) -> Result<(), StoreError>;

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError>;
    async fn list_authors_by_isbn(&self, isbn: &str) -> Result<Vec<Author>, StoreError>;
    async fn create_author(&self, author: &NewAuthor) -> Result<Author, StoreError>;
    async fn update_author(&self, author: &Author) -> Result<(), StoreError>;
    async fn delete_author(&self, author_id: i64) -> Result<(), StoreError>;
}

/// Data access for customer and staff identities.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError>;
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError>;
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;
    async fn create_customer(&self, account: &NewAccount) -> Result<Customer, StoreError>;
    /// Updates name and email. The password hash is managed by the auth
    /// surface and is not writable here.
    async fn update_customer(&self, customer: &Customer) -> Result<(), StoreError>;
    async fn delete_customer(&self, customer_id: i64) -> Result<(), StoreError>;

    async fn get_staff(&self, staff_id: i64) -> Result<Option<Staff>, StoreError>;
    async fn get_staff_by_email(&self, email: &str) -> Result<Option<Staff>, StoreError>;
    async fn list_staff(&self) -> Result<Vec<Staff>, StoreError>;
    async fn create_staff(&self, account: &NewAccount) -> Result<Staff, StoreError>;
    async fn update_staff(&self, staff: &Staff) -> Result<(), StoreError>;
    async fn delete_staff(&self, staff_id: i64) -> Result<(), StoreError>;
}

/// Data access for transactions and order line items. Creation and deletion
/// are driven by the checkout workflow only; the HTTP surface exposes reads.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_transaction(
        &self,
        customer_id: i64,
        date: DateTime<Utc>,
        idempotency_key: Option<&str>,
    ) -> Result<Transaction, StoreError>;

    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, StoreError>;

    async fn find_transaction_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn list_transactions_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Rollback path: voids a transaction that ended up with no line items.
    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError>;

    async fn create_line_item(
        &self,
        transaction_id: i64,
        copy_id: i64,
        staff_id: i64,
        status: OrderStatus,
    ) -> Result<OrderLineItem, StoreError>;

    async fn get_line_item(&self, order_id: i64) -> Result<Option<OrderLineItem>, StoreError>;

    /// Rollback path: removes a line item created earlier in the same
    /// checkout call.
    async fn delete_line_item(&self, order_id: i64) -> Result<(), StoreError>;

    async fn list_items_by_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<Vec<OrderLineItem>, StoreError>;

    async fn list_items_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<OrderLineItem>, StoreError>;
}
