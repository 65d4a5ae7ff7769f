//! In-memory fakes for the repository traits, used by the workflow and cart
//! tests. The inventory fake implements the same compare-and-set contract as
//! the real store: transitions only happen when the current state matches.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crimson_core::account::{Customer, NewAccount, Staff};
use crimson_core::inventory::{BookCopy, NewCopy};
use crimson_core::order::{OrderLineItem, OrderStatus, Transaction};
use crimson_core::repository::{AccountRepository, InventoryRepository, OrderRepository};
use crimson_core::{CopyStatus, StoreError};

use crate::models::SessionContext;

pub fn session(customer_id: i64, session_id: &str) -> SessionContext {
    SessionContext {
        customer_id,
        session_id: session_id.to_string(),
    }
}

pub fn copy_in_store(copy_id: i64, price_cents: i64) -> BookCopy {
    BookCopy {
        copy_id,
        isbn: "9780131103627".to_string(),
        edition: 2,
        year_printed: 1988,
        price_cents,
        condition: "Good".to_string(),
        date_added: Utc::now(),
        status: CopyStatus::InStore,
        reserved_by: None,
        reserved_until: None,
    }
}

pub fn customer(id: i64) -> Customer {
    Customer {
        customer_id: id,
        name: format!("Customer {id}"),
        password_hash: String::new(),
        email: format!("customer{id}@campus.test"),
        created_date: Utc::now(),
    }
}

pub fn staff(id: i64) -> Staff {
    Staff {
        staff_id: id,
        name: format!("Staff {id}"),
        password_hash: String::new(),
        email: format!("staff{id}@store.test"),
        created_date: Utc::now(),
    }
}

// ============================================================================
// Inventory fake
// ============================================================================

pub struct InMemoryInventory {
    copies: Mutex<HashMap<i64, BookCopy>>,
}

impl InMemoryInventory {
    pub fn new(copies: Vec<BookCopy>) -> Self {
        Self {
            copies: Mutex::new(copies.into_iter().map(|c| (c.copy_id, c)).collect()),
        }
    }

    pub fn get(&self, copy_id: i64) -> BookCopy {
        self.copies.lock().unwrap()[&copy_id].clone()
    }

    /// Test setup shortcut: reserve with a far-future expiry.
    pub fn reserve(&self, copy_id: i64, session_id: &str) {
        let mut copies = self.copies.lock().unwrap();
        let copy = copies.get_mut(&copy_id).unwrap();
        copy.status = CopyStatus::Reserved;
        copy.reserved_by = Some(session_id.to_string());
        copy.reserved_until = Some(Utc::now() + Duration::minutes(30));
    }

    /// Simulates another party having bought the copy.
    pub fn force_sold(&self, copy_id: i64) {
        let mut copies = self.copies.lock().unwrap();
        let copy = copies.get_mut(&copy_id).unwrap();
        copy.status = CopyStatus::Sold;
        copy.reserved_by = None;
        copy.reserved_until = None;
    }

    pub fn reserved_by(&self, session_id: &str) -> Vec<BookCopy> {
        self.copies
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_reserved_by(session_id))
            .cloned()
            .collect()
    }

    fn cas<F>(&self, copy_id: i64, check: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BookCopy) -> bool,
    {
        let mut copies = self.copies.lock().unwrap();
        let copy = copies
            .get_mut(&copy_id)
            .ok_or_else(|| StoreError::not_found("copy", copy_id))?;
        if check(copy) {
            Ok(())
        } else {
            Err(StoreError::conflict("copy", copy_id))
        }
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventory {
    async fn get_copy(&self, copy_id: i64) -> Result<Option<BookCopy>, StoreError> {
        Ok(self.copies.lock().unwrap().get(&copy_id).cloned())
    }

    async fn list_copies(&self) -> Result<Vec<BookCopy>, StoreError> {
        Ok(self.copies.lock().unwrap().values().cloned().collect())
    }

    async fn list_copies_by_isbn(&self, isbn: &str) -> Result<Vec<BookCopy>, StoreError> {
        Ok(self
            .copies
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.isbn == isbn)
            .cloned()
            .collect())
    }

    async fn list_copies_by_status(&self, status: CopyStatus) -> Result<Vec<BookCopy>, StoreError> {
        Ok(self
            .copies
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }

    async fn create_copy(&self, copy: &NewCopy) -> Result<BookCopy, StoreError> {
        let mut copies = self.copies.lock().unwrap();
        let copy_id = copies.keys().max().copied().unwrap_or(0) + 1;
        let created = BookCopy {
            copy_id,
            isbn: copy.isbn.clone(),
            edition: copy.edition,
            year_printed: copy.year_printed,
            price_cents: copy.price_cents,
            condition: copy.condition.clone(),
            date_added: Utc::now(),
            status: CopyStatus::InStore,
            reserved_by: None,
            reserved_until: None,
        };
        copies.insert(copy_id, created.clone());
        Ok(created)
    }

    async fn update_copy(&self, copy: &BookCopy) -> Result<(), StoreError> {
        let mut copies = self.copies.lock().unwrap();
        let existing = copies
            .get_mut(&copy.copy_id)
            .ok_or_else(|| StoreError::not_found("copy", copy.copy_id))?;
        existing.edition = copy.edition;
        existing.year_printed = copy.year_printed;
        existing.price_cents = copy.price_cents;
        existing.condition = copy.condition.clone();
        Ok(())
    }

    async fn delete_copy(&self, copy_id: i64) -> Result<(), StoreError> {
        let mut copies = self.copies.lock().unwrap();
        match copies.get(&copy_id) {
            None => Err(StoreError::not_found("copy", copy_id)),
            Some(c) if c.status == CopyStatus::Sold => Err(StoreError::conflict("copy", copy_id)),
            Some(_) => {
                copies.remove(&copy_id);
                Ok(())
            }
        }
    }

    async fn set_copy_status(
        &self,
        copy_id: i64,
        expected: CopyStatus,
        new: CopyStatus,
    ) -> Result<(), StoreError> {
        if new == CopyStatus::Reserved {
            return Err(StoreError::conflict("copy", copy_id));
        }
        self.cas(copy_id, |c| {
            if c.status == expected {
                c.status = new;
                c.reserved_by = None;
                c.reserved_until = None;
                true
            } else {
                false
            }
        })
    }

    async fn reserve_copy(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.cas(copy_id, |c| {
            if c.status == CopyStatus::InStore {
                c.status = CopyStatus::Reserved;
                c.reserved_by = Some(session_id.to_string());
                c.reserved_until = Some(until);
                true
            } else {
                false
            }
        })
    }

    async fn release_copy(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError> {
        self.cas(copy_id, |c| {
            if c.is_reserved_by(session_id) {
                c.status = CopyStatus::InStore;
                c.reserved_by = None;
                c.reserved_until = None;
                true
            } else {
                false
            }
        })
    }

    async fn mark_sold(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError> {
        self.cas(copy_id, |c| {
            if c.is_reserved_by(session_id) {
                c.status = CopyStatus::Sold;
                c.reserved_by = None;
                c.reserved_until = None;
                true
            } else {
                false
            }
        })
    }

    async fn revert_sold(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.cas(copy_id, |c| {
            if c.status == CopyStatus::Sold {
                c.status = CopyStatus::Reserved;
                c.reserved_by = Some(session_id.to_string());
                c.reserved_until = Some(until);
                true
            } else {
                false
            }
        })
    }

    async fn list_reserved_by(&self, session_id: &str) -> Result<Vec<BookCopy>, StoreError> {
        Ok(self.reserved_by(session_id))
    }

    async fn release_all_for_session(&self, session_id: &str) -> Result<u64, StoreError> {
        let mut copies = self.copies.lock().unwrap();
        let mut released = 0;
        for copy in copies.values_mut() {
            if copy.is_reserved_by(session_id) {
                copy.status = CopyStatus::InStore;
                copy.reserved_by = None;
                copy.reserved_until = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut copies = self.copies.lock().unwrap();
        let mut released = 0;
        for copy in copies.values_mut() {
            if copy.reservation_expired(now) {
                copy.status = CopyStatus::InStore;
                copy.reserved_by = None;
                copy.reserved_until = None;
                released += 1;
            }
        }
        Ok(released)
    }
}

// ============================================================================
// Account fake
// ============================================================================

pub struct InMemoryAccounts {
    customers: Mutex<Vec<Customer>>,
    staff: Mutex<Vec<Staff>>,
}

impl InMemoryAccounts {
    pub fn new(customers: Vec<Customer>, staff: Vec<Staff>) -> Self {
        Self {
            customers: Mutex::new(customers),
            staff: Mutex::new(staff),
        }
    }

    pub fn clear_staff(&self) {
        self.staff.lock().unwrap().clear();
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.customers.lock().unwrap().clone())
    }

    async fn create_customer(&self, account: &NewAccount) -> Result<Customer, StoreError> {
        let mut customers = self.customers.lock().unwrap();
        let id = customers.iter().map(|c| c.customer_id).max().unwrap_or(0) + 1;
        let created = Customer {
            customer_id: id,
            name: account.name.clone(),
            password_hash: account.password_hash.clone(),
            email: account.email.clone(),
            created_date: Utc::now(),
        };
        customers.push(created.clone());
        Ok(created)
    }

    async fn update_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut customers = self.customers.lock().unwrap();
        let existing = customers
            .iter_mut()
            .find(|c| c.customer_id == customer.customer_id)
            .ok_or_else(|| StoreError::not_found("customer", customer.customer_id))?;
        existing.name = customer.name.clone();
        existing.email = customer.email.clone();
        Ok(())
    }

    async fn delete_customer(&self, customer_id: i64) -> Result<(), StoreError> {
        let mut customers = self.customers.lock().unwrap();
        let before = customers.len();
        customers.retain(|c| c.customer_id != customer_id);
        if customers.len() == before {
            return Err(StoreError::not_found("customer", customer_id));
        }
        Ok(())
    }

    async fn get_staff(&self, staff_id: i64) -> Result<Option<Staff>, StoreError> {
        Ok(self
            .staff
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.staff_id == staff_id)
            .cloned())
    }

    async fn get_staff_by_email(&self, email: &str) -> Result<Option<Staff>, StoreError> {
        Ok(self
            .staff
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn list_staff(&self) -> Result<Vec<Staff>, StoreError> {
        Ok(self.staff.lock().unwrap().clone())
    }

    async fn create_staff(&self, account: &NewAccount) -> Result<Staff, StoreError> {
        let mut staff = self.staff.lock().unwrap();
        let id = staff.iter().map(|s| s.staff_id).max().unwrap_or(0) + 1;
        let created = Staff {
            staff_id: id,
            name: account.name.clone(),
            password_hash: account.password_hash.clone(),
            email: account.email.clone(),
            created_date: Utc::now(),
        };
        staff.push(created.clone());
        Ok(created)
    }

    async fn update_staff(&self, staff: &Staff) -> Result<(), StoreError> {
        let mut roster = self.staff.lock().unwrap();
        let existing = roster
            .iter_mut()
            .find(|s| s.staff_id == staff.staff_id)
            .ok_or_else(|| StoreError::not_found("staff", staff.staff_id))?;
        existing.name = staff.name.clone();
        existing.email = staff.email.clone();
        Ok(())
    }

    async fn delete_staff(&self, staff_id: i64) -> Result<(), StoreError> {
        let mut staff = self.staff.lock().unwrap();
        let before = staff.len();
        staff.retain(|s| s.staff_id != staff_id);
        if staff.len() == before {
            return Err(StoreError::not_found("staff", staff_id));
        }
        Ok(())
    }
}

// ============================================================================
// Order fake
// ============================================================================

pub struct InMemoryOrders {
    transactions: Mutex<Vec<Transaction>>,
    items: Mutex<Vec<OrderLineItem>>,
    next_tx: Mutex<i64>,
    next_item: Mutex<i64>,
    fail_copy_ids: Mutex<HashSet<i64>>,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
            next_tx: Mutex::new(1),
            next_item: Mutex::new(1),
            fail_copy_ids: Mutex::new(HashSet::new()),
        }
    }

    /// Injects a failure: creating a line item for this copy id errors.
    pub fn fail_line_items_for_copy(&self, copy_id: i64) {
        self.fail_copy_ids.lock().unwrap().insert(copy_id);
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<OrderLineItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn items_for(&self, transaction_id: i64) -> Vec<OrderLineItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.transaction_id == transaction_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn create_transaction(
        &self,
        customer_id: i64,
        date: DateTime<Utc>,
        idempotency_key: Option<&str>,
    ) -> Result<Transaction, StoreError> {
        let mut next = self.next_tx.lock().unwrap();
        let tx = Transaction {
            transaction_id: *next,
            date_of_transaction: date,
            customer_id,
            idempotency_key: idempotency_key.map(String::from),
        };
        *next += 1;
        self.transactions.lock().unwrap().push(tx.clone());
        Ok(tx)
    }

    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }

    async fn find_transaction_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions())
    }

    async fn list_transactions_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError> {
        let mut transactions = self.transactions.lock().unwrap();
        let before = transactions.len();
        transactions.retain(|t| t.transaction_id != transaction_id);
        if transactions.len() == before {
            return Err(StoreError::not_found("transaction", transaction_id));
        }
        Ok(())
    }

    async fn create_line_item(
        &self,
        transaction_id: i64,
        copy_id: i64,
        staff_id: i64,
        status: OrderStatus,
    ) -> Result<OrderLineItem, StoreError> {
        if self.fail_copy_ids.lock().unwrap().contains(&copy_id) {
            return Err(StoreError::Unavailable("injected line item failure".into()));
        }
        let mut next = self.next_item.lock().unwrap();
        let item = OrderLineItem {
            order_id: *next,
            transaction_id,
            copy_id,
            status,
            staff_id,
        };
        *next += 1;
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn get_line_item(&self, order_id: i64) -> Result<Option<OrderLineItem>, StoreError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.order_id == order_id)
            .cloned())
    }

    async fn delete_line_item(&self, order_id: i64) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.order_id != order_id);
        if items.len() == before {
            return Err(StoreError::not_found("order line item", order_id));
        }
        Ok(())
    }

    async fn list_items_by_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<Vec<OrderLineItem>, StoreError> {
        Ok(self.items_for(transaction_id))
    }

    async fn list_items_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<OrderLineItem>, StoreError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == status)
            .cloned()
            .collect())
    }
}
