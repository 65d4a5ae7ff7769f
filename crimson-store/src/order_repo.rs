use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crimson_core::order::{OrderLineItem, OrderStatus, Transaction};
use crimson_core::repository::OrderRepository;
use crimson_core::StoreError;

use crate::database::map_db_err;

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: i64,
    date_of_transaction: DateTime<Utc>,
    customer_id: i64,
    idempotency_key: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            transaction_id: row.transaction_id,
            date_of_transaction: row.date_of_transaction,
            customer_id: row.customer_id,
            idempotency_key: row.idempotency_key,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    order_id: i64,
    transaction_id: i64,
    copy_id: i64,
    status: String,
    staff_id: i64,
}

impl TryFrom<LineItemRow> for OrderLineItem {
    type Error = StoreError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatus>().map_err(StoreError::Constraint)?;
        Ok(OrderLineItem {
            order_id: row.order_id,
            transaction_id: row.transaction_id,
            copy_id: row.copy_id,
            status,
            staff_id: row.staff_id,
        })
    }
}

const SELECT_TX: &str =
    "SELECT transaction_id, date_of_transaction, customer_id, idempotency_key FROM transactions";
const SELECT_ITEM: &str =
    "SELECT order_id, transaction_id, copy_id, status, staff_id FROM order_line_items";

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create_transaction(
        &self,
        customer_id: i64,
        date: DateTime<Utc>,
        idempotency_key: Option<&str>,
    ) -> Result<Transaction, StoreError> {
        let result = sqlx::query(
            "INSERT INTO transactions (date_of_transaction, customer_id, idempotency_key) \
             VALUES (?, ?, ?)",
        )
        .bind(date)
        .bind(customer_id)
        .bind(idempotency_key)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(Transaction {
            transaction_id: result.last_insert_rowid(),
            date_of_transaction: date,
            customer_id,
            idempotency_key: idempotency_key.map(String::from),
        })
    }

    async fn get_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, StoreError> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TX} WHERE transaction_id = ?"))
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.map(Transaction::from))
    }

    async fn find_transaction_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TX} WHERE idempotency_key = ?"))
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.map(Transaction::from))
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> =
            sqlx::query_as(&format!("{SELECT_TX} ORDER BY transaction_id"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn list_transactions_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TX} WHERE customer_id = ? ORDER BY transaction_id"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM transactions WHERE transaction_id = ?")
            .bind(transaction_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
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
        let result = sqlx::query(
            "INSERT INTO order_line_items (transaction_id, copy_id, status, staff_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(transaction_id)
        .bind(copy_id)
        .bind(status.as_str())
        .bind(staff_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(OrderLineItem {
            order_id: result.last_insert_rowid(),
            transaction_id,
            copy_id,
            status,
            staff_id,
        })
    }

    async fn get_line_item(&self, order_id: i64) -> Result<Option<OrderLineItem>, StoreError> {
        let row: Option<LineItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEM} WHERE order_id = ?"))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        row.map(OrderLineItem::try_from).transpose()
    }

    async fn delete_line_item(&self, order_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM order_line_items WHERE order_id = ?")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order line item", order_id));
        }
        Ok(())
    }

    async fn list_items_by_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<Vec<OrderLineItem>, StoreError> {
        let rows: Vec<LineItemRow> = sqlx::query_as(&format!(
            "{SELECT_ITEM} WHERE transaction_id = ? ORDER BY order_id"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(OrderLineItem::try_from).collect()
    }

    async fn list_items_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<OrderLineItem>, StoreError> {
        let rows: Vec<LineItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEM} WHERE status = ? ORDER BY order_id"))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        rows.into_iter().map(OrderLineItem::try_from).collect()
    }
}
