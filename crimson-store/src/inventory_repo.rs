use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crimson_core::inventory::{BookCopy, NewCopy};
use crimson_core::repository::InventoryRepository;
use crimson_core::{CopyStatus, StoreError};

use crate::database::map_db_err;

pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn copy_exists(&self, copy_id: i64) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT copy_id FROM book_copies WHERE copy_id = ?")
                .bind(copy_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    /// Resolves a zero-row conditional update: the row either is not there at
    /// all or its state did not match the guard.
    async fn cas_failure(&self, copy_id: i64) -> StoreError {
        match self.copy_exists(copy_id).await {
            Ok(true) => StoreError::conflict("copy", copy_id),
            Ok(false) => StoreError::not_found("copy", copy_id),
            Err(e) => e,
        }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct CopyRow {
    copy_id: i64,
    isbn: String,
    edition: i32,
    year_printed: i32,
    price_cents: i64,
    condition: String,
    date_added: DateTime<Utc>,
    status: String,
    reserved_by: Option<String>,
    reserved_until: Option<DateTime<Utc>>,
}

impl TryFrom<CopyRow> for BookCopy {
    type Error = StoreError;

    fn try_from(row: CopyRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<CopyStatus>().map_err(StoreError::Constraint)?;
        Ok(BookCopy {
            copy_id: row.copy_id,
            isbn: row.isbn,
            edition: row.edition,
            year_printed: row.year_printed,
            price_cents: row.price_cents,
            condition: row.condition,
            date_added: row.date_added,
            status,
            reserved_by: row.reserved_by,
            reserved_until: row.reserved_until,
        })
    }
}

const SELECT_COPY: &str = "SELECT copy_id, isbn, edition, year_printed, price_cents, condition, \
     date_added, status, reserved_by, reserved_until FROM book_copies";

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn get_copy(&self, copy_id: i64) -> Result<Option<BookCopy>, StoreError> {
        let row: Option<CopyRow> =
            sqlx::query_as(&format!("{SELECT_COPY} WHERE copy_id = ?"))
                .bind(copy_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        row.map(BookCopy::try_from).transpose()
    }

    async fn list_copies(&self) -> Result<Vec<BookCopy>, StoreError> {
        let rows: Vec<CopyRow> = sqlx::query_as(&format!("{SELECT_COPY} ORDER BY copy_id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.into_iter().map(BookCopy::try_from).collect()
    }

    async fn list_copies_by_isbn(&self, isbn: &str) -> Result<Vec<BookCopy>, StoreError> {
        let rows: Vec<CopyRow> =
            sqlx::query_as(&format!("{SELECT_COPY} WHERE isbn = ? ORDER BY copy_id"))
                .bind(isbn)
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        rows.into_iter().map(BookCopy::try_from).collect()
    }

    async fn list_copies_by_status(&self, status: CopyStatus) -> Result<Vec<BookCopy>, StoreError> {
        let rows: Vec<CopyRow> =
            sqlx::query_as(&format!("{SELECT_COPY} WHERE status = ? ORDER BY copy_id"))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        rows.into_iter().map(BookCopy::try_from).collect()
    }

    async fn create_copy(&self, copy: &NewCopy) -> Result<BookCopy, StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO book_copies (isbn, edition, year_printed, price_cents, condition, date_added, status) \
             VALUES (?, ?, ?, ?, ?, ?, 'In Store')",
        )
        .bind(&copy.isbn)
        .bind(copy.edition)
        .bind(copy.year_printed)
        .bind(copy.price_cents)
        .bind(&copy.condition)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        let copy_id = result.last_insert_rowid();
        self.get_copy(copy_id)
            .await?
            .ok_or_else(|| StoreError::not_found("copy", copy_id))
    }

    async fn update_copy(&self, copy: &BookCopy) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET edition = ?, year_printed = ?, price_cents = ?, condition = ? \
             WHERE copy_id = ?",
        )
        .bind(copy.edition)
        .bind(copy.year_printed)
        .bind(copy.price_cents)
        .bind(&copy.condition)
        .bind(copy.copy_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("copy", copy.copy_id));
        }
        Ok(())
    }

    async fn delete_copy(&self, copy_id: i64) -> Result<(), StoreError> {
        // Sold copies are purchase history; the guard keeps them.
        let result = sqlx::query("DELETE FROM book_copies WHERE copy_id = ? AND status != 'Sold'")
            .bind(copy_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn set_copy_status(
        &self,
        copy_id: i64,
        expected: CopyStatus,
        new: CopyStatus,
    ) -> Result<(), StoreError> {
        // A Reserved copy always carries an owner and an expiry; only
        // reserve_copy can stamp them, so a bare status edit never moves a
        // copy into Reserved.
        if new == CopyStatus::Reserved || !expected.can_transition_to(new) {
            return Err(StoreError::conflict("copy", copy_id));
        }

        let result = sqlx::query(
            "UPDATE book_copies SET status = ?, reserved_by = NULL, reserved_until = NULL \
             WHERE copy_id = ? AND status = ?",
        )
        .bind(new.as_str())
        .bind(copy_id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn reserve_copy(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'Reserved', reserved_by = ?, reserved_until = ? \
             WHERE copy_id = ? AND status = 'In Store'",
        )
        .bind(session_id)
        .bind(until)
        .bind(copy_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn release_copy(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'In Store', reserved_by = NULL, reserved_until = NULL \
             WHERE copy_id = ? AND status = 'Reserved' AND reserved_by = ?",
        )
        .bind(copy_id)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn mark_sold(&self, copy_id: i64, session_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'Sold', reserved_by = NULL, reserved_until = NULL \
             WHERE copy_id = ? AND status = 'Reserved' AND reserved_by = ?",
        )
        .bind(copy_id)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn revert_sold(
        &self,
        copy_id: i64,
        session_id: &str,
        until: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'Reserved', reserved_by = ?, reserved_until = ? \
             WHERE copy_id = ? AND status = 'Sold'",
        )
        .bind(session_id)
        .bind(until)
        .bind(copy_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(self.cas_failure(copy_id).await);
        }
        Ok(())
    }

    async fn list_reserved_by(&self, session_id: &str) -> Result<Vec<BookCopy>, StoreError> {
        let rows: Vec<CopyRow> = sqlx::query_as(&format!(
            "{SELECT_COPY} WHERE status = 'Reserved' AND reserved_by = ? ORDER BY copy_id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(BookCopy::try_from).collect()
    }

    async fn release_all_for_session(&self, session_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'In Store', reserved_by = NULL, reserved_until = NULL \
             WHERE status = 'Reserved' AND reserved_by = ?",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected())
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE book_copies SET status = 'In Store', reserved_by = NULL, reserved_until = NULL \
             WHERE status = 'Reserved' AND datetime(reserved_until) < datetime(?)",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected())
    }
}
