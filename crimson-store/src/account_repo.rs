use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crimson_core::account::{Customer, NewAccount, Staff};
use crimson_core::repository::AccountRepository;
use crimson_core::StoreError;

use crate::database::map_db_err;

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// Customers and staffs share a shape but live in separate tables; the row
// struct is reused for both.
#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    password_hash: String,
    email: String,
    created_date: DateTime<Utc>,
}

impl From<AccountRow> for Customer {
    fn from(row: AccountRow) -> Self {
        Customer {
            customer_id: row.id,
            name: row.name,
            password_hash: row.password_hash,
            email: row.email,
            created_date: row.created_date,
        }
    }
}

impl From<AccountRow> for Staff {
    fn from(row: AccountRow) -> Self {
        Staff {
            staff_id: row.id,
            name: row.name,
            password_hash: row.password_hash,
            email: row.email,
            created_date: row.created_date,
        }
    }
}

const SELECT_CUSTOMER: &str = "SELECT customer_id AS id, name, password_hash, email, created_date FROM customers";
const SELECT_STAFF: &str = "SELECT staff_id AS id, name, password_hash, email, created_date FROM staffs";

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>, StoreError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE customer_id = ?"))
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.map(Customer::from))
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Customer::from))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows: Vec<AccountRow> =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} ORDER BY customer_id"))
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn create_customer(&self, account: &NewAccount) -> Result<Customer, StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO customers (name, password_hash, email, created_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(Customer {
            customer_id: result.last_insert_rowid(),
            name: account.name.clone(),
            password_hash: account.password_hash.clone(),
            email: account.email.clone(),
            created_date: now,
        })
    }

    async fn update_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE customers SET name = ?, email = ? WHERE customer_id = ?")
                .bind(&customer.name)
                .bind(&customer.email)
                .bind(customer.customer_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", customer.customer_id));
        }
        Ok(())
    }

    async fn delete_customer(&self, customer_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = ?")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", customer_id));
        }
        Ok(())
    }

    async fn get_staff(&self, staff_id: i64) -> Result<Option<Staff>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!("{SELECT_STAFF} WHERE staff_id = ?"))
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Staff::from))
    }

    async fn get_staff_by_email(&self, email: &str) -> Result<Option<Staff>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!("{SELECT_STAFF} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Staff::from))
    }

    async fn list_staff(&self) -> Result<Vec<Staff>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!("{SELECT_STAFF} ORDER BY staff_id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Staff::from).collect())
    }

    async fn create_staff(&self, account: &NewAccount) -> Result<Staff, StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO staffs (name, password_hash, email, created_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.email)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(Staff {
            staff_id: result.last_insert_rowid(),
            name: account.name.clone(),
            password_hash: account.password_hash.clone(),
            email: account.email.clone(),
            created_date: now,
        })
    }

    async fn update_staff(&self, staff: &Staff) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE staffs SET name = ?, email = ? WHERE staff_id = ?")
            .bind(&staff.name)
            .bind(&staff.email)
            .bind(staff.staff_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("staff", staff.staff_id));
        }
        Ok(())
    }

    async fn delete_staff(&self, staff_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM staffs WHERE staff_id = ?")
            .bind(staff_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("staff", staff_id));
        }
        Ok(())
    }
}
