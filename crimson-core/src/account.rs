use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shopper account. Customers and staff are distinct identity spaces;
/// neither can authenticate as the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    /// Argon2 hash, never serialized out.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub staff_id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub created_date: DateTime<Utc>,
}

/// Registration payload shared by both identity spaces. The password
/// arrives plain and is hashed before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub password_hash: String,
    pub email: String,
}
