use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a physical copy.
///
/// `InStore` and `Sold` are stable; `Reserved` is transient and always
/// carries an owning session and an expiry on the copy row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CopyStatus {
    #[serde(rename = "In Store")]
    InStore,
    Reserved,
    Sold,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::InStore => "In Store",
            CopyStatus::Reserved => "Reserved",
            CopyStatus::Sold => "Sold",
        }
    }

    /// Legal transitions of the copy state machine. `Sold` is terminal
    /// except for the checkout compensation path (Sold -> Reserved), which
    /// only the workflow may take and only for copies it just transitioned.
    pub fn can_transition_to(self, next: CopyStatus) -> bool {
        matches!(
            (self, next),
            (CopyStatus::InStore, CopyStatus::Reserved)
                | (CopyStatus::Reserved, CopyStatus::InStore)
                | (CopyStatus::Reserved, CopyStatus::Sold)
                | (CopyStatus::Sold, CopyStatus::Reserved)
        )
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Store" => Ok(CopyStatus::InStore),
            "Reserved" => Ok(CopyStatus::Reserved),
            "Sold" => Ok(CopyStatus::Sold),
            other => Err(format!("unknown copy status: {other}")),
        }
    }
}

/// A single physical inventory unit of a book, independently sellable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCopy {
    pub copy_id: i64,
    pub isbn: String,
    pub edition: i32,
    pub year_printed: i32,
    pub price_cents: i64,
    pub condition: String,
    pub date_added: DateTime<Utc>,
    pub status: CopyStatus,
    /// Session id of the cart holding the reservation, when Reserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_until: Option<DateTime<Utc>>,
}

impl BookCopy {
    pub fn is_reserved_by(&self, session_id: &str) -> bool {
        self.status == CopyStatus::Reserved && self.reserved_by.as_deref() == Some(session_id)
    }

    pub fn reservation_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == CopyStatus::Reserved
            && self.reserved_until.map(|until| until < now).unwrap_or(false)
    }
}

/// Fields needed to stock a new copy. Created copies always start In Store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCopy {
    pub isbn: String,
    pub edition: i32,
    pub year_printed: i32,
    pub price_cents: i64,
    pub condition: String,
}
