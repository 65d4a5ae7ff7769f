pub mod account;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod order;
pub mod repository;

pub use error::StoreError;
pub use inventory::{BookCopy, CopyStatus};
