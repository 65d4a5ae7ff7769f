pub mod assignment;
pub mod cart;
pub mod error;
pub mod models;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use cart::CartManager;
pub use error::{CartError, CheckoutError};
pub use models::{CartEntry, CheckoutRequest, Receipt, SessionContext};
pub use workflow::CheckoutWorkflow;
