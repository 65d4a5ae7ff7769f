pub mod auth;

pub use auth::{customer_auth_middleware, staff_auth_middleware, Claims};
