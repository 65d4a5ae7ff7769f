use std::sync::Arc;

use chrono::Duration;
use crimson_core::repository::{
    AccountRepository, CatalogRepository, InventoryRepository, OrderRepository,
};
use crimson_order::{CartManager, CheckoutWorkflow};
use crimson_store::app_config::BusinessRules;
use crimson_store::{
    DbClient, SqliteAccountRepository, SqliteCatalogRepository, SqliteInventoryRepository,
    SqliteOrderRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub cart: Arc<CartManager>,
    pub checkout: Arc<CheckoutWorkflow>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

impl AppState {
    pub fn new(db: &DbClient, auth: AuthConfig, business_rules: BusinessRules) -> Self {
        let inventory: Arc<dyn InventoryRepository> =
            Arc::new(SqliteInventoryRepository::new(db.pool.clone()));
        let catalog: Arc<dyn CatalogRepository> =
            Arc::new(SqliteCatalogRepository::new(db.pool.clone()));
        let accounts: Arc<dyn AccountRepository> =
            Arc::new(SqliteAccountRepository::new(db.pool.clone()));
        let orders: Arc<dyn OrderRepository> =
            Arc::new(SqliteOrderRepository::new(db.pool.clone()));

        let ttl = Duration::seconds(business_rules.reservation_ttl_seconds as i64);
        let cart = Arc::new(CartManager::new(inventory.clone(), ttl));
        let checkout = Arc::new(CheckoutWorkflow::new(
            inventory.clone(),
            accounts.clone(),
            orders.clone(),
            ttl,
        ));

        Self {
            inventory,
            catalog,
            accounts,
            orders,
            cart,
            checkout,
            auth,
            business_rules,
        }
    }
}
