pub mod account_repo;
pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod inventory_repo;
pub mod order_repo;

pub use account_repo::SqliteAccountRepository;
pub use catalog_repo::SqliteCatalogRepository;
pub use database::DbClient;
pub use inventory_repo::SqliteInventoryRepository;
pub use order_repo::SqliteOrderRepository;
