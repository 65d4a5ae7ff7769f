use std::net::SocketAddr;

use crimson_api::{
    app,
    state::{AppState, AuthConfig},
    worker,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "crimson_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = crimson_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Crimson Bookstore API on port {}", config.server.port);

    let db = crimson_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let app_state = AppState::new(
        &db,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        config.business_rules.clone(),
    );

    tokio::spawn(worker::start_reservation_sweeper(
        app_state.inventory.clone(),
        config.business_rules.sweep_interval_seconds,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
