//! Shared helpers for the integration suites: a throwaway SQLite database per test, migrations applied, and an
//! `OrderFlowApi` wired up with a null scheduler so tests drive expiry explicitly.

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use usdt_payment_engine::{
    config::PaymentGatewayConfig,
    scheduler::NullScheduler,
    OrderFlowApi,
    SqliteDatabase,
    WalletManagement,
};

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}.db", rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn new_api(config: PaymentGatewayConfig) -> (SqliteDatabase, OrderFlowApi<SqliteDatabase, NullScheduler>) {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let api = OrderFlowApi::new(db.clone(), config, NullScheduler);
    (db, api)
}

pub async fn seed_wallets(db: &SqliteDatabase, tokens: &[&str]) {
    for token in tokens {
        db.upsert_wallet(token, true).await.expect("Error seeding wallet");
    }
}
