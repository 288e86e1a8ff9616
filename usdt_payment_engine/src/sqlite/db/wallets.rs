use sqlx::SqliteConnection;

use crate::db_types::WalletAddress;

pub async fn upsert_wallet(
    token: &str,
    enabled: bool,
    conn: &mut SqliteConnection,
) -> Result<WalletAddress, sqlx::Error> {
    sqlx::query_as::<_, WalletAddress>(
        r#"
            INSERT INTO wallet_addresses (token, enabled) VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET enabled = excluded.enabled
            RETURNING id, token, enabled;
        "#,
    )
    .bind(token)
    .bind(enabled)
    .fetch_one(conn)
    .await
}

pub async fn fetch_enabled_wallets(conn: &mut SqliteConnection) -> Result<Vec<WalletAddress>, sqlx::Error> {
    sqlx::query_as::<_, WalletAddress>(
        "SELECT id, token, enabled FROM wallet_addresses WHERE enabled = TRUE ORDER BY id ASC",
    )
    .fetch_all(conn)
    .await
}
