//! Collision-freedom under concurrent order creation: many orders at the same nominal price must all receive
//! distinct (token, amount) pairs, because that pair is the only signal the chain watcher can use to tell them
//! apart.

mod support;

use std::{collections::HashSet, sync::Arc};

use log::*;
use support::{new_api, seed_wallets};
use upg_common::Amount;
use usdt_payment_engine::{
    config::PaymentGatewayConfig,
    gateway_api::wallet_pool::{JITTER_MAX, MAX_ALLOCATION_ATTEMPTS},
    OrderRequest,
    PaymentGatewayDatabase,
};

const NUM_ORDERS: usize = 20;

#[tokio::test(flavor = "multi_thread")]
async fn burst_orders_never_share_a_pair() {
    let (db, api) = new_api(PaymentGatewayConfig::default()).await;
    seed_wallets(&db, &["TWALLETAAA"]).await;
    let api = Arc::new(api);

    info!("🚀️ Injecting {NUM_ORDERS} concurrent orders at the same nominal price");
    let mut handles = Vec::with_capacity(NUM_ORDERS);
    for i in 0..NUM_ORDERS {
        let api = Arc::clone(&api);
        handles.push(tokio::spawn(async move {
            let req = OrderRequest::new(
                format!("burst-order-{i}"),
                "10.00".parse().unwrap(),
                "https://merchant.example/notify".to_string(),
            );
            api.create_order(req).await
        }));
    }

    let mut pairs = HashSet::new();
    for handle in handles {
        let summary = handle.await.unwrap().expect("Error creating order under load");
        assert!(
            pairs.insert((summary.token.clone(), summary.actual_amount)),
            "two pending orders were assigned the same (token, amount) pair"
        );
        // Every pair is actively reserved while its order is pending.
        assert!(db.reservation_active(&summary.token, summary.actual_amount).await.unwrap());
    }
    assert_eq!(pairs.len(), NUM_ORDERS);

    // Drift stays bounded: jitter plus the probe budget.
    let desired = Amount::from_raw(13_889);
    let max_drift = Amount::from_raw(JITTER_MAX + MAX_ALLOCATION_ATTEMPTS as i64 - 1);
    for (_, amount) in &pairs {
        assert!(*amount > desired && *amount <= desired + max_drift);
    }
    info!("🚀️ burst test complete");
}
