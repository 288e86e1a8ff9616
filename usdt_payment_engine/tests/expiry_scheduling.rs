//! The scheduling path end to end: an order created with a short deadline must transition to `Expired` and free
//! its pair without anyone calling the expiry API by hand, whether the job comes from the in-process scheduler or
//! from the sweep backstop.

mod support;

use chrono::Duration;
use support::{new_api, prepare_test_env, random_db_path, seed_wallets};
use usdt_payment_engine::{
    config::PaymentGatewayConfig,
    db_types::{OrderStatusType, TradeId},
    scheduler::{start_expiry_sweep, TokioExpiryScheduler},
    OrderFlowApi,
    OrderRequest,
    PaymentGatewayDatabase,
};

const NOTIFY_URL: &str = "https://merchant.example/notify";

#[tokio::test]
async fn scheduled_job_expires_the_order() {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    let config = PaymentGatewayConfig { order_expiry: Duration::milliseconds(250), ..Default::default() };
    let api = OrderFlowApi::new(db.clone(), config, TokioExpiryScheduler::new(db.clone()));
    seed_wallets(&db, &["TWALLETAAA"]).await;

    let summary = api
        .create_order(OrderRequest::new("order-job", "10.00".parse().unwrap(), NOTIFY_URL))
        .await
        .expect("Error creating order");
    let trade_id = TradeId::from(summary.trade_id.clone());
    assert!(db.reservation_active(&summary.token, summary.actual_amount).await.unwrap());

    // No manual expiry call: the spawned job alone must flip the order once the deadline passes.
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    let order = api.order_by_trade_id(&trade_id).await.expect("Order not stored");
    assert_eq!(order.status, OrderStatusType::Expired);
    assert!(!db.reservation_active(&summary.token, summary.actual_amount).await.unwrap());
}

#[tokio::test]
async fn sweep_expires_orders_with_no_scheduled_job() {
    // A null scheduler stands in for a lost job; the sweep is the only thing that can release the pair.
    let config = PaymentGatewayConfig { order_expiry: Duration::seconds(0), ..Default::default() };
    let (db, api) = new_api(config).await;
    seed_wallets(&db, &["TWALLETAAA"]).await;

    let summary = api
        .create_order(OrderRequest::new("order-lostjob", "10.00".parse().unwrap(), NOTIFY_URL))
        .await
        .expect("Error creating order");
    let trade_id = TradeId::from(summary.trade_id.clone());

    let sweep = start_expiry_sweep(db.clone(), Duration::milliseconds(200));
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    sweep.abort();

    let order = api.order_by_trade_id(&trade_id).await.expect("Order not stored");
    assert_eq!(order.status, OrderStatusType::Expired);
    assert!(!db.reservation_active(&summary.token, summary.actual_amount).await.unwrap());
}
