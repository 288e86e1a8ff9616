use serde::{Deserialize, Serialize};
use upg_common::Amount;

use crate::db_types::Order;

//--------------------------------------     OrderRequest    ---------------------------------------------------------
/// A merchant request to create a new payment order. Field presence and the merchant signature have already been
/// checked by the network boundary; the engine applies the business rules (thresholds, duplicates, allocation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// The merchant's own order identifier. Must be unique across all orders.
    pub order_id: String,
    /// The fiat amount to collect.
    pub amount: Amount,
    /// Where the webhook notifier should report status changes.
    pub notify_url: String,
    /// Where the checkout page should send the payer afterwards.
    pub redirect_url: Option<String>,
    /// A caller-supplied exchange-rate override. Ignored unless positive.
    pub rate: Option<Amount>,
    /// A wallet address to pin the order to. Unknown addresses fall back to random selection.
    pub preferred_token: Option<String>,
}

impl OrderRequest {
    pub fn new<S: Into<String>>(order_id: S, amount: Amount, notify_url: S) -> Self {
        Self {
            order_id: order_id.into(),
            amount,
            notify_url: notify_url.into(),
            redirect_url: None,
            rate: None,
            preferred_token: None,
        }
    }

    pub fn with_redirect_url<S: Into<String>>(mut self, url: S) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn with_rate(mut self, rate: Amount) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_preferred_token<S: Into<String>>(mut self, token: S) -> Self {
        self.preferred_token = Some(token.into());
        self
    }
}

//--------------------------------------   CheckoutSummary   ---------------------------------------------------------
/// Everything the checkout page needs to collect the payment. Returned to the network boundary after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub trade_id: String,
    pub order_id: String,
    /// The fiat amount requested by the merchant.
    pub amount: Amount,
    /// The exact USDT amount the payer must transfer.
    pub actual_amount: Amount,
    /// The wallet address the payer must transfer to.
    pub token: String,
    /// Absolute expiration timestamp, in epoch seconds.
    pub expiration_time: i64,
    /// The hosted checkout-counter page for this order.
    pub payment_url: String,
}

impl CheckoutSummary {
    pub fn new(order: &Order, app_base_uri: &str) -> Self {
        Self {
            trade_id: order.trade_id.as_str().to_string(),
            order_id: order.order_id.clone(),
            amount: order.amount,
            actual_amount: order.actual_amount,
            token: order.token.clone(),
            expiration_time: order.expires_at.timestamp(),
            payment_url: format!("{app_base_uri}/pay/checkout-counter/{}", order.trade_id.as_str()),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use upg_common::Amount;

    use super::*;
    use crate::db_types::{OrderStatusType, TradeId};

    #[test]
    fn checkout_summary_for_the_network_boundary() {
        let expires_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let order = Order {
            id: 7,
            trade_id: TradeId("20240601171751234001".to_string()),
            order_id: "m-42".to_string(),
            amount: Amount::from_whole(10),
            actual_amount: Amount::from_raw(13_931),
            token: "TXYZ".to_string(),
            status: OrderStatusType::WaitPay,
            notify_url: "https://merchant.example/notify".to_string(),
            redirect_url: None,
            block_transaction_id: None,
            created_at: expires_at,
            updated_at: expires_at,
            expires_at,
        };
        let summary = CheckoutSummary::new(&order, "https://pay.example.com");
        assert_eq!(summary.payment_url, "https://pay.example.com/pay/checkout-counter/20240601171751234001");
        assert_eq!(summary.expiration_time, expires_at.timestamp());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["trade_id"], "20240601171751234001");
        assert_eq!(json["order_id"], "m-42");
        assert_eq!(json["token"], "TXYZ");
    }
}
