//! Order lifecycle events.
//!
//! The engine does not notify merchants itself; the webhook notifier is an external collaborator. It subscribes to
//! these events by attaching an mpsc channel to [`EventProducers`]. Publishing never blocks settlement: if a
//! subscriber's buffer is full the event is dropped with a warning, and the subscriber is expected to reconcile
//! from the order store.

use log::*;
use tokio::sync::mpsc;

use crate::db_types::Order;

#[derive(Debug, Clone)]
pub enum OrderEvent {
    /// A matching on-chain transfer was confirmed and the order settled.
    Paid(Order),
    /// The order expired unpaid and its reservation was released.
    Expired(Order),
}

/// Fan-out of order events to every attached subscriber.
#[derive(Debug, Clone, Default)]
pub struct EventProducers {
    senders: Vec<mpsc::Sender<OrderEvent>>,
}

impl EventProducers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new subscriber and returns the receiving end of its channel.
    pub fn subscribe(&mut self, buffer: usize) -> mpsc::Receiver<OrderEvent> {
        let (tx, rx) = mpsc::channel(buffer);
        self.senders.push(tx);
        rx
    }

    /// Publishes `event` to every subscriber without blocking.
    pub fn publish(&self, event: &OrderEvent) {
        for sender in &self.senders {
            if let Err(e) = sender.try_send(event.clone()) {
                warn!("📬️ Dropping order event for a slow subscriber: {e}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use upg_common::Amount;

    use super::*;
    use crate::db_types::{OrderStatusType, TradeId};

    fn dummy_order() -> Order {
        Order {
            id: 1,
            trade_id: TradeId("2024010112345".to_string()),
            order_id: "m-1".to_string(),
            amount: Amount::from_whole(10),
            actual_amount: Amount::from_raw(13_931),
            token: "TXYZ".to_string(),
            status: OrderStatusType::Paid,
            notify_url: "https://merchant.example/notify".to_string(),
            redirect_url: None,
            block_transaction_id: Some("0xabc".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            expires_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn events_reach_every_subscriber() {
        let mut producers = EventProducers::new();
        let mut rx1 = producers.subscribe(4);
        let mut rx2 = producers.subscribe(4);
        producers.publish(&OrderEvent::Paid(dummy_order()));
        assert!(matches!(rx1.recv().await, Some(OrderEvent::Paid(_))));
        assert!(matches!(rx2.recv().await, Some(OrderEvent::Paid(_))));
    }

    #[tokio::test]
    async fn full_buffer_does_not_block() {
        let mut producers = EventProducers::new();
        let _rx = producers.subscribe(1);
        producers.publish(&OrderEvent::Expired(dummy_order()));
        // Second publish hits a full buffer and is dropped instead of blocking.
        producers.publish(&OrderEvent::Expired(dummy_order()));
    }
}
