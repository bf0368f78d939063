use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is down.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

/// Events emitted by the checkout and order pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Checkout events
    CheckoutCompleted {
        order_id: Uuid,
        customer_id: Uuid,
    },
    CheckoutFailed {
        customer_id: Uuid,
        reason: String,
    },

    // Order events
    OrderCreated(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderItemStatusChanged {
        order_id: Uuid,
        item_id: Uuid,
        new_status: String,
    },
    PaymentCaptured {
        order_id: Uuid,
        provider_payment_id: String,
    },

    // COD verification events
    CodVerificationIssued {
        pending_order_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    CodOrderVerified {
        pending_order_id: Uuid,
        order_id: Uuid,
    },
    CodPendingPurged {
        purged: u64,
    },

    // Stock events
    StockDecremented {
        product_id: Uuid,
        size: String,
        quantity: i32,
    },
    StockRestored {
        product_id: Uuid,
        size: String,
        quantity: i32,
    },
}

/// Drains the event channel. Today this logs and counts; queue or webhook
/// fan-out would hang off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CheckoutCompleted { order_id, .. } => {
                metrics::counter!("storefront_checkout_completed_total", 1);
                info!(order_id = %order_id, "Checkout completed");
            }
            Event::CheckoutFailed { reason, .. } => {
                metrics::counter!("storefront_checkout_failed_total", 1);
                info!(reason = %reason, "Checkout failed");
            }
            Event::CodOrderVerified {
                pending_order_id,
                order_id,
            } => {
                info!(
                    pending_order_id = %pending_order_id,
                    order_id = %order_id,
                    "COD order verified and promoted"
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; processing loop exiting");
}
