//! Message Handler for server-side message processing
//!
//! The MessageHandler subscribes to the client channel and answers the
//! on-demand snapshot protocol: `refresh:orders` and `refresh:items`
//! requests each get a full current-state reply addressed only to the
//! requesting client (`target` = client id, `correlation_id` = request id).
//!
//! Snapshot replies are best-effort like the rest of the bus: a store
//! failure is logged and the request is dropped, never retried.

use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{item, order};
use crate::message::{BusMessage, EventType, MessageBus};

/// Server-side snapshot request handler
///
/// Runs in the background and processes all messages published to the
/// client channel. 只处理快照请求，其余消息类型仅记录日志。
pub struct MessageHandler {
    receiver: broadcast::Receiver<BusMessage>,
    broadcast_tx: broadcast::Sender<BusMessage>,
    pool: SqlitePool,
    shutdown_token: CancellationToken,
}

impl MessageHandler {
    /// Create a handler wired to the given bus
    pub fn new(bus: &MessageBus, pool: SqlitePool) -> Self {
        Self {
            receiver: bus.subscribe_to_clients(),
            broadcast_tx: bus.sender().clone(),
            pool,
            shutdown_token: bus.shutdown_token().clone(),
        }
    }

    /// Start processing messages
    ///
    /// This is a long-running task that should be spawned in the background.
    pub async fn run(mut self) {
        tracing::info!("Message handler started");

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Message handler shutting down");
                    break;
                }

                msg_result = self.receiver.recv() => {
                    match msg_result {
                        Ok(msg) => self.handle_message(msg).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Message handler lagged, skipped {} messages", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Message handler stopped");
    }

    /// Handle a single client message
    async fn handle_message(&self, msg: BusMessage) {
        if !msg.event_type.is_refresh_request() {
            tracing::debug!(event_type = %msg.event_type, "Ignoring non-request client message");
            return;
        }

        let Some(client_id) = msg.source.clone() else {
            tracing::warn!(
                event_type = %msg.event_type,
                "Refresh request without source client id, dropping"
            );
            return;
        };

        let reply = match msg.event_type {
            EventType::RefreshOrders => match order::list_active(&self.pool, None).await {
                Ok(orders) => BusMessage::event(EventType::OrdersRefresh, &orders),
                Err(e) => {
                    tracing::error!(client_id = %client_id, "Failed to load orders snapshot: {}", e);
                    return;
                }
            },
            EventType::RefreshItems => match item::list(&self.pool).await {
                Ok(items) => BusMessage::event(EventType::ItemsRefresh, &items),
                Err(e) => {
                    tracing::error!(client_id = %client_id, "Failed to load items snapshot: {}", e);
                    return;
                }
            },
            _ => unreachable!("is_refresh_request() covers exactly these"),
        };

        let reply = reply
            .with_target(&client_id)
            .with_correlation_id(msg.request_id);

        tracing::debug!(
            client_id = %client_id,
            event_type = %reply.event_type,
            "Answering snapshot request"
        );

        if self.broadcast_tx.send(reply).is_err() {
            tracing::debug!(client_id = %client_id, "No subscribers for snapshot reply");
        }
    }
}
