//! Live notification channel.
//!
//! # Responsibility
//! - Keep one broadcast channel per connected user.
//! - Publish notification events from request handlers without blocking.
//! - Serve the WebSocket endpoint that forwards events to the browser.
//!
//! # Invariants
//! - Publishing to a user without subscribers reports `Ok(false)`.
//! - A channel is dropped once its last subscriber disconnects.

use crate::auth::CurrentUser;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use log::{debug, info, warn};
use slangspot_core::model::notification::NotificationEvent;
use slangspot_core::{PublishError, Publisher, UserId};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Per-user broadcast channels.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    channels: RwLock<HashMap<UserId, broadcast::Sender<NotificationEvent>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `user_id`'s channel, creating it on first use.
    pub fn subscribe(&self, user_id: UserId) -> broadcast::Receiver<NotificationEvent> {
        let mut channels = match self.channels.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drops the channel of `user_id` when nobody listens anymore.
    pub fn release(&self, user_id: UserId) {
        let mut channels = match self.channels.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if channels
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&user_id);
        }
    }

    pub fn subscriber_count(&self, user_id: UserId) -> usize {
        self.channels
            .read()
            .ok()
            .and_then(|channels| channels.get(&user_id).map(broadcast::Sender::receiver_count))
            .unwrap_or(0)
    }
}

impl Publisher for BroadcastHub {
    fn publish(&self, event: &NotificationEvent) -> Result<bool, PublishError> {
        let channels = self
            .channels
            .read()
            .map_err(|_| PublishError("live channel registry poisoned".to_string()))?;
        let Some(sender) = channels.get(&event.recipient) else {
            return Ok(false);
        };
        match sender.send(event.clone()) {
            Ok(_) => Ok(true),
            // Every receiver went away between lookup and send.
            Err(_) => Ok(false),
        }
    }
}

/// `GET /ws/notifications`: upgrades and streams the actor's events as JSON.
pub async fn notifications_socket(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ws: WebSocketUpgrade,
) -> Response {
    let receiver = state.hub.subscribe(user.id);
    ws.on_upgrade(move |socket| forward_events(socket, state, user.id, receiver))
}

async fn forward_events(
    mut socket: WebSocket,
    state: AppState,
    user_id: UserId,
    mut receiver: broadcast::Receiver<NotificationEvent>,
) {
    info!("event=ws_connect module=live status=ok user_id={user_id}");
    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!("event=ws_receive module=live status=error user_id={user_id} error={err}");
                    break;
                }
            },
            event = receiver.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!("event=ws_encode module=live status=error error={err}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("event=ws_lagged module=live status=error user_id={user_id} skipped={skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    drop(receiver);
    state.hub.release(user_id);
    info!("event=ws_disconnect module=live status=ok user_id={user_id}");
}

#[cfg(test)]
mod tests {
    use super::BroadcastHub;
    use slangspot_core::model::notification::{Notification, NotificationEvent, NotificationKind};
    use slangspot_core::Publisher;
    use uuid::Uuid;

    fn event_for(recipient: Uuid) -> NotificationEvent {
        NotificationEvent::from(&Notification::new(
            recipient,
            NotificationKind::PostLike,
            "ana liked your post 'Hola'",
        ))
    }

    #[test]
    fn publish_without_subscriber_reports_not_delivered() {
        let hub = BroadcastHub::new();
        assert!(!hub.publish(&event_for(Uuid::new_v4())).unwrap());
    }

    #[test]
    fn subscriber_receives_only_its_events() {
        let hub = BroadcastHub::new();
        let user = Uuid::new_v4();
        let mut receiver = hub.subscribe(user);

        assert!(hub.publish(&event_for(user)).unwrap());
        assert!(!hub.publish(&event_for(Uuid::new_v4())).unwrap());

        let received = receiver.try_recv().unwrap();
        assert_eq!(received.recipient, user);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn release_drops_idle_channels() {
        let hub = BroadcastHub::new();
        let user = Uuid::new_v4();
        let receiver = hub.subscribe(user);
        assert_eq!(hub.subscriber_count(user), 1);

        hub.release(user);
        assert_eq!(hub.subscriber_count(user), 1);

        drop(receiver);
        hub.release(user);
        assert_eq!(hub.subscriber_count(user), 0);
        assert!(!hub.publish(&event_for(user)).unwrap());
    }
}
