use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use uuid::Uuid;

use teamchat_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a fresh connection may take to send its first Subscribe.
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single WebSocket connection: wait for a Subscribe, confirm with
/// Ready, then forward inserts for the subscribed channel until either side
/// goes away.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before waiting so no insert between Ready and the loop is lost
    let broadcast_rx = dispatcher.subscribe();

    let channel_id = match wait_for_subscribe(&mut receiver).await {
        Some(id) => id,
        None => {
            warn!("WebSocket client never subscribed, closing");
            return;
        }
    };

    info!("Gateway connection subscribed to channel {}", channel_id);

    if !send_event(&mut sender, &GatewayEvent::Ready { channel_id }).await {
        return;
    }

    run_connection_loop(sender, receiver, broadcast_rx, channel_id).await;
}

async fn run_connection_loop<S, R>(
    mut sender: S,
    mut receiver: R,
    mut broadcast_rx: broadcast::Receiver<GatewayEvent>,
    channel_id: Uuid,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
{
    let (subscription_tx, mut subscription_rx) = watch::channel(channel_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward matching inserts -> client, confirm resubscribes, heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Broadcast receiver lagged by {} messages", n);
                            continue;
                        }
                        Err(_) => break,
                    };

                    if !is_for_subscription(&event, *subscription_rx.borrow()) {
                        continue;
                    }

                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                changed = subscription_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let channel_id = *subscription_rx.borrow_and_update();
                    if !send_event(&mut sender, &GatewayEvent::Ready { channel_id }).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(GatewayCommand::Subscribe { channel_id }) => {
                        info!("Gateway connection switched to channel {}", channel_id);
                        let _ = subscription_tx.send(channel_id);
                    }
                    Err(e) => {
                        warn!("Bad gateway command: {} -- raw: {}", e, text.chars().take(200).collect::<String>());
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("Gateway connection for channel {} closed", channel_id);
}

/// Channel-scoped events go only to that channel's subscribers; the rest
/// go to everyone.
fn is_for_subscription(event: &GatewayEvent, subscribed: Uuid) -> bool {
    event.channel_id().is_none_or(|id| id == subscribed)
}

async fn send_event<S>(sender: &mut S, event: &GatewayEvent) -> bool
where
    S: Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize gateway event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}

async fn wait_for_subscribe<R>(receiver: &mut R) -> Option<Uuid>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let wait = tokio::time::timeout(SUBSCRIBE_TIMEOUT, async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(GatewayCommand::Subscribe { channel_id }) =
                        serde_json::from_str::<GatewayCommand>(&text)
                    {
                        return Some(channel_id);
                    }
                }
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    });

    wait.await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use chrono::Utc;
    use tokio::sync::mpsc;
    use teamchat_types::models::{Channel, Message as ChatMessage};

    type Outgoing = mpsc::UnboundedReceiver<Message>;
    type Incoming = mpsc::UnboundedSender<Result<Message, axum::Error>>;

    /// Runs the connection loop over in-memory frames instead of a socket.
    fn spawn_loop(dispatcher: &Dispatcher, channel_id: Uuid) -> (Outgoing, Incoming, tokio::task::JoinHandle<()>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let sender = Box::pin(futures_util::sink::unfold(
            out_tx,
            |tx: mpsc::UnboundedSender<Message>, msg: Message| async move {
                tx.send(msg).map_err(|_| ())?;
                Ok::<_, ()>(tx)
            },
        ));
        let receiver = Box::pin(futures_util::stream::unfold(
            in_rx,
            |mut rx: mpsc::UnboundedReceiver<Result<Message, axum::Error>>| async move {
                rx.recv().await.map(|msg| (msg, rx))
            },
        ));

        let handle = tokio::spawn(run_connection_loop(sender, receiver, dispatcher.subscribe(), channel_id));
        (out_rx, in_tx, handle)
    }

    fn decode(msg: Message) -> Option<GatewayEvent> {
        match msg {
            Message::Text(text) => serde_json::from_str(&text).ok(),
            _ => None,
        }
    }

    async fn next_event(out: &mut Outgoing) -> GatewayEvent {
        loop {
            let msg = out.recv().await.unwrap();
            if let Some(event) = decode(msg) {
                return event;
            }
        }
    }

    fn message_in(channel_id: Uuid) -> GatewayEvent {
        GatewayEvent::MessageCreate(ChatMessage {
            id: Uuid::new_v4(),
            channel_id,
            user_name: "ana".into(),
            content: "hi".into(),
            is_ai: false,
            created_at: Utc::now(),
        })
    }

    #[test]
    fn messages_only_reach_their_channel() {
        let general = Uuid::new_v4();
        let random = Uuid::new_v4();
        assert!(is_for_subscription(&message_in(general), general));
        assert!(!is_for_subscription(&message_in(random), general));
    }

    #[test]
    fn channel_creates_reach_everyone() {
        let event = GatewayEvent::ChannelCreate(Channel {
            id: Uuid::new_v4(),
            name: "new".into(),
            description: None,
            created_at: Utc::now(),
        });
        assert!(is_for_subscription(&event, Uuid::new_v4()));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_is_dropped_after_two_missed_pongs() {
        let dispatcher = Dispatcher::new();
        let (mut out, _incoming, handle) = spawn_loop(&dispatcher, Uuid::new_v4());

        tokio::time::timeout(Duration::from_secs(120), handle)
            .await
            .expect("connection should close on its own")
            .unwrap();

        let mut pings = 0;
        while let Ok(msg) = out.try_recv() {
            if matches!(msg, Message::Ping(_)) {
                pings += 1;
            }
        }
        assert_eq!(pings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn answered_pings_keep_the_connection_open() {
        let dispatcher = Dispatcher::new();
        let (mut out, incoming, handle) = spawn_loop(&dispatcher, Uuid::new_v4());

        let pings = Arc::new(AtomicUsize::new(0));
        let seen = pings.clone();
        tokio::spawn(async move {
            while let Some(msg) = out.recv().await {
                if matches!(msg, Message::Ping(_)) {
                    seen.fetch_add(1, Ordering::SeqCst);
                    let _ = incoming.send(Ok(Message::Pong(Bytes::new())));
                }
            }
        });

        let result = tokio::time::timeout(Duration::from_secs(120), handle).await;
        assert!(result.is_err(), "connection closed despite pongs");
        assert!(pings.load(Ordering::SeqCst) > 2);
    }

    #[tokio::test]
    async fn resubscribe_is_confirmed_and_moves_the_feed() {
        let dispatcher = Dispatcher::new();
        let general = Uuid::new_v4();
        let random = Uuid::new_v4();
        let (mut out, incoming, _handle) = spawn_loop(&dispatcher, general);

        let command = format!(r#"{{"type":"Subscribe","data":{{"channel_id":"{random}"}}}}"#);
        incoming.send(Ok(Message::Text(command.into()))).unwrap();

        match next_event(&mut out).await {
            GatewayEvent::Ready { channel_id } => assert_eq!(channel_id, random),
            other => panic!("expected Ready, got {other:?}"),
        }

        dispatcher.broadcast(message_in(general));
        dispatcher.broadcast(message_in(random));

        match next_event(&mut out).await {
            GatewayEvent::MessageCreate(message) => assert_eq!(message.channel_id, random),
            other => panic!("expected MessageCreate, got {other:?}"),
        }
    }
}
