use axum::{
    extract::{
        State,
        ws::{Message, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bakerank_core::hub::BroadcastHub;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// `GET /ws`: overlay event stream.
///
/// Upgrades the HTTP connection to a WebSocket and pushes one
/// [`OverlayMessage`](bakerank_sdk::objects::OverlayMessage) JSON frame per
/// bake. Nothing is replayed on connect.
pub async fn overlay_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_overlay_ws(socket, hub))
}

/// Drives a single overlay connection.
///
/// Forwards hub frames until the overlay disconnects, a write fails or stalls
/// past the hub's send timeout, or the hub drops this subscriber.
async fn handle_overlay_ws<S>(mut socket: S, hub: Arc<BroadcastHub>)
where
    S: Sink<Message> + Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut subscription = hub.subscribe().await;
    let id = subscription.id();
    let send_timeout = hub.send_timeout();
    tracing::info!(subscriber = %id, "Overlay connected");

    loop {
        tokio::select! {
            frame = subscription.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                let text = Message::Text(frame.to_string().into());
                if !send_within(&mut socket, text, send_timeout).await {
                    break;
                }
            }

            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Ping(payload))) => {
                        if !send_within(&mut socket, Message::Pong(payload), send_timeout).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unsubscribe(id).await;
    send_within(&mut socket, Message::Close(None), send_timeout).await;
    tracing::info!(subscriber = %id, "Overlay disconnected");
}

/// Write one message, giving up after `limit`.
async fn send_within<S>(socket: &mut S, msg: Message, limit: Duration) -> bool
where
    S: Sink<Message> + Unpin,
{
    match tokio::time::timeout(limit, socket.send(msg)).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) => false,
        Err(_) => {
            tracing::debug!(timeout = ?limit, "Overlay write timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// A peer that stays connected but never drains its receive window.
    struct StalledPeer;

    impl Sink<Message> for StalledPeer {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }
    }

    impl Stream for StalledPeer {
        type Item = Result<Message, axum::Error>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Pending
        }
    }

    async fn wait_for_subscribers(hub: &BroadcastHub, n: usize) {
        while hub.subscriber_count().await != n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_overlay_is_released() {
        let hub = Arc::new(BroadcastHub::new(Duration::from_millis(100), 4));
        let task = tokio::spawn(handle_overlay_ws(StalledPeer, hub.clone()));
        wait_for_subscribers(&hub, 1).await;

        let report = hub.publish_frame(Arc::from(r#"{"event":"bake"}"#)).await;
        assert_eq!(report.delivered, 1);

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("connection task stuck on a stalled overlay")
            .unwrap();
        assert_eq!(hub.subscriber_count().await, 0);
    }
}
