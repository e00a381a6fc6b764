//! Overlay WebSocket client.

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::OverlayMessage;

/// A connected overlay display.
///
/// Mostly useful for headless overlays and for checking a running server
/// from the command line.
pub struct OverlayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl OverlayClient {
    /// Connect to the overlay stream at `ws_url` (e.g. `ws://localhost:8765/ws`).
    pub async fn connect(ws_url: &Url) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(ws_url.as_str()).await?;
        Ok(Self { stream })
    }

    /// Wait for the next broadcast message.
    ///
    /// Returns `Ok(None)` once the server closes the connection. Frames that
    /// are not JSON text are skipped.
    pub async fn next_message(&mut self) -> Result<Option<OverlayMessage>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Close the connection politely.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
