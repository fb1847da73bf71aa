//! Duplex adapter for axum WebSockets.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tracing::debug;

use portico_protocols::{Duplex, Inbound, TransportError};

/// An upgraded axum WebSocket.
///
/// The socket is split so a pending receive never holds up a send. Ping and
/// pong frames are answered by axum and skipped here; a close frame or the end
/// of the stream reads as [`Inbound::Disconnected`].
pub struct AxumDuplex {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl AxumDuplex {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        self.sink.lock().await.send(message).await.map_err(|e| {
            // A failed write means the peer is gone; report it as a hang-up.
            debug!("WebSocket send failed: {}", e);
            TransportError::Disconnected
        })
    }
}

#[async_trait]
impl Duplex for AxumDuplex {
    async fn send_text(&self, payload: String) -> Result<(), TransportError> {
        self.send(Message::Text(payload.into())).await
    }

    async fn send_bytes(&self, payload: Bytes) -> Result<(), TransportError> {
        self.send(Message::Binary(payload)).await
    }

    async fn receive(&self) -> Result<Inbound, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Inbound::Text(text.to_string())),
                Some(Ok(Message::Binary(bytes))) => return Ok(Inbound::Binary(bytes)),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket close frame received");
                    return Ok(Inbound::Disconnected);
                }
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
                None => return Ok(Inbound::Disconnected),
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}
