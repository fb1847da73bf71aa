//! Duplex wrappers and in-memory duplex channels.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use portico_protocols::{Duplex, Inbound, TransportError};

/// Duplex whose close runs at most once.
///
/// The worker (through its transport) and the supervisor (through its
/// teardown guard) may both try to close the same connection; only the first
/// close reaches the underlying channel. Once closed, sends fail with
/// [`TransportError::Disconnected`] and receives report
/// [`Inbound::Disconnected`].
pub struct GuardedDuplex<D> {
    inner: D,
    closed: AtomicBool,
}

impl<D: Duplex> GuardedDuplex<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<D: Duplex> Duplex for GuardedDuplex<D> {
    async fn send_text(&self, payload: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Disconnected);
        }
        self.inner.send_text(payload).await
    }

    async fn send_bytes(&self, payload: Bytes) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Disconnected);
        }
        self.inner.send_bytes(payload).await
    }

    async fn receive(&self) -> Result<Inbound, TransportError> {
        if self.is_closed() {
            return Ok(Inbound::Disconnected);
        }
        self.inner.receive().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Duplex already closed");
            return Ok(());
        }
        self.inner.close().await
    }
}

/// A frame written by the local side of a [`MemoryDuplex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Binary(Bytes),
}

impl OutboundFrame {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

/// Shared view of a [`MemoryDuplex`]'s close activity.
#[derive(Debug, Default)]
pub struct DuplexProbe {
    closes: AtomicUsize,
    fail_close: AtomicBool,
    closed: CancellationToken,
}

impl DuplexProbe {
    /// How many times `close` reached the channel.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Wait until the channel is closed.
    pub async fn wait_closed(&self) {
        self.closed.cancelled().await
    }

    /// Make every subsequent close report an error after closing.
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }
}

/// Channel-backed duplex, paired with a [`MemoryPeer`] playing the remote.
///
/// Used to drive the bridge without a network, and by the bridge's own tests.
pub struct MemoryDuplex {
    inbound: Mutex<mpsc::UnboundedReceiver<Inbound>>,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    probe: Arc<DuplexProbe>,
}

/// Remote end of a [`MemoryDuplex`].
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    probe: Arc<DuplexProbe>,
}

impl MemoryDuplex {
    pub fn pair() -> (MemoryDuplex, MemoryPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let probe = Arc::new(DuplexProbe::default());

        let duplex = MemoryDuplex {
            inbound: Mutex::new(in_rx),
            outbound: out_tx,
            probe: Arc::clone(&probe),
        };
        let peer = MemoryPeer {
            inbound: Some(in_tx),
            outbound: out_rx,
            probe,
        };
        (duplex, peer)
    }

    pub fn probe(&self) -> Arc<DuplexProbe> {
        Arc::clone(&self.probe)
    }

    fn emit(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        if self.probe.is_closed() {
            return Err(TransportError::Disconnected);
        }
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Disconnected)
    }
}

#[async_trait]
impl Duplex for MemoryDuplex {
    async fn send_text(&self, payload: String) -> Result<(), TransportError> {
        self.emit(OutboundFrame::Text(payload))
    }

    async fn send_bytes(&self, payload: Bytes) -> Result<(), TransportError> {
        self.emit(OutboundFrame::Binary(payload))
    }

    async fn receive(&self) -> Result<Inbound, TransportError> {
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            _ = self.probe.closed.cancelled() => Ok(Inbound::Disconnected),
            message = inbound.recv() => Ok(message.unwrap_or(Inbound::Disconnected)),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.probe.closed.cancel();
        if self.probe.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::Close("memory duplex refused close".to_string()));
        }
        Ok(())
    }
}

impl MemoryPeer {
    /// Deliver a text frame to the local side. Returns false once it is gone.
    pub fn send_text(&self, payload: impl Into<String>) -> bool {
        self.push(Inbound::Text(payload.into()))
    }

    pub fn send_bytes(&self, payload: impl Into<Bytes>) -> bool {
        self.push(Inbound::Binary(payload.into()))
    }

    /// Hang up. The local side's next receive reports a disconnect.
    pub fn disconnect(&mut self) {
        self.inbound.take();
    }

    /// Next frame written by the local side, or `None` once it is gone.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.outbound.recv().await
    }

    pub fn probe(&self) -> Arc<DuplexProbe> {
        Arc::clone(&self.probe)
    }

    fn push(&self, message: Inbound) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(message).is_ok())
    }
}
