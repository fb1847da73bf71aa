use super::*;

use serde_json::json;

use crate::duplex::{MemoryDuplex, OutboundFrame};
use crate::portal::Portal;
use crate::state_kernel::StateKernel;

/// Sends `count` numbered messages, then returns.
struct Counter {
    count: usize,
}

impl AppLoop for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn run(&self, transport: &mut dyn Transport, _context: &KernelContext) -> Result<(), KernelError> {
        for i in 0..self.count {
            transport.send_text(&i.to_string())?;
        }
        Ok(())
    }
}

/// Waits for one frame, then fails.
struct Faulty;

impl AppLoop for Faulty {
    fn name(&self) -> &str {
        "faulty"
    }

    fn run(&self, transport: &mut dyn Transport, _context: &KernelContext) -> Result<(), KernelError> {
        transport.receive()?;
        Err(KernelError::Fault("boom".to_string()))
    }
}

struct Panicky;

impl AppLoop for Panicky {
    fn name(&self) -> &str {
        "panicky"
    }

    fn run(&self, _transport: &mut dyn Transport, _context: &KernelContext) -> Result<(), KernelError> {
        panic!("kernel exploded");
    }
}

/// Reports the context's attach count, then waits for the remote.
struct AttachReporter;

impl AppLoop for AttachReporter {
    fn name(&self) -> &str {
        "attach"
    }

    fn run(&self, transport: &mut dyn Transport, context: &KernelContext) -> Result<(), KernelError> {
        transport.send_text(&context.attached().to_string())?;
        loop {
            if transport.receive()?.is_disconnected() {
                return Err(KernelError::Disconnected);
            }
        }
    }
}

fn context(connection_id: &str) -> Arc<KernelContext> {
    Arc::new(KernelContext::new("s1", connection_id))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_messages_arrive_in_order() {
    let (duplex, mut peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();

    let worker = spawn_worker(Arc::new(Counter { count: 50 }), context("c1"), handle, Arc::new(duplex));
    let exit = portal.run_until(worker).await.unwrap().unwrap();
    assert_eq!(exit, WorkerExit::Completed);

    for i in 0..50 {
        assert_eq!(peer.recv().await, Some(OutboundFrame::Text(i.to_string())));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_is_clean_exit() {
    let (duplex, mut peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();
    let observer = handle.clone();
    peer.disconnect();

    let worker = spawn_worker(Arc::new(StateKernel::new()), context("c1"), handle, Arc::new(duplex));
    let exit = portal.run_until(worker).await.unwrap().unwrap();

    assert_eq!(exit, WorkerExit::Disconnected);
    assert!(!observer.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_error_cancels_portal_before_returning() {
    let (duplex, peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();
    let observer = handle.clone();
    assert!(peer.send_text("trigger"));

    let worker = spawn_worker(Arc::new(Faulty), context("c1"), handle, Arc::new(duplex));
    let result = portal.run_until(worker).await.unwrap();

    assert!(matches!(result, Err(KernelError::Fault(_))));
    assert!(observer.is_cancelled());
    assert!(portal.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panic_cancels_portal_and_propagates() {
    let (duplex, _peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();
    let observer = handle.clone();

    let worker = spawn_worker(Arc::new(Panicky), context("c1"), handle, Arc::new(duplex));
    let join_error = portal.run_until(worker).await.unwrap_err();

    assert!(join_error.is_panic());
    assert!(observer.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attach_count_tracks_running_worker() {
    let (duplex, mut peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();
    let ctx = context("c1");

    let worker = spawn_worker(Arc::new(AttachReporter), Arc::clone(&ctx), handle, Arc::new(duplex));
    let report = portal
        .run_until(async {
            let frame = peer.recv().await;
            peer.disconnect();
            frame
        })
        .await;
    assert_eq!(report, Some(OutboundFrame::Text("1".to_string())));

    let exit = portal.run_until(worker).await.unwrap().unwrap();
    assert_eq!(exit, WorkerExit::Disconnected);
    assert_eq!(ctx.attached(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_state_kernel_over_portal() {
    let (duplex, mut peer) = MemoryDuplex::pair();
    let (mut portal, handle) = Portal::open();
    let ctx = context("c1");

    assert!(peer.send_text(json!({"type": "set", "key": "k", "value": "v"}).to_string()));
    assert!(peer.send_bytes(&b"raw"[..]));
    assert!(peer.send_text(json!({"type": "close"}).to_string()));

    let worker = spawn_worker(Arc::new(StateKernel::new()), Arc::clone(&ctx), handle, Arc::new(duplex));
    let exit = portal.run_until(worker).await.unwrap().unwrap();
    assert_eq!(exit, WorkerExit::Completed);

    let mut frames = Vec::new();
    while let Ok(frame) = peer_try_recv(&mut peer).await {
        frames.push(frame);
    }
    assert_eq!(frames.len(), 4);
    assert!(frames[0].as_text().unwrap().contains("ready"));
    assert_eq!(frames[2], OutboundFrame::Binary(bytes::Bytes::from_static(b"raw")));
    assert!(frames[3].as_text().unwrap().contains("closing"));
    assert_eq!(ctx.get("k"), Some(json!("v")));
}

#[test]
fn test_run_worker_on_stopped_portal_reports_relay_error() {
    let (duplex, _peer) = MemoryDuplex::pair();
    let (_portal, handle) = Portal::open();
    handle.stop(false);

    let ctx = KernelContext::new("s1", "c1");
    let mut transport = PortalTransport::new(handle.clone(), Arc::new(duplex));
    let result = run_worker(&Counter { count: 1 }, &mut transport, &ctx, &handle);

    assert!(matches!(
        result,
        Err(KernelError::Transport(TransportError::Relay(_)))
    ));
    assert!(handle.is_cancelled());
}

async fn peer_try_recv(peer: &mut crate::duplex::MemoryPeer) -> Result<OutboundFrame, ()> {
    match tokio::time::timeout(std::time::Duration::from_millis(50), peer.recv()).await {
        Ok(Some(frame)) => Ok(frame),
        _ => Err(()),
    }
}
