//! Connection manager lifecycle behavior
//!
//! Exercises the reconnection policy against real loopback sockets: bounded
//! retry after an unexpected close, manual close suppressing reconnection,
//! and outbound frames being dropped while the channel is not open. The
//! reconnect-delay tests run under real time because the handshake happens
//! over real sockets, so they wait out the real reconnect delays.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use workbench_client::session::connection::{MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY};
use workbench_client::{ConnectionHandle, ConnectionManager, ConnectionState};

async fn wait_state(handle: &ConnectionHandle, target: ConnectionState) {
    let mut rx = handle.status();
    loop {
        if *rx.borrow() == target {
            return;
        }
        tokio::time::timeout(Duration::from_secs(120), rx.changed())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {target:?}"))
            .expect("connection task gone");
    }
}

#[tokio::test]
async fn lost_connection_retries_are_bounded() {
    let accepts = Arc::new(AtomicUsize::new(0));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = accepts.clone();
    tokio::spawn(async move {
        // First connection completes the handshake and is dropped right
        // away; every later attempt is cut at the TCP level so the retry
        // loop keeps failing.
        let mut first = true;
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            if first {
                first = false;
                let ws = accept_async(stream).await.unwrap();
                drop(ws);
            }
        }
    });

    let (handle, _inbound) = ConnectionManager::connect(format!("ws://{addr}"));
    wait_state(&handle, ConnectionState::Open).await;

    // Drain transitions until the connection task gives up and drops its
    // status sender.
    let mut rx = handle.status();
    loop {
        let changed = tokio::time::timeout(Duration::from_secs(120), rx.changed())
            .await
            .expect("timed out waiting for the retry ceiling");
        if changed.is_err() {
            break;
        }
    }
    assert_eq!(*rx.borrow(), ConnectionState::Closed);

    // One successful open, then retries up to the ceiling.
    let total = accepts.load(Ordering::SeqCst);
    assert!(total >= 2, "the lost connection was never retried");
    assert_eq!(total, MAX_RECONNECT_ATTEMPTS as usize);
}

#[tokio::test]
async fn manual_close_never_reconnects() {
    let accepts = Arc::new(AtomicUsize::new(0));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = accepts.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if let Ok(mut ws) = accept_async(stream).await {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    let (handle, _inbound) = ConnectionManager::connect(format!("ws://{addr}"));
    wait_state(&handle, ConnectionState::Open).await;
    handle.close();
    wait_state(&handle, ConnectionState::Closed).await;

    // Well past several reconnect windows: still closed, no second accept.
    tokio::time::sleep(RECONNECT_DELAY * 5).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert_eq!(accepts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn frames_sent_before_open_are_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (gate_tx, gate_rx) = oneshot::channel::<()>();
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Hold the handshake so the client stays in Connecting.
        gate_rx.await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = seen_tx.send(text);
        }
    });

    let (handle, _inbound) = ConnectionManager::connect(format!("ws://{addr}"));
    assert_ne!(handle.state(), ConnectionState::Open);
    handle.send("early".into());

    gate_tx.send(()).unwrap();
    wait_state(&handle, ConnectionState::Open).await;
    handle.send("late".into());

    let first = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .expect("timed out waiting for the delivered frame")
        .expect("server reader gone");
    assert_eq!(first, "late");
    handle.close();
}
