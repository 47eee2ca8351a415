//! The native sync client against a live relay.

use inkdesk_core::collaboration::{CONNECT_ERROR_MESSAGE, RemoteUpdate, SyncClient};
use inkdesk_core::sync::{ConnectionState, NativeWebSocket};
use inkdesk_server::{app, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

type Client = SyncClient<NativeWebSocket>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const MAX_POLLS: usize = 250;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(Arc::new(AppState::new()))).await.unwrap();
    });
    format!("ws://{}/ws", addr)
}

fn client(url: &str, room: &str) -> Client {
    let mut client = SyncClient::new(NativeWebSocket::new(), room);
    client.subscribe();
    client.open(url).unwrap();
    client
}

/// Poll until the client is in a room with `peers` peers.
async fn wait_for_peers(client: &mut Client, peers: usize) {
    for _ in 0..MAX_POLLS {
        client.poll();
        if client.current_room().is_some() && client.peer_count() == peers {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("expected {} peers, saw {}", peers, client.peer_count());
}

async fn wait_for_updates(client: &mut Client) -> Vec<RemoteUpdate> {
    for _ in 0..MAX_POLLS {
        let updates = client.poll();
        if !updates.is_empty() {
            return updates;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("no remote update arrived");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_change_reaches_other_client() {
    let url = start_server().await;
    let mut alice = client(&url, "r");
    wait_for_peers(&mut alice, 1).await;
    let mut bob = client(&url, "r");
    wait_for_peers(&mut bob, 2).await;
    wait_for_peers(&mut alice, 2).await;
    assert_eq!(bob.current_room(), Some("r"));
    assert_eq!(bob.state(), ConnectionState::Connected);

    alice.send_local_change("hello").unwrap();

    let updates = wait_for_updates(&mut bob).await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].content, "hello");
    assert!(updates[0].from.is_some());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(alice.poll().is_empty(), "change echoed back to its sender");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_joiner_receives_stored_document() {
    let url = start_server().await;
    let mut alice = client(&url, "r");
    wait_for_peers(&mut alice, 1).await;
    alice.send_local_change("draft").unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut carol = client(&url, "r");
    let updates = wait_for_updates(&mut carol).await;
    assert_eq!(updates, vec![RemoteUpdate { from: None, content: "draft".into() }]);
    assert_eq!(carol.peer_count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closing_client_leaves_room() {
    let url = start_server().await;
    let mut alice = client(&url, "r");
    wait_for_peers(&mut alice, 1).await;
    let mut bob = client(&url, "r");
    wait_for_peers(&mut bob, 2).await;
    wait_for_peers(&mut alice, 2).await;

    bob.close();
    assert!(bob.current_room().is_none());
    assert_eq!(bob.state(), ConnectionState::Disconnected);
    wait_for_peers(&mut alice, 1).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refused_connection_sets_visible_error() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = client(&format!("ws://{}/ws", addr), "r");
    for _ in 0..MAX_POLLS {
        client.poll();
        if client.error().is_some() {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    assert_eq!(client.error(), Some(CONNECT_ERROR_MESSAGE));
    assert_eq!(client.state(), ConnectionState::Error);
    assert!(client.send_local_change("x").is_err());
}
