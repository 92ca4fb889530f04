use std::net::SocketAddr;
use std::time::Duration;

use lan_share::common::connection::Connection;
use lan_share::common::errors::ClientError;
use lan_share::server::config::ServerInfo;
use lan_share::server::{Server, ServerConfig};
use lan_share::FileShareClient;
use tokio::net::TcpListener;

async fn start_server(dir: &std::path::Path) -> SocketAddr {
    start_server_with_limit(dir, None).await
}

async fn start_server_with_limit(dir: &std::path::Path, max_frame_bytes: Option<u32>) -> SocketAddr {
    let config = ServerConfig {
        server: ServerInfo {
            address: "127.0.0.1:0".into(),
            shared_dir: dir.to_path_buf(),
            max_connections: 4,
            max_frame_bytes,
        },
        ..ServerConfig::default()
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { Server::new(config).serve(listener).await });
    addr
}

#[tokio::test]
async fn test_list_get_put_scenario() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
    let addr = start_server(dir.path()).await;

    let mut conn = Connection::connect(addr).await.unwrap();
    conn.set_read_timeout(Some(Duration::from_secs(5)));

    conn.send_text("LIST").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some("a.txt"));

    conn.send_text("GET-a.txt").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some("hi"));

    conn.send_text("PUT-b.txt").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some("OK"));
    conn.send(b"world").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some("ACK"));

    conn.send_text("LIST").await.unwrap();
    let listing = conn.receive_text().await.unwrap().unwrap();
    assert!(listing.split('\n').any(|name| name == "b.txt"));

    conn.send_text("BYE").await.unwrap();
    assert!(conn.receive().await.unwrap().is_none());

    assert_eq!(std::fs::read(dir.path().join("b.txt")).unwrap(), b"world");
}

#[tokio::test]
async fn test_client_core_against_server() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let mut client = FileShareClient::connect(addr, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert!(client.list().await.unwrap().is_empty());

    let image: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    client.put("image.bin", &image).await.unwrap();
    client.put_inline("notes.txt", "first\nsecond").await.unwrap();

    assert_eq!(client.list().await.unwrap(), ["image.bin", "notes.txt"]);
    assert_eq!(client.get("image.bin").await.unwrap(), image);
    assert_eq!(client.get("notes.txt").await.unwrap(), b"first\nsecond");

    assert!(matches!(
        client.get("missing.txt").await,
        Err(ClientError::Remote(_))
    ));
    // The session survives a handler error.
    assert_eq!(client.list().await.unwrap().len(), 2);

    client.bye().await.unwrap();
}

#[tokio::test]
async fn test_unknown_command_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let mut conn = Connection::connect(addr).await.unwrap();
    conn.send_text("DELETE-a.txt").await.unwrap();
    let reply = conn.receive_text().await.unwrap().unwrap();
    assert!(reply.starts_with("ERROR: "));

    conn.send_text("LIST").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn test_oversized_frame_closes_session() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
    let addr = start_server_with_limit(dir.path(), Some(1024)).await;

    let mut conn = Connection::connect(addr).await.unwrap();
    conn.set_read_timeout(Some(Duration::from_secs(5)));
    conn.send_text("GET-a.txt").await.unwrap();
    assert_eq!(conn.receive_text().await.unwrap().as_deref(), Some("hi"));

    conn.send(&vec![b'x'; 4096]).await.unwrap();
    assert!(conn.receive().await.unwrap().is_none());

    // Only the offending session ends; the server keeps accepting.
    let mut other = Connection::connect(addr).await.unwrap();
    other.set_read_timeout(Some(Duration::from_secs(5)));
    other.send_text("LIST").await.unwrap();
    assert_eq!(other.receive_text().await.unwrap().as_deref(), Some("a.txt"));
}
