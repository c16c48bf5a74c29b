//! End-to-end tests that drive a real server over TCP.

use kvss::{Config, Server, ShutdownHandle};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    async fn send(&mut self, line: &str) -> String {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();

        let mut response = String::new();
        self.reader.read_line(&mut response).await.unwrap();
        assert!(response.ends_with('\n'), "response not newline terminated");
        response.trim_end_matches('\n').to_string()
    }

    /// Reads until the server closes its side, returning whether it did.
    async fn at_eof(&mut self) -> bool {
        let mut rest = String::new();
        matches!(self.reader.read_line(&mut rest).await, Ok(0))
    }
}

async fn start_server() -> (SocketAddr, ShutdownHandle) {
    let config = Config::builder().port(0).build();
    let server = Server::bind(&config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.shutdown_handle();
    tokio::spawn(server.run());
    (addr, handle)
}

#[tokio::test]
async fn test_create_then_overwrite() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.send("KV/1.0 PUT user42 Alice").await, "201 CREATED");
    assert_eq!(client.send("KV/1.0 PUT user42 Bob").await, "200 OK");
    assert_eq!(client.send("KV/1.0 GET user42").await, "200 OK Bob");
}

#[tokio::test]
async fn test_missing_and_deleted_keys() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.send("KV/1.0 GET nonexistent").await, "404 NOT_FOUND");
    assert_eq!(client.send("KV/1.0 DEL nonexistent").await, "404 NOT_FOUND");

    client.send("KV/1.0 PUT k v").await;
    assert_eq!(client.send("KV/1.0 DEL k").await, "204 NO_CONTENT");
    assert_eq!(client.send("KV/1.0 DEL k").await, "404 NOT_FOUND");
    assert_eq!(client.send("KV/1.0 GET k").await, "404 NOT_FOUND");
}

#[tokio::test]
async fn test_stats_reports_distinct_keys() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send("KV/1.0 PUT a 1").await;
    client.send("KV/1.0 PUT a 2").await;
    client.send("KV/1.0 PUT b 3").await;

    let stats = client.send("KV/1.0 STATS").await;
    assert!(stats.starts_with("200 OK keys=2 uptime="), "{}", stats);
    assert!(stats.ends_with("s served=4"), "{}", stats);
}

#[tokio::test]
async fn test_version_handling() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send("KV/1.0 PUT user42 Alice").await;

    assert_eq!(client.send("PUT user43 Charlie").await, "400 BAD_REQUEST");
    assert_eq!(client.send("KV/2.0 GET user42").await, "426 UPGRADE_REQUIRED");
    assert_eq!(client.send("KV/1.0 POTT user42 Alice").await, "400 BAD_REQUEST");
    assert_eq!(client.send("KV/1.0 PUT user44").await, "400 BAD_REQUEST");
}

#[tokio::test]
async fn test_multi_word_value() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    client.send("KV/1.0 PUT motto  keep   it simple ").await;
    assert_eq!(client.send("KV/1.0 GET motto").await, "200 OK keep it simple");
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.send("KV/1.0 QUIT").await, "200 OK bye");
    assert!(client.at_eof().await);
}

#[tokio::test]
async fn test_scenario() {
    let (addr, _handle) = start_server().await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.send("KV/1.0 PUT a 1").await, "201 CREATED");
    assert_eq!(client.send("KV/1.0 GET a").await, "200 OK 1");
    assert_eq!(client.send("KV/1.0 DEL a").await, "204 NO_CONTENT");
    assert_eq!(client.send("KV/1.0 GET a").await, "404 NOT_FOUND");
    assert!(client.send("KV/1.0 STATS").await.starts_with("200 OK keys=0 "));
}

#[tokio::test]
async fn test_one_request_per_connection() {
    let (addr, _handle) = start_server().await;

    assert_eq!(
        TestClient::connect(addr).await.send("KV/1.0 PUT user42 Alice").await,
        "201 CREATED"
    );
    assert_eq!(
        TestClient::connect(addr).await.send("KV/1.0 GET user42").await,
        "200 OK Alice"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_put_same_new_key() {
    const CLIENTS: usize = 16;

    let (addr, _handle) = start_server().await;

    let mut clients = Vec::with_capacity(CLIENTS);
    for _ in 0..CLIENTS {
        clients.push(TestClient::connect(addr).await);
    }

    let tasks: Vec<_> = clients
        .into_iter()
        .enumerate()
        .map(|(i, mut client)| {
            tokio::spawn(async move { client.send(&format!("KV/1.0 PUT race v{}", i)).await })
        })
        .collect();

    let mut responses = Vec::with_capacity(CLIENTS);
    for task in tasks {
        responses.push(task.await.unwrap());
    }

    let created = responses.iter().filter(|r| *r == "201 CREATED").count();
    let updated = responses.iter().filter(|r| *r == "200 OK").count();
    assert_eq!(created, 1);
    assert_eq!(updated, CLIENTS - 1);

    let mut checker = TestClient::connect(addr).await;
    let value = checker.send("KV/1.0 GET race").await;
    assert!(value.starts_with("200 OK v"), "{}", value);
    assert!(checker.send("KV/1.0 STATS").await.starts_with("200 OK keys=1 "));
}

#[tokio::test]
async fn test_client_disconnect_does_not_affect_others() {
    let (addr, _handle) = start_server().await;

    let mut stays = TestClient::connect(addr).await;
    {
        let mut leaves = TestClient::connect(addr).await;
        leaves.send("KV/1.0 PUT k v").await;
    }

    assert_eq!(stays.send("KV/1.0 GET k").await, "200 OK v");
}
