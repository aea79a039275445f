//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Integration tests for the oscarix-service crate

use async_trait::async_trait;
use bytes::Bytes;
use oscarix_service::{
    Connection, ConnectionId, HandlerOutcome, Server, ServerConfig, ServiceError, ServiceHandler,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};

/// Echoes every chunk back and greets new connections.
struct EchoHandler;

#[async_trait]
impl ServiceHandler for EchoHandler {
    async fn on_connect(&self, _id: ConnectionId, conn: &Connection) -> oscarix_service::Result<()> {
        conn.send(Bytes::from_static(b"hello")).await
    }

    async fn on_data(
        &self,
        _id: ConnectionId,
        conn: &Connection,
        data: Bytes,
    ) -> oscarix_service::Result<HandlerOutcome> {
        conn.send(data).await?;
        Ok(HandlerOutcome::Continue)
    }
}

/// Fails on any data, counting disconnects.
struct FaultyHandler {
    disconnects: AtomicUsize,
}

#[async_trait]
impl ServiceHandler for FaultyHandler {
    async fn on_data(
        &self,
        _id: ConnectionId,
        _conn: &Connection,
        _data: Bytes,
    ) -> oscarix_service::Result<HandlerOutcome> {
        Err(ServiceError::Protocol("unparseable".to_string()))
    }

    async fn on_disconnect(&self, _id: ConnectionId, _conn: &Connection) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

async fn start_server(handler: Arc<dyn ServiceHandler>) -> Server {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
    let server = Server::new(config).await.unwrap();
    server.start(handler).await.unwrap();
    server
}

#[tokio::test]
async fn test_greeting_and_echo() {
    let server = start_server(Arc::new(EchoHandler)).await;
    let mut client = TcpStream::connect(server.bind_address()).await.unwrap();

    let mut greeting = [0u8; 5];
    timeout(Duration::from_secs(5), client.read_exact(&mut greeting))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&greeting, b"hello");

    client.write_all(b"ping").await.unwrap();
    let mut echo = [0u8; 4];
    timeout(Duration::from_secs(5), client.read_exact(&mut echo))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&echo, b"ping");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_handler_error_terminates_only_that_connection() {
    let handler = Arc::new(FaultyHandler {
        disconnects: AtomicUsize::new(0),
    });
    let server = start_server(handler.clone()).await;

    // first client triggers the handler error
    let mut bad_client = TcpStream::connect(server.bind_address()).await.unwrap();
    bad_client.write_all(b"boom").await.unwrap();

    // its socket gets closed by the server
    let mut buffer = [0u8; 1];
    let n = timeout(Duration::from_secs(5), bad_client.read(&mut buffer))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);

    // the accept loop is still alive and takes new connections
    let _second_client = TcpStream::connect(server.bind_address()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.is_running());
    assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_connection_limit() {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap()).with_max_connections(1);
    let server = Server::new(config).await.unwrap();
    server.start(Arc::new(EchoHandler)).await.unwrap();

    let mut first = TcpStream::connect(server.bind_address()).await.unwrap();
    let mut greeting = [0u8; 5];
    first.read_exact(&mut greeting).await.unwrap();

    // second connection is accepted then dropped by the limit gate
    let mut second = TcpStream::connect(server.bind_address()).await.unwrap();
    let mut buffer = [0u8; 1];
    let n = timeout(Duration::from_secs(5), second.read(&mut buffer))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cross_task_send_via_manager() {
    let server = start_server(Arc::new(EchoHandler)).await;
    let mut client = TcpStream::connect(server.bind_address()).await.unwrap();

    let mut greeting = [0u8; 5];
    client.read_exact(&mut greeting).await.unwrap();

    // locate the connection id and push bytes at it from outside its worker
    tokio::time::sleep(Duration::from_millis(100)).await;
    let manager = server.manager();
    assert_eq!(manager.connection_count(), 1);

    let id = ConnectionId::new(1);
    manager
        .send_to(id, Bytes::from_static(b"pushed"))
        .await
        .unwrap();

    let mut pushed = [0u8; 6];
    timeout(Duration::from_secs(5), client.read_exact(&mut pushed))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&pushed, b"pushed");

    server.shutdown().await.unwrap();
}
