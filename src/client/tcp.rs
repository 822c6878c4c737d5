//! RESP client over a single TCP connection.

use crate::client::{reject_error, WireClient};
use crate::command::Command;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::resp::{self, RespValue};
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    // Set from the request write until its reply is fully parsed. Still set
    // on the next call means the caller was cancelled mid round trip.
    in_flight: bool,
}

impl Connection {
    async fn open(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| CacheError::Io(format!("connect to {} timed out", addr)))??;
        stream.set_nodelay(true)?;
        debug!("Connected to {}", addr);
        Ok(Connection {
            stream,
            buffer: BytesMut::with_capacity(4096),
            in_flight: false,
        })
    }

    async fn round_trip(&mut self, command: &Command) -> Result<RespValue> {
        let request = RespValue::encode_request(command.name, &command.args);
        self.in_flight = true;
        self.stream.write_all(request.as_bytes()).await?;
        self.stream.flush().await?;

        loop {
            if let Some((value, len)) = resp::parse(&self.buffer).map_err(CacheError::Protocol)? {
                self.buffer.advance(len);
                self.in_flight = false;
                return Ok(value);
            }
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(CacheError::Io("connection closed by store".to_string()));
            }
        }
    }
}

/// RESP client holding one connection; one request in flight at a time.
///
/// The connection is opened lazily and reopened on the next call after an
/// IO or protocol failure, or after a call was dropped before its reply was
/// read.
pub struct RespClient {
    addr: String,
    connect_timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl RespClient {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Ok(RespClient {
            addr: config.address()?,
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            conn: Mutex::new(None),
        })
    }

    /// Build the client and open its connection up front.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = Self::new(config)?;
        *client.conn.lock().await = Some(Connection::open(&client.addr, client.connect_timeout).await?);
        Ok(client)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl WireClient for RespClient {
    #[instrument(skip(self, command), fields(cmd = command.name))]
    async fn call(&self, command: &Command) -> Result<RespValue> {
        let mut guard = self.conn.lock().await;
        if guard.as_ref().is_some_and(|conn| conn.in_flight) {
            warn!("Discarding connection to {} with an unread reply", self.addr);
            *guard = None;
        }
        if guard.is_none() {
            *guard = Some(Connection::open(&self.addr, self.connect_timeout).await?);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(CacheError::Io("no connection".to_string()));
        };

        match conn.round_trip(command).await {
            Ok(reply) => reject_error(reply),
            Err(e) => {
                warn!("Dropping connection to {} after error: {}", self.addr, e);
                *guard = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::key;
    use tokio::net::TcpListener;

    // Accepts one connection, answers each request with the next canned reply
    // and hands back what it received.
    async fn fake_store(replies: Vec<&'static str>) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            for reply in replies {
                let mut buf = [0u8; 1024];
                let n = socket.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                // Split the reply to exercise partial reads.
                let (head, tail) = reply.split_at(reply.len() / 2);
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
                tokio::task::yield_now().await;
                socket.write_all(tail.as_bytes()).await.unwrap();
            }
            received
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_round_trip_and_partial_reads() {
        let (addr, handle) = fake_store(vec!["+OK\r\n", "$5\r\nhello\r\n", "$-1\r\n"]).await;
        let client = RespClient::connect(&CacheConfig::new("t:", addr)).await.unwrap();

        assert_eq!(
            client.call(&key::set("k", "hello", Some(5))).await.unwrap(),
            RespValue::SimpleString("OK".to_string())
        );
        assert_eq!(client.call(&key::get("k")).await.unwrap(), RespValue::bulk("hello"));
        assert_eq!(client.call(&key::get("gone")).await.unwrap(), RespValue::null());

        let received = String::from_utf8(handle.await.unwrap()).unwrap();
        assert!(received.starts_with("*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\nhello\r\n$2\r\nEX\r\n$1\r\n5\r\n"));
    }

    #[tokio::test]
    async fn test_error_reply_becomes_server_error() {
        let (addr, _handle) = fake_store(vec!["-ERR unknown command 'FT._LIST'\r\n"]).await;
        let client = RespClient::new(&CacheConfig::new("t:", addr)).unwrap();
        let err = client.call(&Command::new("FT._LIST")).await.unwrap_err();
        assert_eq!(err, CacheError::Server("ERR unknown command 'FT._LIST'".to_string()));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let result = RespClient::connect(&CacheConfig::new("t:", addr)).await;
        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    async fn read_request(socket: &mut TcpStream, buf: &mut BytesMut) -> Option<Vec<String>> {
        loop {
            if let Ok(Some((value, len))) = resp::parse(buf) {
                buf.advance(len);
                let RespValue::Array(Some(items)) = value else {
                    return None;
                };
                return Some(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            RespValue::BulkString(Some(s)) => Some(s),
                            _ => None,
                        })
                        .collect(),
                );
            }
            match socket.read_buf(buf).await {
                Ok(n) if n > 0 => {}
                _ => return None,
            }
        }
    }

    // Answers every GET with `value-of-<key>` after `delay`, on any number
    // of connections.
    async fn slow_store(delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = BytesMut::new();
                    while let Some(args) = read_request(&mut socket, &mut buf).await {
                        tokio::time::sleep(delay).await;
                        let key = args.last().cloned().unwrap_or_default();
                        let reply = RespValue::bulk(format!("value-of-{}", key)).serialize();
                        if socket.write_all(reply.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_cancelled_call_does_not_leak_its_reply() {
        let addr = slow_store(Duration::from_millis(50)).await;
        let client = RespClient::new(&CacheConfig::new("t:", addr)).unwrap();

        let abandoned = tokio::time::timeout(Duration::from_millis(10), client.call(&key::get("a"))).await;
        assert!(abandoned.is_err());

        assert_eq!(client.call(&key::get("b")).await.unwrap(), RespValue::bulk("value-of-b"));
        assert_eq!(client.call(&key::get("c")).await.unwrap(), RespValue::bulk("value-of-c"));
    }

    #[tokio::test]
    async fn test_reconnects_after_store_closes_mid_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut first, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            read_request(&mut first, &mut buf).await;
            first.write_all(b"$5\r\nhel").await.unwrap();
            first.flush().await.unwrap();
            drop(first);

            let (mut second, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            read_request(&mut second, &mut buf).await;
            second.write_all(b"$5\r\nhello\r\n").await.unwrap();
        });

        let client = RespClient::new(&CacheConfig::new("t:", addr)).unwrap();
        let err = client.call(&key::get("k")).await.unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
        assert_eq!(client.call(&key::get("k")).await.unwrap(), RespValue::bulk("hello"));
    }

    #[test]
    fn test_new_requires_url() {
        let config = CacheConfig {
            prefix: Some("t:".to_string()),
            ..Default::default()
        };
        assert!(matches!(RespClient::new(&config), Err(CacheError::Config(_))));
    }
}
