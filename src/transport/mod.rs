//! Byte-stream transports to an NDN forwarder.
//!
//! A [`Transport`] is a connected duplex byte channel; the Face feeds
//! inbound chunks into the [`ElementReader`](reader::ElementReader) and
//! writes whole encoded elements out. Variants cover TCP, Unix domain
//! sockets, and WebSocket; none of them interpret the bytes.

pub mod reader;

use std::io;
#[cfg(unix)]
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::core::constants::{
    DEFAULT_TCP_PORT, MAX_PACKET_SIZE, NDND_UNIX_SOCKET, NFD_UNIX_SOCKET,
};
use crate::core::error::FaceError;

/// Connection attempts per endpoint before moving to the next one.
const ATTEMPTS_PER_ENDPOINT: u32 = 2;

/// Where to reach a forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP to `host:port`.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port (6363 by convention).
        port: u16,
    },
    /// Unix domain socket.
    #[cfg(unix)]
    Unix {
        /// Socket path.
        path: PathBuf,
    },
    /// WebSocket, e.g. `ws://localhost:9696`.
    Ws {
        /// Full WebSocket URL.
        url: String,
    },
}

impl Endpoint {
    /// TCP endpoint with the default forwarder port.
    pub fn tcp(host: impl Into<String>) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port: DEFAULT_TCP_PORT,
        }
    }

    /// The platform-appropriate default: NFD's Unix socket if present,
    /// then ndnd's, else TCP loopback.
    pub fn default_local() -> Self {
        #[cfg(unix)]
        {
            for path in [NFD_UNIX_SOCKET, NDND_UNIX_SOCKET] {
                if Path::new(path).exists() {
                    return Endpoint::Unix {
                        path: PathBuf::from(path),
                    };
                }
            }
        }
        Endpoint::tcp("127.0.0.1")
    }

    /// Whether the endpoint reaches a forwarder on this machine.
    ///
    /// Resolves host names, so it may perform a DNS lookup.
    pub async fn is_local(&self) -> io::Result<bool> {
        match self {
            #[cfg(unix)]
            Endpoint::Unix { .. } => Ok(true),
            Endpoint::Tcp { host, port } => host_is_loopback(host, *port).await,
            Endpoint::Ws { url } => match ws_host_port(url) {
                Some((host, port)) => host_is_loopback(&host, port).await,
                None => Ok(false),
            },
        }
    }
}

async fn host_is_loopback(host: &str, port: u16) -> io::Result<bool> {
    let mut addrs = lookup_host((host, port)).await?;
    Ok(addrs.next().is_some_and(|a| a.ip().is_loopback()))
}

fn ws_host_port(url: &str) -> Option<(String, u16)> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))?;
    let authority = rest.split('/').next()?;
    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
        None => Some((authority.to_string(), crate::core::constants::DEFAULT_WS_PORT)),
    }
}

enum Inner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
    Ws(Box<WebSocketStream<MaybeTlsStream<TcpStream>>>),
}

/// A connected duplex byte channel to a forwarder.
pub struct Transport {
    inner: Inner,
    recv_buf: Vec<u8>,
}

impl Transport {
    /// Connect to `endpoint`.
    pub async fn connect(endpoint: &Endpoint) -> io::Result<Self> {
        let inner = match endpoint {
            Endpoint::Tcp { host, port } => {
                Inner::Tcp(TcpStream::connect((host.as_str(), *port)).await?)
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => Inner::Unix(UnixStream::connect(path).await?),
            Endpoint::Ws { url } => {
                let (ws, _) = connect_async(url.as_str())
                    .await
                    .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
                Inner::Ws(Box::new(ws))
            }
        };
        debug!(?endpoint, "transport connected");
        Ok(Self {
            inner,
            recv_buf: vec![0u8; MAX_PACKET_SIZE],
        })
    }

    /// Try each endpoint in order, retrying once per endpoint; fail with
    /// `HostExhausted` when none connects. Returns the endpoint that
    /// accepted the connection alongside the transport.
    pub async fn connect_any(endpoints: &[Endpoint]) -> Result<(Self, Endpoint), FaceError> {
        for endpoint in endpoints {
            for attempt in 1..=ATTEMPTS_PER_ENDPOINT {
                match Self::connect(endpoint).await {
                    Ok(transport) => return Ok((transport, endpoint.clone())),
                    Err(err) => {
                        warn!(?endpoint, attempt, %err, "connect attempt failed");
                    }
                }
            }
        }
        Err(FaceError::HostExhausted)
    }

    /// Write one encoded element.
    pub async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.inner {
            Inner::Tcp(stream) => {
                stream.write_all(bytes).await?;
                stream.flush().await
            }
            #[cfg(unix)]
            Inner::Unix(stream) => {
                stream.write_all(bytes).await?;
                stream.flush().await
            }
            Inner::Ws(ws) => ws
                .send(Message::Binary(bytes.to_vec()))
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e)),
        }
    }

    /// Read the next inbound chunk. An empty chunk means the peer closed
    /// the connection.
    pub async fn recv(&mut self) -> io::Result<Bytes> {
        match &mut self.inner {
            Inner::Tcp(stream) => {
                let n = stream.read(&mut self.recv_buf).await?;
                Ok(Bytes::copy_from_slice(&self.recv_buf[..n]))
            }
            #[cfg(unix)]
            Inner::Unix(stream) => {
                let n = stream.read(&mut self.recv_buf).await?;
                Ok(Bytes::copy_from_slice(&self.recv_buf[..n]))
            }
            Inner::Ws(ws) => loop {
                match ws.next().await {
                    None => return Ok(Bytes::new()),
                    Some(Ok(Message::Binary(payload))) => return Ok(Bytes::from(payload)),
                    Some(Ok(Message::Close(_))) => return Ok(Bytes::new()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return Err(io::Error::new(io::ErrorKind::ConnectionReset, e))
                    }
                }
            },
        }
    }

    /// Shut the channel down.
    pub async fn close(&mut self) {
        match &mut self.inner {
            Inner::Tcp(stream) => {
                let _ = stream.shutdown().await;
            }
            #[cfg(unix)]
            Inner::Unix(stream) => {
                let _ = stream.shutdown().await;
            }
            Inner::Ws(ws) => {
                let _ = ws.close(None).await;
            }
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            Inner::Tcp(_) => "tcp",
            #[cfg(unix)]
            Inner::Unix(_) => "unix",
            Inner::Ws(_) => "ws",
        };
        f.debug_struct("Transport").field("kind", &kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_send_recv() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            peer.read_exact(&mut buf).await.unwrap();
            peer.write_all(&buf).await.unwrap();
            buf
        });

        let endpoint = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port: addr.port(),
        };
        let mut transport = Transport::connect(&endpoint).await.unwrap();
        transport.send(b"hello").await.unwrap();

        let echoed = transport.recv().await.unwrap();
        assert_eq!(&echoed[..], b"hello");
        assert_eq!(&server.await.unwrap(), b"hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_send_recv() {
        use tokio::net::UnixListener;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forwarder.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 3];
            peer.read_exact(&mut buf).await.unwrap();
            peer.write_all(b"ack").await.unwrap();
        });

        let endpoint = Endpoint::Unix { path };
        let mut transport = Transport::connect(&endpoint).await.unwrap();
        transport.send(b"ndn").await.unwrap();
        assert_eq!(&transport.recv().await.unwrap()[..], b"ack");
    }

    #[tokio::test]
    async fn test_recv_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (peer, _) = listener.accept().await.unwrap();
            drop(peer);
        });

        let endpoint = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port: addr.port(),
        };
        let mut transport = Transport::connect(&endpoint).await.unwrap();
        assert!(transport.recv().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_any_exhausts_hosts() {
        // A bound-then-dropped listener leaves a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoints = [Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port: addr.port(),
        }];
        match Transport::connect_any(&endpoints).await {
            Err(FaceError::HostExhausted) => {}
            other => panic!("expected HostExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tcp_loopback_is_local() {
        let endpoint = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port: 6363,
        };
        assert!(endpoint.is_local().await.unwrap());
    }

    #[test]
    fn test_ws_url_parsing() {
        assert_eq!(
            ws_host_port("ws://localhost:9696/ndn"),
            Some(("localhost".into(), 9696))
        );
        assert_eq!(
            ws_host_port("wss://example.org"),
            Some(("example.org".into(), 9696))
        );
        assert_eq!(ws_host_port("http://x"), None);
    }

    #[test]
    fn test_default_endpoint_exists() {
        // Whatever the platform, the default must name something concrete.
        match Endpoint::default_local() {
            Endpoint::Tcp { port, .. } => assert_eq!(port, DEFAULT_TCP_PORT),
            #[cfg(unix)]
            Endpoint::Unix { path } => assert!(!path.as_os_str().is_empty()),
            Endpoint::Ws { .. } => panic!("default should not be ws"),
        }
    }
}
