//! Shared test support: a loopback stand-in for a forwarder and a
//! keychain that signs without cryptography.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::core::error::SignError;
use crate::face::command::KeyChain;
use crate::transport::reader::ElementReader;
use crate::transport::Endpoint;
use crate::wire::{Component, Data, Element, Interest, Name};

/// Accepts one Face connection on loopback TCP, decodes everything the
/// Face sends, and writes whatever the test injects.
pub struct TestForwarder {
    /// Endpoint for the Face under test.
    pub endpoint: Endpoint,
    inbound: mpsc::UnboundedReceiver<Element>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl TestForwarder {
    /// Bind a listener and start serving the first connection.
    pub async fn spawn() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (mut read_half, mut write_half) = stream.into_split();

            tokio::spawn(async move {
                while let Some(bytes) = out_rx.recv().await {
                    if write_half.write_all(&bytes).await.is_err() {
                        return;
                    }
                }
            });

            let mut reader = ElementReader::new();
            let mut buf = [0u8; 4096];
            loop {
                let Ok(n) = read_half.read(&mut buf).await else {
                    return;
                };
                if n == 0 {
                    return;
                }
                let Ok(elements) = reader.push(&buf[..n]) else {
                    return;
                };
                for element in elements {
                    if let Ok(decoded) = Element::decode(&element) {
                        let _ = in_tx.send(decoded);
                    }
                }
            }
        });

        Self {
            endpoint: Endpoint::Tcp {
                host: "127.0.0.1".into(),
                port: addr.port(),
            },
            inbound: in_rx,
            outbound: out_tx,
        }
    }

    /// The next Interest the Face sends; panics after five seconds.
    pub async fn next_interest(&mut self) -> Interest {
        timeout(Duration::from_secs(5), async {
            loop {
                match self.inbound.recv().await {
                    Some(Element::Interest(interest)) => return interest,
                    Some(Element::Data(_)) => continue,
                    None => panic!("forwarder connection closed"),
                }
            }
        })
        .await
        .expect("timed out waiting for an interest")
    }

    /// The next element of either kind, if one arrives in time.
    pub async fn try_next_element(&mut self, wait: Duration) -> Option<Element> {
        timeout(wait, self.inbound.recv()).await.ok().flatten()
    }

    /// Inject a Data packet toward the Face.
    pub fn send_data(&self, data: &Data) {
        let _ = self.outbound.send(data.encode());
    }

    /// Inject an Interest toward the Face.
    pub fn send_interest(&self, interest: &Interest) {
        let mut interest = interest.clone();
        let _ = self.outbound.send(interest.encode());
    }

    /// Inject raw bytes toward the Face.
    pub fn send_raw(&self, bytes: Vec<u8>) {
        let _ = self.outbound.send(bytes);
    }
}

/// Signs by appending two fixed components; no cryptography involved.
pub struct StubKeyChain;

#[async_trait]
impl KeyChain for StubKeyChain {
    async fn sign(&self, interest: &mut Interest, _cert_name: &Name) -> Result<(), SignError> {
        let name = interest
            .name()
            .appended(Component::new(b"stub-sig-info".to_vec()))
            .appended(Component::new(b"stub-sig-value".to_vec()));
        interest.set_name(name);
        Ok(())
    }
}
