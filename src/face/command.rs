//! Command Interests for the forwarder's management protocol.
//!
//! A command Interest carries four trailing name components beyond the
//! command name: an 8-byte big-endian millisecond timestamp, an 8-byte
//! random nonce, and the SignatureInfo and SignatureValue components the
//! keychain appends. The timestamp is strictly monotone per generator;
//! forwarders use it for replay protection.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::core::error::SignError;
use crate::wire::{Interest, Name};

/// Signs command Interests by appending SignatureInfo and SignatureValue
/// name components.
///
/// Shared by reference between Faces and assumed internally synchronized.
#[async_trait]
pub trait KeyChain: Send + Sync {
    /// Sign `interest` with the key named by `cert_name`, appending
    /// exactly two components to the Interest name.
    async fn sign(&self, interest: &mut Interest, cert_name: &Name) -> Result<(), SignError>;
}

/// Appends timestamp + nonce and requests a signature.
#[derive(Debug, Default)]
pub struct CommandInterestGenerator {
    last_timestamp_ms: u64,
}

impl CommandInterestGenerator {
    /// Create a generator with no timestamp history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn `interest` into a signed command Interest.
    ///
    /// The timestamp is strictly greater than any this generator has
    /// emitted; a stalled wall clock bumps it by one millisecond.
    pub async fn prepare(
        &mut self,
        interest: &mut Interest,
        keychain: &dyn KeyChain,
        cert_name: &Name,
    ) -> Result<(), SignError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SignError(e.to_string()))?
            .as_millis() as u64;
        let timestamp = now_ms.max(self.last_timestamp_ms + 1);
        self.last_timestamp_ms = timestamp;

        let nonce: [u8; 8] = rand::random();
        let name = interest
            .name()
            .appended(timestamp.to_be_bytes().to_vec())
            .appended(nonce.to_vec());
        interest.set_name(name);

        keychain.sign(interest, cert_name).await
    }

    /// The most recent timestamp emitted, in milliseconds.
    pub fn last_timestamp_ms(&self) -> u64 {
        self.last_timestamp_ms
    }
}
