//! The handshake engine is the collaborator that receives the finished spec.

use rand::rngs::OsRng;
use tracing::debug;

use super::serialize::{serialize_client_hello, wrap_records};
use super::types::{HelloNonce, HelloSpec};
use super::HelloError;

/// Accepts an assembled [`HelloSpec`] and takes it from there: serialization
/// for transmission, key exchange, the network round trip.
pub trait HandshakeEngine {
    /// Rejections must come back as [`HelloError::InvalidSpec`].
    fn apply_spec(&mut self, spec: HelloSpec) -> Result<(), HelloError>;
}

/// Engine that serializes the spec into TLS plaintext records and keeps them
/// for the caller to send. Performs no I/O.
#[derive(Debug, Default)]
pub struct WireEngine {
    nonce: Option<HelloNonce>,
    applied: Option<AppliedHello>,
}

#[derive(Debug, Clone)]
struct AppliedHello {
    spec: HelloSpec,
    handshake: Vec<u8>,
    records: Vec<u8>,
}

impl WireEngine {
    /// Engine drawing a fresh random and session id from the OS.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine using a fixed nonce.
    pub fn with_nonce(nonce: HelloNonce) -> Self {
        Self {
            nonce: Some(nonce),
            applied: None,
        }
    }

    pub fn spec(&self) -> Option<&HelloSpec> {
        self.applied.as_ref().map(|a| &a.spec)
    }

    /// The serialized handshake message of the last applied spec.
    pub fn client_hello(&self) -> Option<&[u8]> {
        self.applied.as_ref().map(|a| a.handshake.as_slice())
    }

    /// The last applied spec framed as TLS records, ready for the socket.
    pub fn records(&self) -> Option<&[u8]> {
        self.applied.as_ref().map(|a| a.records.as_slice())
    }
}

impl HandshakeEngine for WireEngine {
    fn apply_spec(&mut self, spec: HelloSpec) -> Result<(), HelloError> {
        let nonce = self
            .nonce
            .clone()
            .unwrap_or_else(|| HelloNonce::from_rng(&mut OsRng));
        let handshake = serialize_client_hello(&spec, &nonce)?;
        let records = wrap_records(&handshake);
        debug!(
            handshake_len = handshake.len(),
            records_len = records.len(),
            "client hello serialized"
        );
        self.applied = Some(AppliedHello {
            spec,
            handshake,
            records,
        });
        Ok(())
    }
}
