use rand::RngCore;
use sha2::{Digest, Sha256};

use super::codec;
use super::HelloError;

/// One ClientHello extension record, owning its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub ext_type: u16,
    pub payload: Vec<u8>,
}

impl Extension {
    pub fn new(ext_type: u16, payload: Vec<u8>) -> Self {
        Self { ext_type, payload }
    }

    /// Bytes this extension occupies on the wire, header included.
    pub fn wire_len(&self) -> usize {
        codec::framed_len(&self.payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, HelloError> {
        codec::encode(self.ext_type, &self.payload)
    }

    pub fn write_into(&self, buf: &mut [u8]) -> Result<usize, HelloError> {
        codec::write_into(buf, self.ext_type, &self.payload)
    }
}

/// The ordered cipher suites and extensions of one ClientHello.
///
/// Order in both lists is part of the fingerprint and is serialized as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloSpec {
    pub version_min: u16,
    pub version_max: u16,
    pub cipher_suites: Vec<u16>,
    pub extensions: Vec<Extension>,
}

impl HelloSpec {
    /// Extension type codes in wire order.
    pub fn extension_types(&self) -> Vec<u16> {
        self.extensions.iter().map(|e| e.ext_type).collect()
    }

    /// Index of the first extension of the given type.
    pub fn position(&self, ext_type: u16) -> Option<usize> {
        self.extensions.iter().position(|e| e.ext_type == ext_type)
    }

    pub fn find(&self, ext_type: u16) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.ext_type == ext_type)
    }
}

/// One entry of the key_share extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: u16,
    pub key_exchange: Vec<u8>,
}

/// The per-message random values of a ClientHello.
#[derive(Clone, PartialEq, Eq)]
pub struct HelloNonce {
    pub random: [u8; 32],
    pub session_id: [u8; 32],
}

impl HelloNonce {
    /// Fresh values from `rng`.
    pub fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut random = [0u8; 32];
        let mut session_id = [0u8; 32];
        rng.fill_bytes(&mut random);
        rng.fill_bytes(&mut session_id);
        Self { random, session_id }
    }

    /// Stable values derived from `label`: SHA-256(label) for the random,
    /// SHA-256(random) for the session id.
    pub fn derived(label: &str) -> Self {
        let random: [u8; 32] = Sha256::digest(label.as_bytes()).into();
        let session_id: [u8; 32] = Sha256::digest(random).into();
        Self { random, session_id }
    }
}

// Keep nonce bytes out of logs.
impl std::fmt::Debug for HelloNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelloNonce").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_extension_wire_len() {
        let ext = Extension::new(0x0010, vec![0; 11]);
        assert_eq!(ext.wire_len(), 15);
        assert_eq!(ext.encode().unwrap().len(), 15);
    }

    #[test]
    fn test_spec_positions() {
        let spec = HelloSpec {
            version_min: 0x0301,
            version_max: 0x0304,
            cipher_suites: vec![0x1301],
            extensions: vec![
                Extension::new(0x000a, vec![]),
                Extension::new(0x0000, vec![]),
            ],
        };
        assert_eq!(spec.extension_types(), vec![0x000a, 0x0000]);
        assert_eq!(spec.position(0x0000), Some(1));
        assert_eq!(spec.position(0x0015), None);
        assert!(spec.find(0x000a).is_some());
    }

    #[test]
    fn test_derived_nonce_is_stable_per_label() {
        assert_eq!(HelloNonce::derived("a.example"), HelloNonce::derived("a.example"));
        assert_ne!(HelloNonce::derived("a.example"), HelloNonce::derived("b.example"));
        let n = HelloNonce::derived("");
        assert_ne!(n.random, n.session_id);
    }

    #[test]
    fn test_seeded_nonce_repeats() {
        let a = HelloNonce::from_rng(&mut StdRng::seed_from_u64(1));
        let b = HelloNonce::from_rng(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_nonce_debug_hides_bytes() {
        let n = HelloNonce::derived("x");
        assert_eq!(format!("{:?}", n), "HelloNonce { .. }");
    }
}
