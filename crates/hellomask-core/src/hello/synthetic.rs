//! Decoy ClientHello carried inside a padding extension.
//!
//! The padding extension (type 0x0015) normally holds zero filler. Here its
//! payload is a complete serialized ClientHello addressed to a decoy host, so
//! an observer reading the padding sees a second, well-formed handshake.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::codec;
use super::consts::{cipher_suites as cs, extensions as ext, versions, GREASE_PLACEHOLDER};
use super::extensions;
use super::grease::random_grease;
use super::serialize::serialize_client_hello;
use super::types::{Extension, HelloNonce, HelloSpec};
use super::HelloError;
use crate::config::Randomization;

/// Position of the first TLS 1.2 suite in [`DECOY_CIPHER_SUITES`], after the
/// GREASE slot and the three TLS 1.3 suites.
const DECOY_TLS12_START: usize = 4;

const DECOY_CIPHER_SUITES: [u16; 10] = [
    GREASE_PLACEHOLDER,
    cs::TLS_AES_128_GCM_SHA256,
    cs::TLS_AES_256_GCM_SHA384,
    cs::TLS_CHACHA20_POLY1305_SHA256,
    cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    cs::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    cs::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    cs::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
];

/// The decoy spec: TLS 1.0..=1.3, a GREASE-led suite list and one
/// server_name extension naming `decoy_host`.
///
/// With an rng the GREASE value is drawn at random and the TLS 1.2 suites are
/// shuffled. Neither changes the serialized size.
pub fn decoy_spec(decoy_host: &str, rng: Option<&mut StdRng>) -> Result<HelloSpec, HelloError> {
    let mut cipher_suites = DECOY_CIPHER_SUITES.to_vec();
    if let Some(rng) = rng {
        cipher_suites[0] = random_grease(rng);
        cipher_suites[DECOY_TLS12_START..].shuffle(rng);
    }

    Ok(HelloSpec {
        version_min: versions::TLS10,
        version_max: versions::TLS13,
        cipher_suites,
        extensions: vec![extensions::server_name(decoy_host)?],
    })
}

/// Serialized decoy ClientHello (handshake header + body).
pub fn build_inner_hello(decoy_host: &str, randomization: &Randomization) -> Result<Vec<u8>, HelloError> {
    let (spec, nonce) = match randomization.rng() {
        Some(mut rng) => {
            let spec = decoy_spec(decoy_host, Some(&mut rng))?;
            (spec, HelloNonce::from_rng(&mut rng))
        }
        None => (decoy_spec(decoy_host, None)?, HelloNonce::derived(decoy_host)),
    };
    serialize_client_hello(&spec, &nonce)
}

/// A padding extension whose payload is a decoy ClientHello.
///
/// Built once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartPadding {
    decoy_host: String,
    data: Vec<u8>,
}

impl SmartPadding {
    pub fn new(decoy_host: &str, randomization: &Randomization) -> Result<Self, HelloError> {
        let data = build_inner_hello(decoy_host, randomization)?;
        // The payload has to fit the extension's u16 length field.
        if data.len() > u16::MAX as usize {
            return Err(HelloError::InvalidSpec(format!(
                "decoy hello is {} bytes, too large for a padding extension",
                data.len()
            )));
        }
        debug!(decoy_len = data.len(), "built decoy hello");
        Ok(Self {
            decoy_host: decoy_host.to_string(),
            data,
        })
    }

    pub fn decoy_host(&self) -> &str {
        &self.decoy_host
    }

    /// The embedded handshake message.
    pub fn inner_hello(&self) -> &[u8] {
        &self.data
    }

    /// Bytes the framed extension occupies.
    pub fn wire_len(&self) -> usize {
        codec::framed_len(&self.data)
    }

    pub fn write_into(&self, buf: &mut [u8]) -> Result<usize, HelloError> {
        codec::write_into(buf, ext::PADDING, &self.data)
    }
}

impl From<SmartPadding> for Extension {
    fn from(padding: SmartPadding) -> Self {
        Extension::new(ext::PADDING, padding.data)
    }
}

/// Exact size of the extension [`produce`] writes for `decoy_host`.
pub fn length(decoy_host: &str) -> Result<usize, HelloError> {
    let inner = build_inner_hello(decoy_host, &Randomization::Disabled)?;
    Ok(codec::framed_len(&inner))
}

/// Write the padding extension for `decoy_host` into `buf`, deterministically.
///
/// Fails with [`HelloError::BufferTooSmall`] without writing when `buf` is
/// shorter than [`length`].
pub fn produce(buf: &mut [u8], decoy_host: &str) -> Result<usize, HelloError> {
    SmartPadding::new(decoy_host, &Randomization::Disabled)?.write_into(buf)
}
