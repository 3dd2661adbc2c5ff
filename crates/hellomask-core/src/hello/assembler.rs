//! Outer ClientHello assembly.
//!
//! The outer hello mimics a fixed client fingerprint. Its extension order is
//! fixed: supported_groups, ec_point_formats, session_ticket, ALPN,
//! signature_algorithms, key_share, psk_key_exchange_modes, the decoy padding,
//! and finally the real server_name.

use std::net::IpAddr;

use rand::{thread_rng, RngCore};
use tracing::debug;

use super::consts::{
    cipher_suites as cs, groups, signature_schemes as sig, versions, EC_POINT_FORMAT_UNCOMPRESSED,
    GREASE_PLACEHOLDER, PSK_MODE_DHE_KE, X25519_SHARE_LEN,
};
use super::engine::HandshakeEngine;
use super::extensions;
use super::grease::random_grease;
use super::synthetic::SmartPadding;
use super::types::{HelloSpec, KeyShareEntry};
use super::HelloError;
use crate::config::MaskConfig;

/// Suite order of the mimicked client. Index 0 is replaced by a GREASE value.
pub const OUTER_CIPHER_SUITES: [u16; 9] = [
    GREASE_PLACEHOLDER,
    cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    cs::TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
    cs::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    cs::TLS_AES_128_GCM_SHA256,
    cs::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
    cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    cs::TLS_RSA_WITH_AES_256_CBC_SHA,
];

pub const OUTER_GROUPS: [u16; 2] = [groups::X25519, groups::SECP256R1];

pub const OUTER_SIGNATURE_SCHEMES: [u16; 11] = [
    sig::ECDSA_SECP256R1_SHA256,
    sig::ECDSA_SECP384R1_SHA384,
    sig::ECDSA_SECP521R1_SHA512,
    sig::RSA_PSS_RSAE_SHA256,
    sig::RSA_PSS_RSAE_SHA384,
    sig::RSA_PSS_RSAE_SHA512,
    sig::RSA_PKCS1_SHA256,
    sig::RSA_PKCS1_SHA384,
    sig::RSA_PKCS1_SHA512,
    sig::ECDSA_SHA1,
    sig::RSA_PKCS1_SHA1,
];

/// Reject host names that cannot go into a real server_name extension.
pub fn validate_real_host(host: &str) -> Result<(), HelloError> {
    let reason = if host.is_empty() {
        Some("is empty")
    } else if host.len() > 253 {
        Some("is longer than 253 bytes")
    } else if !host.bytes().all(|b| b.is_ascii_graphic()) {
        Some("contains non-ASCII, whitespace or control characters")
    } else if host.ends_with('.') {
        Some("ends with a dot")
    } else if host.parse::<IpAddr>().is_ok() {
        Some("is an IP literal")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(HelloError::InvalidSpec(format!(
            "real host name {:?} {}",
            host, reason
        ))),
        None => Ok(()),
    }
}

/// Builds the outer [`HelloSpec`] for one connection.
#[derive(Debug, Clone, Default)]
pub struct HelloAssembler {
    config: MaskConfig,
}

impl HelloAssembler {
    pub fn new(config: MaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Assemble the outer spec: `real_host` in the last extension, the decoy
    /// hello for `decoy_host` in the padding extension right before it.
    ///
    /// A fresh decoy is built on every call.
    pub fn build_spec(&self, real_host: &str, decoy_host: &str) -> Result<HelloSpec, HelloError> {
        validate_real_host(real_host)?;

        let mut rng = thread_rng();
        let grease = random_grease(&mut rng);
        let mut cipher_suites = OUTER_CIPHER_SUITES.to_vec();
        cipher_suites[0] = grease;

        // Placeholder X25519 share. The engine that owns the key exchange
        // swaps in its own public key.
        let mut x25519_share = vec![0u8; X25519_SHARE_LEN];
        rng.fill_bytes(&mut x25519_share);
        let grease_group = random_grease(&mut rng);

        let mut exts = vec![
            extensions::supported_groups(&OUTER_GROUPS)?,
            extensions::ec_point_formats(&[EC_POINT_FORMAT_UNCOMPRESSED])?,
            extensions::session_ticket(),
            extensions::alpn(&self.config.alpn_protocols)?,
            extensions::signature_algorithms(&OUTER_SIGNATURE_SCHEMES)?,
            extensions::key_share(&[
                KeyShareEntry {
                    group: grease_group,
                    key_exchange: vec![0],
                },
                KeyShareEntry {
                    group: groups::X25519,
                    key_exchange: x25519_share,
                },
            ])?,
            extensions::psk_key_exchange_modes(&[PSK_MODE_DHE_KE])?,
        ];
        if self.config.smart_padding {
            exts.push(SmartPadding::new(decoy_host, &self.config.randomization)?.into());
        }
        exts.push(extensions::server_name(real_host)?);

        debug!(
            extensions = exts.len(),
            smart_padding = self.config.smart_padding,
            "outer hello spec assembled"
        );

        Ok(HelloSpec {
            version_min: versions::TLS10,
            version_max: versions::TLS13,
            cipher_suites,
            extensions: exts,
        })
    }

    /// Assemble the spec and hand it to `engine`.
    ///
    /// Nothing reaches the engine if assembly fails. Engine rejections come
    /// back as [`HelloError::InvalidSpec`].
    pub fn apply<E: HandshakeEngine + ?Sized>(
        &self,
        engine: &mut E,
        real_host: &str,
        decoy_host: &str,
    ) -> Result<(), HelloError> {
        let spec = self.build_spec(real_host, decoy_host)?;
        engine.apply_spec(spec).map_err(|e| match e {
            HelloError::InvalidSpec(_) => e,
            other => HelloError::InvalidSpec(other.to_string()),
        })
    }
}
