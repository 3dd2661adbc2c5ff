//! ClientHello serialization: a pure function of a [`HelloSpec`] and a
//! [`HelloNonce`].

use std::collections::HashSet;

use super::consts::{versions, CONTENT_TYPE_HANDSHAKE, HANDSHAKE_CLIENT_HELLO, MAX_RECORD_FRAGMENT};
use super::grease::is_grease_u16;
use super::types::{HelloNonce, HelloSpec};
use super::HelloError;

const MAX_U24: usize = 0x00FF_FFFF;

/// Check the spec for inconsistencies that would make it unserializable or
/// illegal on the wire.
pub fn validate(spec: &HelloSpec) -> Result<(), HelloError> {
    if spec.cipher_suites.is_empty() {
        return Err(HelloError::InvalidSpec("no cipher suites".into()));
    }
    if spec.version_min > spec.version_max {
        return Err(HelloError::InvalidSpec(format!(
            "version_min 0x{:04x} is above version_max 0x{:04x}",
            spec.version_min, spec.version_max
        )));
    }
    if spec.cipher_suites.len() * 2 > u16::MAX as usize {
        return Err(HelloError::InvalidSpec("cipher suite list too long".into()));
    }

    let mut seen = HashSet::new();
    for ext in &spec.extensions {
        if !is_grease_u16(ext.ext_type) && !seen.insert(ext.ext_type) {
            return Err(HelloError::InvalidSpec(format!(
                "duplicate extension 0x{:04x}",
                ext.ext_type
            )));
        }
        if ext.payload.len() > u16::MAX as usize {
            return Err(HelloError::InvalidSpec(format!(
                "extension 0x{:04x} payload is {} bytes",
                ext.ext_type,
                ext.payload.len()
            )));
        }
    }
    Ok(())
}

/// Version written in the legacy_version field: the maximum, capped at TLS 1.2.
pub fn legacy_version(spec: &HelloSpec) -> u16 {
    spec.version_max.min(versions::TLS12)
}

/// Serialize `spec` as a handshake message: type byte, u24 length, body.
pub fn serialize_client_hello(spec: &HelloSpec, nonce: &HelloNonce) -> Result<Vec<u8>, HelloError> {
    validate(spec)?;

    let ext_block_len: usize = spec.extensions.iter().map(|e| e.wire_len()).sum();
    let ext_block_len = u16::try_from(ext_block_len).map_err(|_| {
        HelloError::InvalidSpec(format!("extensions block is {} bytes", ext_block_len))
    })?;

    let mut body = Vec::with_capacity(2 + 32 + 33 + 2 + spec.cipher_suites.len() * 2 + 2 + 2 + ext_block_len as usize);
    body.extend_from_slice(&legacy_version(spec).to_be_bytes());
    body.extend_from_slice(&nonce.random);
    body.push(nonce.session_id.len() as u8);
    body.extend_from_slice(&nonce.session_id);
    body.extend_from_slice(&((spec.cipher_suites.len() * 2) as u16).to_be_bytes());
    for suite in &spec.cipher_suites {
        body.extend_from_slice(&suite.to_be_bytes());
    }
    // compression_methods: null only
    body.extend_from_slice(&[0x01, 0x00]);
    body.extend_from_slice(&ext_block_len.to_be_bytes());
    for ext in &spec.extensions {
        body.extend(ext.encode()?);
    }

    if body.len() > MAX_U24 {
        return Err(HelloError::InvalidSpec(format!("ClientHello body is {} bytes", body.len())));
    }

    let mut msg = Vec::with_capacity(4 + body.len());
    msg.push(HANDSHAKE_CLIENT_HELLO);
    msg.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    msg.extend_from_slice(&body);
    Ok(msg)
}

/// Frame a handshake message into TLS plaintext records of at most 2^14 bytes.
pub fn wrap_records(handshake: &[u8]) -> Vec<u8> {
    let fragments = handshake.len().div_ceil(MAX_RECORD_FRAGMENT).max(1);
    let mut out = Vec::with_capacity(handshake.len() + fragments * 5);
    for chunk in handshake.chunks(MAX_RECORD_FRAGMENT) {
        out.push(CONTENT_TYPE_HANDSHAKE);
        out.extend_from_slice(&versions::TLS10.to_be_bytes());
        out.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
        out.extend_from_slice(chunk);
    }
    out
}
