//! Observer-side decoding of ClientHello bytes, including any ClientHello
//! smuggled inside the padding extension.

use serde::Serialize;
use tls_parser::nom::Err as NomErr;
use tls_parser::{
    parse_tls_extensions, parse_tls_message_handshake, TlsExtension, TlsMessage,
    TlsMessageHandshake,
};

use super::codec;
use super::consts::{extensions as ext, CONTENT_TYPE_HANDSHAKE, HANDSHAKE_CLIENT_HELLO, MAX_RECORD_FRAGMENT};

/// Padding payloads are followed at most this many levels deep.
const MAX_NESTING: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("not enough data: need at least {0} bytes")]
    NotEnoughData(usize),
    #[error("not a TLS handshake record")]
    NotHandshake,
    #[error("record fragment of {0} bytes exceeds 2^14")]
    RecordTooLarge(usize),
    #[error("not a ClientHello message")]
    NotClientHello,
    #[error("TLS parse error: {0}")]
    TlsParseError(String),
}

/// What a passive observer can read from a ClientHello.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientHelloInfo {
    /// legacy_version field (e.g. 0x0303)
    pub tls_version: u16,
    /// Cipher suite values in wire order, GREASE included
    pub cipher_suites: Vec<u16>,
    /// Extension type codes in wire order
    pub extensions: Vec<u16>,
    pub elliptic_curves: Vec<u16>,
    pub ec_point_formats: Vec<u8>,
    pub signature_algorithms: Vec<u16>,
    pub server_name: Option<String>,
    pub alpn_protocols: Vec<String>,
    pub psk_modes: Vec<u8>,
    /// Size of the padding extension payload, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_len: Option<usize>,
    /// ClientHello found inside the padding extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smuggled: Option<Box<ClientHelloInfo>>,
}

/// Reassemble the handshake message carried by one or more TLS records.
pub fn reassemble_records(raw: &[u8]) -> Result<Vec<u8>, ParseError> {
    let mut handshake = Vec::new();
    let mut rest = raw;
    loop {
        if rest.len() < 5 {
            return Err(ParseError::NotEnoughData(raw.len() - rest.len() + 5));
        }
        if rest[0] != CONTENT_TYPE_HANDSHAKE {
            return Err(ParseError::NotHandshake);
        }
        let len = u16::from_be_bytes([rest[3], rest[4]]) as usize;
        if len > MAX_RECORD_FRAGMENT {
            return Err(ParseError::RecordTooLarge(len));
        }
        if rest.len() < 5 + len {
            return Err(ParseError::NotEnoughData(raw.len() - rest.len() + 5 + len));
        }
        handshake.extend_from_slice(&rest[5..5 + len]);
        rest = &rest[5 + len..];

        if handshake_complete(&handshake) {
            return Ok(handshake);
        }
    }
}

/// Total size (header included) of the handshake message starting at
/// `handshake`, once its 4-byte header is available.
pub fn handshake_message_len(handshake: &[u8]) -> Option<usize> {
    let header = handshake.get(..4)?;
    Some(4 + u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize)
}

/// Whether `handshake` already holds a whole handshake message.
pub fn handshake_complete(handshake: &[u8]) -> bool {
    handshake_message_len(handshake).is_some_and(|len| handshake.len() >= len)
}

/// Parse TLS records (starting at the record header) into a `ClientHelloInfo`.
pub fn parse_client_hello(raw: &[u8]) -> Result<ClientHelloInfo, ParseError> {
    let handshake = reassemble_records(raw)?;
    parse_handshake(&handshake)
}

/// Parse a bare handshake message (type byte, u24 length, body).
pub fn parse_handshake(raw: &[u8]) -> Result<ClientHelloInfo, ParseError> {
    parse_nested(raw, 0)
}

fn parse_nested(raw: &[u8], depth: usize) -> Result<ClientHelloInfo, ParseError> {
    if raw.len() < 4 {
        return Err(ParseError::NotEnoughData(4));
    }
    if raw[0] != HANDSHAKE_CLIENT_HELLO {
        return Err(ParseError::NotClientHello);
    }

    let (_, msg) = parse_tls_message_handshake(raw).map_err(|e| match e {
        NomErr::Incomplete(needed) => {
            let n = match needed {
                tls_parser::nom::Needed::Size(s) => s.get(),
                tls_parser::nom::Needed::Unknown => 0,
            };
            ParseError::NotEnoughData(raw.len() + n)
        }
        _ => ParseError::TlsParseError(format!("{}", e)),
    })?;

    let ch = match msg {
        TlsMessage::Handshake(TlsMessageHandshake::ClientHello(ch)) => ch,
        _ => return Err(ParseError::NotClientHello),
    };

    let mut info = ClientHelloInfo {
        tls_version: ch.version.0,
        cipher_suites: ch.ciphers.iter().map(|c| c.0).collect(),
        ..ClientHelloInfo::default()
    };

    let Some(ext_data) = ch.ext else {
        return Ok(info);
    };

    // Raw walk keeps every type code, GREASE and unknown ones included.
    let raw_exts = codec::decode_all(ext_data)
        .map_err(|e| ParseError::TlsParseError(e.to_string()))?;
    for raw_ext in &raw_exts {
        info.extensions.push(raw_ext.ext_type);
        if raw_ext.ext_type == ext::PADDING {
            info.padding_len = Some(raw_ext.payload.len());
            if depth < MAX_NESTING && raw_ext.payload.first() == Some(&HANDSHAKE_CLIENT_HELLO) {
                info.smuggled = parse_nested(raw_ext.payload, depth + 1).ok().map(Box::new);
            }
        }
    }

    if let Ok((_, parsed)) = parse_tls_extensions(ext_data) {
        for extension in &parsed {
            match extension {
                TlsExtension::SNI(sni_list) => {
                    for (_, name_bytes) in sni_list {
                        if let Ok(name) = std::str::from_utf8(name_bytes) {
                            info.server_name = Some(name.to_string());
                        }
                    }
                }
                TlsExtension::EllipticCurves(curves) => {
                    info.elliptic_curves = curves.iter().map(|c| c.0).collect();
                }
                TlsExtension::EcPointFormats(formats) => {
                    info.ec_point_formats = formats.to_vec();
                }
                TlsExtension::SignatureAlgorithms(algs) => {
                    info.signature_algorithms = algs.to_vec();
                }
                TlsExtension::ALPN(protocols) => {
                    info.alpn_protocols = protocols
                        .iter()
                        .filter_map(|p| std::str::from_utf8(p).ok())
                        .map(|s| s.to_string())
                        .collect();
                }
                TlsExtension::PskExchangeModes(modes) => {
                    info.psk_modes = modes.to_vec();
                }
                _ => {}
            }
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello::consts::versions;
    use crate::hello::extensions;
    use crate::hello::serialize::{serialize_client_hello, wrap_records};
    use crate::hello::types::{Extension, HelloNonce, HelloSpec};

    fn hello(exts: Vec<Extension>) -> Vec<u8> {
        let spec = HelloSpec {
            version_min: versions::TLS10,
            version_max: versions::TLS13,
            cipher_suites: vec![0x1a1a, 0x1301, 0xc02b],
            extensions: exts,
        };
        serialize_client_hello(&spec, &HelloNonce::derived("t")).unwrap()
    }

    #[test]
    fn test_parse_record() {
        let msg = hello(vec![
            extensions::supported_groups(&[0x001d]).unwrap(),
            extensions::alpn(&["h2"]).unwrap(),
            extensions::psk_key_exchange_modes(&[1]).unwrap(),
            extensions::server_name("example.com").unwrap(),
        ]);
        let info = parse_client_hello(&wrap_records(&msg)).unwrap();
        assert_eq!(info.tls_version, 0x0303);
        assert_eq!(info.cipher_suites, vec![0x1a1a, 0x1301, 0xc02b]);
        assert_eq!(info.extensions, vec![0x000a, 0x0010, 0x002d, 0x0000]);
        assert_eq!(info.elliptic_curves, vec![0x001d]);
        assert_eq!(info.alpn_protocols, vec!["h2".to_string()]);
        assert_eq!(info.psk_modes, vec![1]);
        assert_eq!(info.server_name.as_deref(), Some("example.com"));
        assert!(info.padding_len.is_none());
    }

    #[test]
    fn test_zero_padding_is_not_smuggled() {
        let msg = hello(vec![Extension::new(ext::PADDING, vec![0; 32])]);
        let info = parse_handshake(&msg).unwrap();
        assert_eq!(info.padding_len, Some(32));
        assert!(info.smuggled.is_none());
    }

    #[test]
    fn test_smuggled_hello() {
        let inner = hello(vec![extensions::server_name("hidden.example").unwrap()]);
        let outer = hello(vec![
            Extension::new(ext::PADDING, inner.clone()),
            extensions::server_name("visible.example").unwrap(),
        ]);
        let info = parse_handshake(&outer).unwrap();
        assert_eq!(info.server_name.as_deref(), Some("visible.example"));
        assert_eq!(info.padding_len, Some(inner.len()));
        let smuggled = info.smuggled.unwrap();
        assert_eq!(smuggled.server_name.as_deref(), Some("hidden.example"));
    }

    #[test]
    fn test_fragmented_records() {
        let msg = hello(vec![Extension::new(0xfe0d, vec![7; 20_000])]);
        let records = wrap_records(&msg);
        assert!(records.len() > MAX_RECORD_FRAGMENT + 5);
        let info = parse_client_hello(&records).unwrap();
        assert_eq!(info.extensions, vec![0xfe0d]);
    }

    #[test]
    fn test_handshake_length_helpers() {
        assert_eq!(handshake_message_len(&[0x01, 0x00]), None);
        assert_eq!(handshake_message_len(&[0x01, 0x00, 0x01, 0x02]), Some(4 + 0x0102));
        assert!(handshake_complete(&[0x01, 0x00, 0x00, 0x00]));
        assert!(!handshake_complete(&[0x01, 0x00, 0x00, 0x02, 0xaa]));
        assert!(!handshake_complete(&[0x01]));
    }

    #[test]
    fn test_tiny_first_record() {
        let msg = hello(vec![extensions::server_name("split.example").unwrap()]);
        let mut records = wrap_records(&msg[..2]);
        records.extend(wrap_records(&msg[2..]));
        let info = parse_client_hello(&records).unwrap();
        assert_eq!(info.server_name.as_deref(), Some("split.example"));
    }

    #[test]
    fn test_truncated_record() {
        let records = wrap_records(&hello(vec![]));
        assert!(matches!(
            parse_client_hello(&records[..records.len() - 1]),
            Err(ParseError::NotEnoughData(_))
        ));
        assert!(matches!(parse_client_hello(&records[..3]), Err(ParseError::NotEnoughData(5))));
    }

    #[test]
    fn test_not_handshake() {
        assert!(matches!(
            parse_client_hello(&[0x17, 0x03, 0x03, 0x00, 0x00]),
            Err(ParseError::NotHandshake)
        ));
    }

    #[test]
    fn test_not_client_hello() {
        // ServerHelloDone
        assert!(matches!(
            parse_handshake(&[0x0e, 0x00, 0x00, 0x00]),
            Err(ParseError::NotClientHello)
        ));
    }
}
