//! Builders for the typed ClientHello extensions. Each returns an
//! [`Extension`] whose payload is already in wire layout.

use super::consts::{extensions as ext, SNI_HOST_NAME};
use super::types::{Extension, KeyShareEntry};
use super::HelloError;

fn u16_len(what: &str, len: usize) -> Result<u16, HelloError> {
    u16::try_from(len)
        .map_err(|_| HelloError::InvalidSpec(format!("{} too long: {} bytes", what, len)))
}

fn u8_len(what: &str, len: usize) -> Result<u8, HelloError> {
    u8::try_from(len)
        .map_err(|_| HelloError::InvalidSpec(format!("{} too long: {} bytes", what, len)))
}

fn u16_list(values: &[u16]) -> Result<Vec<u8>, HelloError> {
    let mut out = Vec::with_capacity(2 + values.len() * 2);
    out.extend_from_slice(&u16_len("u16 list", values.len() * 2)?.to_be_bytes());
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
    Ok(out)
}

/// server_name (RFC 6066): a list holding one host_name entry.
///
/// The name is written as given; an empty name yields a legal zero-length entry.
pub fn server_name(name: &str) -> Result<Extension, HelloError> {
    let name = name.as_bytes();
    let name_len = u16_len("server name", name.len())?;
    let list_len = u16_len("server name list", name.len() + 3)?;
    // The whole extension payload must also fit its own u16 length.
    u16_len("server_name extension", name.len() + 5)?;

    let mut payload = Vec::with_capacity(name.len() + 5);
    payload.extend_from_slice(&list_len.to_be_bytes());
    payload.push(SNI_HOST_NAME);
    payload.extend_from_slice(&name_len.to_be_bytes());
    payload.extend_from_slice(name);
    Ok(Extension::new(ext::SERVER_NAME, payload))
}

pub fn supported_groups(groups: &[u16]) -> Result<Extension, HelloError> {
    Ok(Extension::new(ext::SUPPORTED_GROUPS, u16_list(groups)?))
}

pub fn ec_point_formats(formats: &[u8]) -> Result<Extension, HelloError> {
    let mut payload = Vec::with_capacity(1 + formats.len());
    payload.push(u8_len("point format list", formats.len())?);
    payload.extend_from_slice(formats);
    Ok(Extension::new(ext::EC_POINT_FORMATS, payload))
}

/// Empty session_ticket extension: advertises ticket support, carries no ticket.
pub fn session_ticket() -> Extension {
    Extension::new(ext::SESSION_TICKET, Vec::new())
}

pub fn alpn<S: AsRef<str>>(protocols: &[S]) -> Result<Extension, HelloError> {
    if protocols.is_empty() {
        return Err(HelloError::InvalidSpec("ALPN list is empty".into()));
    }
    let mut list = Vec::new();
    for proto in protocols {
        let proto = proto.as_ref().as_bytes();
        if proto.is_empty() {
            return Err(HelloError::InvalidSpec("empty ALPN protocol name".into()));
        }
        list.push(u8_len("ALPN protocol name", proto.len())?);
        list.extend_from_slice(proto);
    }
    let mut payload = Vec::with_capacity(2 + list.len());
    payload.extend_from_slice(&u16_len("ALPN list", list.len())?.to_be_bytes());
    payload.extend_from_slice(&list);
    Ok(Extension::new(ext::ALPN, payload))
}

pub fn signature_algorithms(schemes: &[u16]) -> Result<Extension, HelloError> {
    Ok(Extension::new(ext::SIGNATURE_ALGORITHMS, u16_list(schemes)?))
}

pub fn key_share(entries: &[KeyShareEntry]) -> Result<Extension, HelloError> {
    let mut shares = Vec::new();
    for entry in entries {
        shares.extend_from_slice(&entry.group.to_be_bytes());
        shares.extend_from_slice(&u16_len("key share", entry.key_exchange.len())?.to_be_bytes());
        shares.extend_from_slice(&entry.key_exchange);
    }
    let mut payload = Vec::with_capacity(2 + shares.len());
    payload.extend_from_slice(&u16_len("key share list", shares.len())?.to_be_bytes());
    payload.extend_from_slice(&shares);
    Ok(Extension::new(ext::KEY_SHARE, payload))
}

pub fn psk_key_exchange_modes(modes: &[u8]) -> Result<Extension, HelloError> {
    let mut payload = Vec::with_capacity(1 + modes.len());
    payload.push(u8_len("PSK mode list", modes.len())?);
    payload.extend_from_slice(modes);
    Ok(Extension::new(ext::PSK_KEY_EXCHANGE_MODES, payload))
}

/// Parse the group list out of a supported_groups payload.
pub fn parse_supported_groups(payload: &[u8]) -> Option<Vec<u16>> {
    let (len, rest) = payload.split_first_chunk::<2>()?;
    let len = u16::from_be_bytes(*len) as usize;
    if rest.len() != len || len % 2 != 0 {
        return None;
    }
    Some(
        rest.chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect(),
    )
}

/// Parse the format list out of an ec_point_formats payload.
pub fn parse_ec_point_formats(payload: &[u8]) -> Option<Vec<u8>> {
    let (&len, rest) = payload.split_first()?;
    (rest.len() == len as usize).then(|| rest.to_vec())
}

/// Host name carried by a server_name payload, if it has a host_name entry.
pub fn parse_server_name(payload: &[u8]) -> Option<String> {
    if payload.len() < 5 || payload[2] != SNI_HOST_NAME {
        return None;
    }
    let len = u16::from_be_bytes([payload[3], payload[4]]) as usize;
    let name = payload.get(5..5 + len)?;
    std::str::from_utf8(name).ok().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello::consts::groups::X25519;

    #[test]
    fn test_server_name_layout() {
        let ext = server_name("ab.c").unwrap();
        assert_eq!(ext.ext_type, 0x0000);
        assert_eq!(ext.payload, vec![0x00, 0x07, 0x00, 0x00, 0x04, b'a', b'b', b'.', b'c']);
        assert_eq!(parse_server_name(&ext.payload).as_deref(), Some("ab.c"));
    }

    #[test]
    fn test_server_name_empty() {
        let ext = server_name("").unwrap();
        assert_eq!(ext.payload, vec![0x00, 0x03, 0x00, 0x00, 0x00]);
        assert_eq!(parse_server_name(&ext.payload).as_deref(), Some(""));
    }

    #[test]
    fn test_server_name_too_long() {
        let name = "a".repeat(0xFFFF);
        assert!(matches!(server_name(&name), Err(HelloError::InvalidSpec(_))));
    }

    #[test]
    fn test_alpn_layout() {
        let ext = alpn(&["h2", "http/1.1"]).unwrap();
        let mut expected = vec![0x00, 0x0c, 0x02, b'h', b'2', 0x08];
        expected.extend_from_slice(b"http/1.1");
        assert_eq!(ext.payload, expected);
    }

    #[test]
    fn test_alpn_rejects_empty_entries() {
        let none: [&str; 0] = [];
        assert!(alpn(&none).is_err());
        assert!(alpn(&["h2", ""]).is_err());
        assert!(alpn(&["x".repeat(256)]).is_err());
    }

    #[test]
    fn test_key_share_layout() {
        let ext = key_share(&[
            KeyShareEntry { group: 0x0a0a, key_exchange: vec![0] },
            KeyShareEntry { group: X25519, key_exchange: vec![0xab; 2] },
        ])
        .unwrap();
        assert_eq!(
            ext.payload,
            vec![0x00, 0x0b, 0x0a, 0x0a, 0x00, 0x01, 0x00, 0x00, 0x1d, 0x00, 0x02, 0xab, 0xab]
        );
    }

    #[test]
    fn test_small_lists() {
        assert_eq!(ec_point_formats(&[0]).unwrap().payload, vec![0x01, 0x00]);
        assert_eq!(psk_key_exchange_modes(&[1]).unwrap().payload, vec![0x01, 0x01]);
        assert!(session_ticket().payload.is_empty());
    }

    #[test]
    fn test_group_and_format_parsers() {
        let groups = supported_groups(&[0x001d, 0x0017]).unwrap();
        assert_eq!(parse_supported_groups(&groups.payload), Some(vec![0x001d, 0x0017]));
        assert_eq!(parse_supported_groups(&[0x00, 0x03, 0, 0, 0]), None);
        assert_eq!(parse_ec_point_formats(&[0x01, 0x00]), Some(vec![0]));
        assert_eq!(parse_ec_point_formats(&[0x02, 0x00]), None);
    }
}
