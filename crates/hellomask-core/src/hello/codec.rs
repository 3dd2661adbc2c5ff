//! Extension record framing: `type:u16 | length:u16 | payload`.

use super::HelloError;

/// Size of the type and length fields preceding every extension payload.
pub const EXTENSION_HEADER_LEN: usize = 4;

/// A borrowed view of one framed extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawExtension<'a> {
    pub ext_type: u16,
    pub payload: &'a [u8],
}

/// Number of bytes `payload` occupies once framed.
pub fn framed_len(payload: &[u8]) -> usize {
    EXTENSION_HEADER_LEN + payload.len()
}

fn payload_len_u16(payload: &[u8]) -> Result<u16, HelloError> {
    u16::try_from(payload.len()).map_err(|_| {
        HelloError::InvalidSpec(format!(
            "extension payload of {} bytes exceeds the u16 length field",
            payload.len()
        ))
    })
}

/// Frame `payload` as an extension of type `ext_type`.
pub fn encode(ext_type: u16, payload: &[u8]) -> Result<Vec<u8>, HelloError> {
    let len = payload_len_u16(payload)?;
    let mut out = Vec::with_capacity(framed_len(payload));
    out.extend_from_slice(&ext_type.to_be_bytes());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Write the framed extension into `buf` in one shot.
///
/// Returns the number of bytes written, which is always the full framed
/// length. A buffer shorter than that is left untouched.
pub fn write_into(buf: &mut [u8], ext_type: u16, payload: &[u8]) -> Result<usize, HelloError> {
    let len = payload_len_u16(payload)?;
    let needed = framed_len(payload);
    if buf.len() < needed {
        return Err(HelloError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    buf[0..2].copy_from_slice(&ext_type.to_be_bytes());
    buf[2..4].copy_from_slice(&len.to_be_bytes());
    buf[EXTENSION_HEADER_LEN..needed].copy_from_slice(payload);
    Ok(needed)
}

/// Decode the first extension in `buf`, returning it and the remaining bytes.
pub fn decode(buf: &[u8]) -> Result<(RawExtension<'_>, &[u8]), HelloError> {
    if buf.len() < EXTENSION_HEADER_LEN {
        return Err(HelloError::Malformed(format!(
            "need {} header bytes, got {}",
            EXTENSION_HEADER_LEN,
            buf.len()
        )));
    }
    let ext_type = u16::from_be_bytes([buf[0], buf[1]]);
    let len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
    let end = EXTENSION_HEADER_LEN + len;
    if buf.len() < end {
        return Err(HelloError::Malformed(format!(
            "extension 0x{:04x} declares {} payload bytes, {} available",
            ext_type,
            len,
            buf.len() - EXTENSION_HEADER_LEN
        )));
    }
    let ext = RawExtension {
        ext_type,
        payload: &buf[EXTENSION_HEADER_LEN..end],
    };
    Ok((ext, &buf[end..]))
}

/// Decode a whole extensions block (without its own u16 length prefix).
pub fn decode_all(mut buf: &[u8]) -> Result<Vec<RawExtension<'_>>, HelloError> {
    let mut out = Vec::new();
    while !buf.is_empty() {
        let (ext, rest) = decode(buf)?;
        out.push(ext);
        buf = rest;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode(0x0015, &[0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(bytes, vec![0x00, 0x15, 0x00, 0x03, 0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode(0x0023, &[]).unwrap(), vec![0x00, 0x23, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; 0x1_0000];
        assert!(matches!(
            encode(0x0015, &payload),
            Err(HelloError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_write_into_exact_buffer() {
        let mut buf = [0u8; 6];
        let n = write_into(&mut buf, 0xfe0d, &[1, 2]).unwrap();
        assert_eq!(n, 6);
        assert_eq!(buf, [0xfe, 0x0d, 0x00, 0x02, 1, 2]);
    }

    #[test]
    fn test_write_into_larger_buffer_leaves_tail() {
        let mut buf = [0xffu8; 8];
        let n = write_into(&mut buf, 0x0000, &[9]).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf[5..], &[0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_write_into_short_buffer_writes_nothing() {
        let mut buf = [0x77u8; 5];
        let err = write_into(&mut buf, 0x0015, &[1, 2]).unwrap_err();
        assert_eq!(
            err,
            HelloError::BufferTooSmall {
                needed: 6,
                available: 5
            }
        );
        assert_eq!(buf, [0x77; 5]);
    }

    #[test]
    fn test_decode_returns_rest() {
        let data = [0x00, 0x0b, 0x00, 0x02, 0x01, 0x00, 0x00, 0x23, 0x00, 0x00];
        let (ext, rest) = decode(&data).unwrap();
        assert_eq!(ext.ext_type, 0x000b);
        assert_eq!(ext.payload, &[0x01, 0x00]);
        assert_eq!(rest, &[0x00, 0x23, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode(&[0x00, 0x15, 0x00]), Err(HelloError::Malformed(_))));
        assert!(matches!(
            decode(&[0x00, 0x15, 0x00, 0x05, 0x01]),
            Err(HelloError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_all() {
        let mut block = encode(0x000a, &[0x00, 0x02, 0x00, 0x1d]).unwrap();
        block.extend(encode(0x0023, &[]).unwrap());
        let exts = decode_all(&block).unwrap();
        let types: Vec<u16> = exts.iter().map(|e| e.ext_type).collect();
        assert_eq!(types, vec![0x000a, 0x0023]);
    }
}
