use md5::{Digest, Md5};

use super::consts::extensions as ext;
use super::extensions::{parse_ec_point_formats, parse_supported_groups};
use super::grease::filter_grease_u16;
use super::serialize::legacy_version;
use super::types::HelloSpec;

/// JA3 fingerprint of a ClientHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja3 {
    /// 32-character MD5 hex hash
    pub hash: String,
    /// The raw string before hashing
    pub raw_string: String,
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// JA3 of the hello that `spec` serializes to, as an observer computes it:
/// `version,ciphers,extensions,curves,point_formats` with GREASE removed.
pub fn compute(spec: &HelloSpec) -> Ja3 {
    let curves = spec
        .find(ext::SUPPORTED_GROUPS)
        .and_then(|e| parse_supported_groups(&e.payload))
        .unwrap_or_default();
    let point_formats = spec
        .find(ext::EC_POINT_FORMATS)
        .and_then(|e| parse_ec_point_formats(&e.payload))
        .unwrap_or_default();

    let raw_string = format!(
        "{},{},{},{},{}",
        legacy_version(spec),
        join(&filter_grease_u16(&spec.cipher_suites)),
        join(&filter_grease_u16(&spec.extension_types())),
        join(&filter_grease_u16(&curves)),
        join(&point_formats),
    );
    let hash = format!("{:x}", Md5::digest(raw_string.as_bytes()));

    Ja3 { hash, raw_string }
}
