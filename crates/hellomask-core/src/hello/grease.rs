use rand::Rng;

/// The sixteen GREASE values reserved by RFC 8701.
pub const GREASE_VALUES: [u16; 16] = [
    0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a,
    0x8a8a, 0x9a9a, 0xaaaa, 0xbaba, 0xcaca, 0xdada, 0xeaea, 0xfafa,
];

/// Check if a u16 value is a GREASE value (RFC 8701).
///
/// GREASE values follow the pattern 0x?A?A where both bytes are identical.
pub fn is_grease_u16(val: u16) -> bool {
    let hi = (val >> 8) as u8;
    let lo = val as u8;
    hi == lo && (hi & 0x0F) == 0x0A
}

/// Filter GREASE values from a slice of u16 values.
pub fn filter_grease_u16(values: &[u16]) -> Vec<u16> {
    values.iter().copied().filter(|v| !is_grease_u16(*v)).collect()
}

/// Pick one GREASE value uniformly from the reserved set.
pub fn random_grease<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    GREASE_VALUES[rng.gen_range(0..GREASE_VALUES.len())]
}
