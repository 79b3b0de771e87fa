/// FNV-1a 32-bit offset basis.
const FNV_SEED: u32 = 0x811c_9dc5;

/// 32-bit FNV-1a over the string's code points.
///
/// The multiply by the FNV prime (16777619) is spelled out as shift-adds so
/// the output stays bit-compatible with the widely deployed script form of
/// this hash, which cannot use a real 32-bit multiply.
pub fn fnv32a(input: &str) -> u32 {
    let mut hash = FNV_SEED;
    for ch in input.chars() {
        hash ^= ch as u32;
        hash = hash
            .wrapping_add(hash << 1)
            .wrapping_add(hash << 4)
            .wrapping_add(hash << 7)
            .wrapping_add(hash << 8)
            .wrapping_add(hash << 24);
    }
    hash
}

/// Lowercase base-36 rendering of a hash value.
pub fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out.iter().rev().collect()
}
