//! Fixed-width bit vector codec for sync codes.
//!
//! Bit index 0 is the least significant bit. Boolean parameter lists are
//! ordered the same way: the first parameter carries bit 0.

/// Upper bound on the bit width of any code.
pub const MAX_BITS: usize = 31;

/// Bit count at which a single int parameter is the better choice.
pub const INT_SUGGESTION_THRESHOLD: usize = 8;

/// Smallest `k` with `2^k >= count`, clamped to [`MAX_BITS`].
///
/// Returns 0 for `count <= 1`: a single state needs no bits.
pub fn minimal_bits(count: usize) -> usize {
    if count <= 1 {
        return 0;
    }
    let mut bits = 0;
    let mut capacity: u64 = 1;
    while capacity < count as u64 && bits < MAX_BITS {
        bits += 1;
        capacity <<= 1;
    }
    bits
}

/// Number of bits needed to represent `value` itself.
pub fn bits_for_value(value: u32) -> usize {
    (u32::BITS - value.leading_zeros()) as usize
}

/// Whether `value` fits in `bit_count` bits.
pub fn is_representable(value: u32, bit_count: usize) -> bool {
    bits_for_value(value) <= bit_count
}

/// Whether an int parameter should be suggested over `bit_count` booleans.
pub fn should_suggest_int(bit_count: usize) -> bool {
    bit_count >= INT_SUGGESTION_THRESHOLD
}

/// Encode `value` into `bit_count` bits, least significant first.
///
/// Negative values clamp to 0. Bits beyond 31 are always `false`.
pub fn encode(value: i32, bit_count: usize) -> Vec<bool> {
    let value = value.max(0) as u32;
    (0..bit_count)
        .map(|i| i < u32::BITS as usize && (value >> i) & 1 == 1)
        .collect()
}

/// Decode a least-significant-first bit vector back into a value.
///
/// Bits at index 31 and above are ignored.
pub fn decode(bits: &[bool]) -> i32 {
    bits.iter()
        .take(MAX_BITS)
        .enumerate()
        .filter(|(_, bit)| **bit)
        .fold(0i32, |acc, (i, _)| acc | (1 << i))
}
