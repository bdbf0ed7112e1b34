use crate::dispatch::{ElementKind, Mode};

/// Edge length of the codec's blocks along every axis.
pub const BLOCK_EDGE: usize = 4;

/// Size of a bitstream word in bytes.
pub(crate) const WORD_BYTES: usize = size_of::<u64>();

/// Finds the smallest multiple of `factor` that is greater than or equal to `value`.
pub(crate) fn round_up(value: usize, factor: usize) -> usize {
    value.div_ceil(factor) * factor
}

/// Number of 64-bit words needed to hold `bytes` bytes.
pub(crate) fn word_len(bytes: usize) -> usize {
    bytes.div_ceil(WORD_BYTES)
}

/// Element count once every extent is padded to a whole number of blocks.
pub fn padded_element_count(extents: &[usize]) -> usize {
    extents.iter().map(|&n| round_up(n, BLOCK_EDGE)).product()
}

/// Upper bound on the compressed size of an array, before the codec's own
/// worst case is taken into account.
///
/// `ceil(padded_count * max_bits_per_value / 8) + header_bytes`
#[expect(
    clippy::cast_precision_loss,
    reason = "element counts stay far below 2^52"
)]
pub fn size_bound(extents: &[usize], kind: ElementKind, mode: &Mode, header_bytes: usize) -> usize {
    let bits = padded_element_count(extents) as f64 * mode.max_bits_per_value(kind);
    (bits / 8.0).ceil() as usize + header_bytes
}
