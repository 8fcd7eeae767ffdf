//! Bit-level reads from packed block storage.
//!
//! Values are packed least-significant-bit first and may straddle byte
//! boundaries.

use crate::error::DecodeError;

/// Read `bit_length` (0..=32) bits starting at `bit_offset`.
///
/// Fails with [`DecodeError::Truncated`] if the bits run past the end of `buf`.
pub fn read_bits(buf: &[u8], bit_offset: usize, bit_length: u32) -> Result<u32, DecodeError> {
    debug_assert!(bit_length <= 32);
    if bit_length == 0 {
        return Ok(0);
    }

    let first = bit_offset / 8;
    let last = (bit_offset + bit_length as usize - 1) / 8;
    if last >= buf.len() {
        return Err(DecodeError::Truncated {
            offset: buf.len(),
            needed: last + 1 - buf.len(),
        });
    }
    let shift = bit_offset % 8;

    if bit_length <= 8 {
        let low = u16::from(buf[first]);
        let high = if last > first { u16::from(buf[last]) } else { 0 };
        let value = (low | (high << 8)) >> shift;
        let mask = (1u16 << bit_length) - 1;
        return Ok(u32::from(value & mask));
    }

    // At most 5 bytes: 7 bits of shift plus 32 bits of value.
    let window = buf[first..=last]
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)));
    let mask = (1u64 << bit_length) - 1;
    Ok(((window >> shift) & mask) as u32)
}
