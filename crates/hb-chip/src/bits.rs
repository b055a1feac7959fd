//! Fixed-width bit helpers.
//!
//! Every helper takes its field width explicitly and is total: a width of 0
//! yields an empty field, widths of 32 or more saturate to the whole word.

/// Mask covering the low `width` bits.
#[must_use]
pub const fn make_mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Rotate the low `width` bits of `value` left by `shift`.
///
/// Bits of `value` above `width` are discarded.
#[must_use]
pub const fn rotate_left(width: u32, shift: u32, value: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let width = if width > u32::BITS { u32::BITS } else { width };
    let mask = make_mask(width);
    let value = value & mask;
    let shift = shift % width;
    if shift == 0 {
        return value;
    }
    ((value << shift) & mask) | (value >> (width - shift))
}

/// Rotate the low `width` bits of `value` right by `shift`.
///
/// Inverse of [`rotate_left`] for the same `width` and `shift`.
#[must_use]
pub const fn rotate_right(width: u32, shift: u32, value: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let width = if width > u32::BITS { u32::BITS } else { width };
    let mask = make_mask(width);
    let value = value & mask;
    let shift = shift % width;
    if shift == 0 {
        return value;
    }
    ((value << (width - shift)) & mask) | (value >> shift)
}

/// `ceil(log2(n))`, with `clog2(0) == clog2(1) == 0`.
#[must_use]
pub const fn clog2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        u64::BITS - (n - 1).leading_zeros()
    }
}
