//! EVA bit layout.
//!
//! These positions must match the hardware's EVA-to-NPA decoder bit for bit.
//!
//! ```text
//! bit    31   30       29      28..24  23..18  17..0
//! LOCAL   0    0        0        0       0     EPA
//! GROUP   0    0        1      Y(5)    X(6)    EPA
//!
//! bit    31   30     29..23   22..16   15..0
//! GLOBAL  0    1      Y(7)     X(7)     EPA
//!
//! bit    31   30..0
//! DRAM    1   EPA_top | index | stripe offset   (policy-defined, see driver)
//! ```
//!
//! A region is chosen by testing DRAM, then global, then group. When several
//! select bits are set the first test wins; valid EVAs never do this.

use crate::bits::make_mask;

/// Width of the EPA field of local and group EVAs.
pub const EPA_LOGSZ: u32 = 18;

/// Width of the EPA field of global EVAs.
pub const GLOBAL_EPA_LOGSZ: u32 = 16;

/// Mask of the local/group EPA field.
pub const EPA_MASK: u32 = make_mask(EPA_LOGSZ);

/// Mask of the global EPA field.
pub const GLOBAL_EPA_MASK: u32 = make_mask(GLOBAL_EPA_LOGSZ);

/// Tile-group relative EVAs.
pub mod group {
    use super::{make_mask, EPA_LOGSZ};

    /// Width of the X field.
    pub const X_LOGSZ: u32 = 6;
    /// Position of the X field.
    pub const X_BITIDX: u32 = EPA_LOGSZ;
    /// X field mask (in place).
    pub const X_BITMASK: u32 = make_mask(X_LOGSZ) << X_BITIDX;

    /// Width of the Y field.
    pub const Y_LOGSZ: u32 = 5;
    /// Position of the Y field.
    pub const Y_BITIDX: u32 = X_BITIDX + X_LOGSZ;
    /// Y field mask (in place).
    pub const Y_BITMASK: u32 = make_mask(Y_LOGSZ) << Y_BITIDX;

    /// Group-select bit.
    pub const BITIDX: u32 = Y_BITIDX + Y_LOGSZ;
    /// Group-select mask.
    pub const BITMASK: u32 = 1 << BITIDX;
}

/// Mesh-absolute tile EVAs.
pub mod global {
    use super::{make_mask, GLOBAL_EPA_LOGSZ};

    /// Width of the X field.
    pub const X_LOGSZ: u32 = 7;
    /// Position of the X field.
    pub const X_BITIDX: u32 = GLOBAL_EPA_LOGSZ;
    /// X field mask (in place).
    pub const X_BITMASK: u32 = make_mask(X_LOGSZ) << X_BITIDX;

    /// Width of the Y field.
    pub const Y_LOGSZ: u32 = 7;
    /// Position of the Y field.
    pub const Y_BITIDX: u32 = X_BITIDX + X_LOGSZ;
    /// Y field mask (in place).
    pub const Y_BITMASK: u32 = make_mask(Y_LOGSZ) << Y_BITIDX;

    /// Global-select bit.
    pub const BITIDX: u32 = Y_BITIDX + Y_LOGSZ;
    /// Global-select mask.
    pub const BITMASK: u32 = 1 << BITIDX;
}

/// DRAM EVAs.
pub mod dram {
    use super::make_mask;

    /// DRAM-select bit.
    pub const BITIDX: u32 = 31;
    /// DRAM-select mask.
    pub const BITMASK: u32 = 1 << BITIDX;
    /// Everything below the DRAM-select bit.
    pub const BODY_MASK: u32 = make_mask(BITIDX);
}
