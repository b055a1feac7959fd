//! Vanilla-core tile memory map.
//!
//! ```text
//! EVA  0x00000 .. dmem_size        → EPA 0x01000 .. 0x01000 + dmem_size  (DMEM)
//! EPA  0x20000                       freeze CSR
//! EPA  0x20004                       tile-group origin X CSR
//! EPA  0x20008                       tile-group origin Y CSR
//! ```
//!
//! CSRs are reachable only as single words.

use crate::addr::Epa;

/// Bytes per network word.
pub const WORD_SIZE: u32 = 4;

/// First EVA of the DMEM window.
pub const EVA_DMEM_BASE: u32 = 0x0000_0000;

/// First EPA of the DMEM window.
pub const EPA_DMEM_BASE: Epa = 0x0000_1000;

/// Base of the tile CSR block.
pub const EPA_CSR_BASE: Epa = 0x0002_0000;

/// Freeze register. Write 1 to freeze, 0 to unfreeze.
pub const EPA_CSR_FREEZE: Epa = EPA_CSR_BASE;

/// Tile-group origin X register.
pub const EPA_CSR_TILE_GROUP_ORIGIN_X: Epa = EPA_CSR_BASE + 0x4;

/// Tile-group origin Y register.
pub const EPA_CSR_TILE_GROUP_ORIGIN_Y: Epa = EPA_CSR_BASE + 0x8;

/// Every addressable CSR.
pub const CSRS: [Epa; 3] = [
    EPA_CSR_FREEZE,
    EPA_CSR_TILE_GROUP_ORIGIN_X,
    EPA_CSR_TILE_GROUP_ORIGIN_Y,
];

/// Whether `epa` is one of the tile CSRs.
#[must_use]
pub fn is_csr(epa: Epa) -> bool {
    CSRS.contains(&epa)
}

/// Whether `epa` falls inside a DMEM window of `dmem_size` bytes.
#[must_use]
pub fn is_dmem_epa(epa: Epa, dmem_size: u32) -> bool {
    epa >= EPA_DMEM_BASE && u64::from(epa) < u64::from(EPA_DMEM_BASE) + u64::from(dmem_size)
}
