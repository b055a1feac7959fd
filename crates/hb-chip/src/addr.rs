//! Address value types.
//!
//! ```text
//! EVA  Endpoint Virtual Address   32-bit, tile-relative, what kernels use
//! NPA  Network Physical Address   (x, y, EPA), what the mesh routes on
//! EPA  Endpoint Physical Address  offset inside one endpoint's memory map
//! ```

use crate::coord::Coordinate;
use std::fmt;

/// Endpoint Physical Address: byte offset inside a tile or DRAM bank.
pub type Epa = u32;

/// Endpoint Virtual Address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eva(pub u32);

impl Eva {
    /// Wrap a raw 32-bit address.
    #[must_use]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Raw address bits.
    #[must_use]
    pub const fn addr(self) -> u32 {
        self.0
    }

    /// Address `bytes` further on, wrapping at 2^32 like the hardware.
    #[must_use]
    pub const fn advance(self, bytes: u32) -> Self {
        Self(self.0.wrapping_add(bytes))
    }
}

impl From<u32> for Eva {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl fmt::Display for Eva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for Eva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Network Physical Address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Npa {
    /// Destination column.
    pub x: u32,
    /// Destination row.
    pub y: u32,
    /// Offset inside the destination endpoint.
    pub epa: Epa,
}

impl Npa {
    /// Build an NPA from its parts.
    #[must_use]
    pub const fn new(x: u32, y: u32, epa: Epa) -> Self {
        Self { x, y, epa }
    }

    /// NPA for `epa` at endpoint `xy`.
    #[must_use]
    pub const fn from_coordinate(xy: Coordinate, epa: Epa) -> Self {
        Self {
            x: xy.x,
            y: xy.y,
            epa,
        }
    }

    /// Endpoint coordinate.
    #[must_use]
    pub const fn xy(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
}

impl fmt::Display for Npa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{x: {} y: {}, EPA: 0x{:08x}}}", self.x, self.y, self.epa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eva_advance_wraps() {
        assert_eq!(Eva::new(0xffff_fffc).advance(8), Eva::new(4));
        assert_eq!(Eva::new(0x100).advance(0x20).addr(), 0x120);
    }

    #[test]
    fn formatting() {
        assert_eq!(Eva::new(0x8000_0020).to_string(), "0x80000020");
        assert_eq!(format!("{:x}", Eva::new(0xbeef)), "beef");
        assert_eq!(
            Npa::new(16, 7, 0x40).to_string(),
            "{x: 16 y: 7, EPA: 0x00000040}"
        );
    }

    #[test]
    fn npa_coordinate_roundtrip() {
        let xy = Coordinate::new(3, 9);
        assert_eq!(Npa::from_coordinate(xy, 12).xy(), xy);
    }
}
