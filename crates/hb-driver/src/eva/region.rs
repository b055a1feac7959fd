//! Address-space classification
//!
//! EVAs are classified by testing select bits top-down: DRAM, global, group.
//! Anything else is [`Region::Local`]. The test order matters when more than
//! one select bit is set: the first match wins and the remaining bits are
//! read as part of that region's fields.
//!
//! NPAs are classified against a target tile in the order DRAM, host
//! interface, local tile, any vanilla core.

use hb_chip::layout::{dram, global, group, EPA_MASK};
use hb_chip::tile::is_dmem_epa;
use hb_chip::{Coordinate, Eva, McConfig, Npa};
use std::fmt;

/// Region an EVA addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// The issuing tile's own memory
    Local,
    /// A tile addressed relative to the tile-group origin
    Group,
    /// A tile addressed by absolute mesh coordinate
    Global,
    /// Striped DRAM behind the victim caches
    Dram,
}

impl Region {
    /// Every region, in classification order.
    pub const ALL: [Self; 4] = [Self::Dram, Self::Global, Self::Group, Self::Local];
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Group => "group",
            Self::Global => "global",
            Self::Dram => "dram",
        };
        f.write_str(name)
    }
}

/// Classify `eva`. Total: every 32-bit value lands in exactly one region.
#[must_use]
pub const fn classify(eva: Eva) -> Region {
    let addr = eva.addr();
    if addr & dram::BITMASK != 0 {
        Region::Dram
    } else if addr & global::BITMASK != 0 {
        Region::Global
    } else if addr & group::BITMASK != 0 {
        Region::Group
    } else {
        Region::Local
    }
}

/// Whether every bit above the local EPA field is clear.
#[must_use]
pub const fn is_local(eva: Eva) -> bool {
    eva.addr() & !EPA_MASK == 0
}

/// What an NPA points at, seen from a target tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpaRegion {
    /// A DRAM bank of the target's pod
    Dram,
    /// The host interface
    Host,
    /// The target tile's own DMEM
    Local,
    /// Another vanilla core's DMEM
    Global,
}

impl fmt::Display for NpaRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dram => "dram",
            Self::Host => "host",
            Self::Local => "local",
            Self::Global => "global",
        };
        f.write_str(name)
    }
}

/// Whether `npa` is a valid DRAM address for a tile at `tgt`.
///
/// The bank must border `tgt`'s own pod and the EPA must fit in the bank.
#[must_use]
pub fn npa_is_dram(cfg: &McConfig, tgt: Coordinate, npa: &Npa) -> bool {
    let pod = cfg.pod_of(tgt);
    cfg.is_dram(npa.xy())
        && cfg.pod_of(npa.xy()) == pod
        && npa.x >= cfg.dram_min_x_coord(pod)
        && npa.x <= cfg.dram_max_x_coord(pod)
        && u64::from(npa.epa) < cfg.dram_bank_size()
}

/// Classify `npa` as seen from `tgt`, or `None` if it names nothing reachable.
#[must_use]
pub fn classify_npa(cfg: &McConfig, tgt: Coordinate, npa: &Npa) -> Option<NpaRegion> {
    let xy = npa.xy();
    if npa_is_dram(cfg, tgt, npa) {
        Some(NpaRegion::Dram)
    } else if cfg.is_host_interface(xy) {
        Some(NpaRegion::Host)
    } else if xy == tgt && is_dmem_epa(npa.epa, cfg.dmem_size) {
        Some(NpaRegion::Local)
    } else if cfg.is_vanilla_core(xy) && is_dmem_epa(npa.epa, cfg.dmem_size) {
        Some(NpaRegion::Global)
    } else {
        None
    }
}
