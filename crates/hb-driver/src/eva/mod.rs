//! EVA ↔ NPA translation
//!
//! [`eva_to_npa`], [`npa_to_eva`] and [`eva_size`] classify their input and
//! hand it to the matching mapper. Local, group and global mapping is shared
//! by every [`StripingPolicy`]; only DRAM mapping depends on the policy.
//!
//! All functions here are pure over a read-only [`McConfig`] and may be
//! called from any number of threads.

pub mod dram;
pub mod policy;
pub mod region;
pub mod tile;

pub use policy::StripingPolicy;
pub use region::{classify, classify_npa, NpaRegion, Region};

use crate::error::{HbError, Result};
use hb_chip::{Coordinate, Eva, McConfig, Npa};
use tracing::{debug, error};

/// Translate `eva`, issued by the tile at `src`, to an NPA and the number of
/// bytes contiguous from it.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if the address is outside its region's
/// configured bounds, or [`HbError::UnmappedAddress`] if it is in no region.
pub fn eva_to_npa(
    cfg: &McConfig,
    policy: StripingPolicy,
    src: Coordinate,
    eva: Eva,
) -> Result<(Npa, u32)> {
    match classify(eva) {
        Region::Dram => dram::dram_eva_to_npa(cfg, policy, src, eva),
        Region::Global => tile::global_eva_to_npa(cfg, eva),
        Region::Group => tile::group_eva_to_npa(cfg, cfg.vcore_origin, eva),
        Region::Local if region::is_local(eva) => tile::local_eva_to_npa(cfg, src, eva),
        Region::Local => {
            error!("EVA {eva} did not map to a known region");
            Err(HbError::unmapped_address(eva.addr()))
        }
    }
}

/// Translate `npa` to the EVA a tile at `tgt` would use for it, and the
/// number of bytes contiguous from it.
///
/// DRAM results are checked by translating back; a mismatch is logged.
///
/// # Errors
///
/// Returns [`HbError::UnmappedAddress`] if `npa` is not reachable from
/// `tgt`, [`HbError::InvalidAddress`] if it does not fit in an EVA, or
/// [`HbError::InvalidConfig`] if the policy cannot be inverted.
pub fn npa_to_eva(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    npa: &Npa,
) -> Result<(Eva, u32)> {
    let Some(kind) = classify_npa(cfg, tgt, npa) else {
        error!("NPA {npa} is not reachable from {tgt}");
        return Err(HbError::unmapped_address(npa.epa));
    };
    debug!("NPA {npa} from {tgt} is {kind}");
    match kind {
        NpaRegion::Dram => dram::dram_npa_to_eva(cfg, policy, tgt, npa),
        NpaRegion::Host | NpaRegion::Local | NpaRegion::Global => tile::tile_npa_to_eva(cfg, npa),
    }
}

/// Bytes contiguous from `eva`, as seen from the first vanilla core.
///
/// # Errors
///
/// Same as [`eva_to_npa`].
pub fn eva_size(cfg: &McConfig, policy: StripingPolicy, eva: Eva) -> Result<u32> {
    eva_to_npa(cfg, policy, cfg.vcore_origin, eva).map(|(_, size)| size)
}

/// Invert a DRAM `npa` and require the result to translate back exactly.
///
/// # Errors
///
/// Returns [`HbError::UnmappedAddress`] if `npa` is not a DRAM bank of
/// `tgt`'s pod, and [`HbError::InvalidAddress`] if the round trip does not
/// reproduce X, Y and EPA.
pub fn verify_dram_npa(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    npa: &Npa,
) -> Result<Eva> {
    if !region::npa_is_dram(cfg, tgt, npa) {
        return Err(HbError::unmapped_address(npa.epa));
    }
    let (eva, _) = dram::dram_npa_to_eva_unchecked(cfg, policy, tgt, npa)?;
    match dram::round_trip_mismatch(cfg, policy, tgt, npa, eva) {
        None => Ok(eva),
        Some(mismatch) => {
            error!("{policy}: NPA {npa} -> EVA {eva} does not round-trip: {mismatch}");
            Err(HbError::invalid_address(eva.addr(), mismatch))
        }
    }
}
