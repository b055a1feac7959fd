//! Tile (non-DRAM) mapping, shared by every striping policy

use crate::error::{HbError, Result};
use hb_chip::layout::{global, group, EPA_MASK, GLOBAL_EPA_MASK};
use hb_chip::tile::{is_csr, is_dmem_epa, EPA_DMEM_BASE, EVA_DMEM_BASE, WORD_SIZE};
use hb_chip::{Coordinate, Epa, Eva, McConfig, Npa};
use tracing::{debug, error};

/// EPA and contiguous bytes for the tile part of `eva`, under `epa_mask`.
///
/// DMEM addresses report the bytes left in DMEM; CSRs are single words.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if the masked address is neither DMEM
/// nor a CSR.
pub fn eva_to_epa_tile(cfg: &McConfig, eva: Eva, epa_mask: u32) -> Result<(Epa, u32)> {
    let masked = eva.addr() & epa_mask;
    let offset = masked.wrapping_sub(EVA_DMEM_BASE);
    if offset < cfg.dmem_size {
        Ok((offset + EPA_DMEM_BASE, cfg.dmem_size - offset))
    } else if is_csr(masked) {
        Ok((masked, WORD_SIZE))
    } else {
        error!(
            "EVA {eva} does not map to addressable tile memory (offset 0x{masked:05x}, DMEM {} B)",
            cfg.dmem_size
        );
        Err(HbError::invalid_address(
            eva.addr(),
            "not a DMEM or CSR address",
        ))
    }
}

/// Translate a local EVA issued by `src`.
///
/// # Errors
///
/// See [`eva_to_epa_tile`].
pub fn local_eva_to_npa(cfg: &McConfig, src: Coordinate, eva: Eva) -> Result<(Npa, u32)> {
    let (epa, size) = eva_to_epa_tile(cfg, eva, EPA_MASK)?;
    let npa = Npa::from_coordinate(src, epa);
    debug!("Local EVA {eva} for tile {src} -> NPA {npa}");
    Ok((npa, size))
}

/// Translate a group EVA relative to the tile-group `origin`.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if the addressed tile lies outside
/// the group, or see [`eva_to_epa_tile`].
pub fn group_eva_to_npa(cfg: &McConfig, origin: Coordinate, eva: Eva) -> Result<(Npa, u32)> {
    let addr = eva.addr();
    let x = ((addr & group::X_BITMASK) >> group::X_BITIDX) + origin.x;
    let y = ((addr & group::Y_BITMASK) >> group::Y_BITIDX) + origin.y;
    let dim = cfg.pod_dimension();

    // Half-open bound: column origin.x + dim.x already belongs to the next pod.
    if x >= origin.x + dim.x {
        error!("Group EVA {eva}: X {x} is outside the {dim} group at {origin}");
        return Err(HbError::invalid_address(
            addr,
            format!("group X {x} outside [{}, {})", origin.x, origin.x + dim.x),
        ));
    }
    if y >= origin.y + dim.y {
        error!("Group EVA {eva}: Y {y} is outside the {dim} group at {origin}");
        return Err(HbError::invalid_address(
            addr,
            format!("group Y {y} outside [{}, {})", origin.y, origin.y + dim.y),
        ));
    }

    let (epa, size) = eva_to_epa_tile(cfg, eva, EPA_MASK)?;
    let npa = Npa::new(x, y, epa);
    debug!("Group EVA {eva} -> NPA {npa}");
    Ok((npa, size))
}

/// Translate a global EVA.
///
/// # Errors
///
/// See [`eva_to_epa_tile`].
pub fn global_eva_to_npa(cfg: &McConfig, eva: Eva) -> Result<(Npa, u32)> {
    let addr = eva.addr();
    let x = (addr & global::X_BITMASK) >> global::X_BITIDX;
    let y = (addr & global::Y_BITMASK) >> global::Y_BITIDX;
    let (epa, size) = eva_to_epa_tile(cfg, eva, GLOBAL_EPA_MASK)?;
    let npa = Npa::new(x, y, epa);
    debug!("Global EVA {eva} -> NPA {npa}");
    Ok((npa, size))
}

/// Global EVA naming a tile or host NPA. Only the addressed word is promised.
///
/// DMEM EPAs are folded back to their EVA offset so the result translates
/// forward to the same NPA.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if a coordinate or the EPA does not
/// fit in the global EVA fields.
pub fn tile_npa_to_eva(cfg: &McConfig, npa: &Npa) -> Result<(Eva, u32)> {
    let field = if is_dmem_epa(npa.epa, cfg.dmem_size) {
        npa.epa - EPA_DMEM_BASE + EVA_DMEM_BASE
    } else {
        npa.epa
    };

    let x_max = global::X_BITMASK >> global::X_BITIDX;
    let y_max = global::Y_BITMASK >> global::Y_BITIDX;
    if npa.x > x_max || npa.y > y_max || field > GLOBAL_EPA_MASK {
        error!("NPA {npa} does not fit in a global EVA");
        return Err(HbError::invalid_address(
            npa.epa,
            format!("NPA {npa} does not fit in a global EVA"),
        ));
    }

    let eva = Eva::new(
        field | (npa.x << global::X_BITIDX) | (npa.y << global::Y_BITIDX) | global::BITMASK,
    );
    let size = WORD_SIZE - (npa.epa & (WORD_SIZE - 1));
    debug!("NPA {npa} -> global EVA {eva}");
    Ok((eva, size))
}
