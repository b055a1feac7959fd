//! DRAM mapping
//!
//! ```text
//!  31 | 30 ........ s+k+1 | s+k ...... s | s-1 ..... 0
//!   1 |     EPA top       |  bank index  | stripe offset
//!
//!  EPA = EPA top << s | stripe offset
//! ```
//!
//! `s` is `dram_stripe_size_log`, `k` is `x_dimlog`; the bank index is
//! `k + 1` bits wide and the active [`StripingPolicy`] turns it into a bank.
//! Forward translation promises the rest of the stripe; reverse translation
//! only promises the addressed word.

use super::policy::StripingPolicy;
use crate::error::{HbError, Result};
use hb_chip::bits::make_mask;
use hb_chip::layout::dram;
use hb_chip::tile::WORD_SIZE;
use hb_chip::{Coordinate, Epa, Eva, McConfig, Npa};
use tracing::{debug, error};

fn shr(value: u32, shift: u32) -> u32 {
    value.checked_shr(shift).unwrap_or(0)
}

fn shl(value: u32, shift: u32) -> u32 {
    value.checked_shl(shift).unwrap_or(0)
}

/// The `x_dimlog + 1`-bit bank index of a DRAM EVA.
pub fn dram_index(cfg: &McConfig, eva: Eva) -> u32 {
    shr(eva.addr(), cfg.dram_stripe_size_log()) & make_mask(cfg.x_dimlog() + 1)
}

/// Bank column of `eva`, for a tile at `src`.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if the column falls outside `src`'s
/// pod.
pub fn dram_x_coord(
    cfg: &McConfig,
    policy: StripingPolicy,
    src: Coordinate,
    eva: Eva,
) -> Result<u32> {
    let pod = cfg.pod_of(src);
    let min_x = cfg.dram_min_x_coord(pod);
    let max_x = cfg.dram_max_x_coord(pod);
    let bank = policy.select_bank(cfg, dram_index(cfg, eva));
    let x = i64::from(min_x) + bank.column;

    match u32::try_from(x) {
        Ok(x) if x >= min_x && x <= max_x => Ok(x),
        _ => {
            error!(
                "{policy}: translation of EVA {eva} failed, DRAM X {x} is outside [{min_x}, {max_x}]"
            );
            Err(HbError::invalid_address(
                eva.addr(),
                format!("DRAM X {x} outside [{min_x}, {max_x}]"),
            ))
        }
    }
}

/// Bank row of `eva`, for a tile at `src`: the pod's north or south DRAM row.
pub fn dram_y_coord(cfg: &McConfig, policy: StripingPolicy, src: Coordinate, eva: Eva) -> u32 {
    let pod = cfg.pod_of(src);
    if policy.select_bank(cfg, dram_index(cfg, eva)).south {
        cfg.pod_dram_south_y(pod)
    } else {
        cfg.pod_dram_north_y(pod)
    }
}

/// EPA of `eva` inside its bank, and the bytes left in its stripe.
///
/// # Errors
///
/// Returns [`HbError::InvalidAddress`] if the EPA is not below the bank size.
pub fn dram_epa(cfg: &McConfig, eva: Eva) -> Result<(Epa, u32)> {
    let s = cfg.dram_stripe_size_log();
    let k = cfg.x_dimlog();
    let addr = eva.addr();
    let offset = addr & make_mask(s);
    let epa = offset | shl(shr(addr & dram::BODY_MASK, s + k + 1), s);

    if u64::from(epa) >= cfg.dram_bank_size() {
        error!(
            "Translation of EVA {eva} failed, EPA 0x{epa:08x} is outside the 0x{:x}-byte bank",
            cfg.dram_bank_size()
        );
        return Err(HbError::invalid_address(
            addr,
            format!("DRAM EPA 0x{epa:08x} beyond bank size"),
        ));
    }
    Ok((epa, shl(1, s) - offset))
}

/// Translate a DRAM EVA issued by `src`.
///
/// # Errors
///
/// See [`dram_x_coord`] and [`dram_epa`].
pub fn dram_eva_to_npa(
    cfg: &McConfig,
    policy: StripingPolicy,
    src: Coordinate,
    eva: Eva,
) -> Result<(Npa, u32)> {
    let x = dram_x_coord(cfg, policy, src, eva)?;
    let y = dram_y_coord(cfg, policy, src, eva);
    let (epa, size) = dram_epa(cfg, eva)?;
    let npa = Npa::new(x, y, epa);
    debug!("{policy}: DRAM EVA {eva} from {src} -> NPA {npa} ({size} B)");
    Ok((npa, size))
}

/// Build the DRAM EVA that a tile at `tgt` uses to reach `npa`.
///
/// The caller has already established that `npa` is a DRAM bank of `tgt`'s
/// pod with an in-range EPA.
///
/// # Errors
///
/// Returns [`HbError::InvalidConfig`] if the policy has no inverse for this
/// geometry.
pub fn dram_npa_to_eva_unchecked(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    npa: &Npa,
) -> Result<(Eva, u32)> {
    let s = cfg.dram_stripe_size_log();
    let k = cfg.x_dimlog();
    let pod = cfg.pod_of(tgt);
    let column = npa.x.saturating_sub(cfg.dram_min_x_coord(pod));
    let south = cfg.is_dram_south(npa.xy());
    let index = policy.bank_index(cfg, column, south)?;

    let addr = (npa.epa & make_mask(s))
        | shl(index, s)
        | shl(shr(npa.epa, s), s + k + 1)
        | dram::BITMASK;
    let size = WORD_SIZE - (npa.epa & (WORD_SIZE - 1));
    Ok((Eva::new(addr), size))
}

/// Describe how `eva` fails to translate back to `npa`, if it does.
pub fn round_trip_mismatch(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    npa: &Npa,
    eva: Eva,
) -> Option<String> {
    let test = match dram_eva_to_npa(cfg, policy, tgt, eva) {
        Ok((test, _)) => test,
        Err(e) => return Some(format!("EVA {eva} does not translate back: {e}")),
    };
    let mut diffs = Vec::new();
    if test.x != npa.x {
        diffs.push(format!("X expected {} got {}", npa.x, test.x));
    }
    if test.y != npa.y {
        diffs.push(format!("Y expected {} got {}", npa.y, test.y));
    }
    if test.epa != npa.epa {
        diffs.push(format!("EPA expected 0x{:08x} got 0x{:08x}", npa.epa, test.epa));
    }
    if diffs.is_empty() {
        None
    } else {
        Some(diffs.join(", "))
    }
}

/// Build the DRAM EVA for `npa`, then check it translates back.
///
/// A failed check is logged and the EVA is still returned.
///
/// # Errors
///
/// See [`dram_npa_to_eva_unchecked`].
pub fn dram_npa_to_eva(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    npa: &Npa,
) -> Result<(Eva, u32)> {
    let (eva, size) = dram_npa_to_eva_unchecked(cfg, policy, tgt, npa)?;
    debug!("{policy}: DRAM NPA {npa} for {tgt} -> EVA {eva}");
    if let Some(mismatch) = round_trip_mismatch(cfg, policy, tgt, npa, eva) {
        error!("{policy}: NPA {npa} -> EVA {eva} does not round-trip: {mismatch}");
    }
    Ok((eva, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: Coordinate = Coordinate::new(16, 8);

    #[test]
    fn default_field_split() {
        let cfg = McConfig::default();
        // index 0b1_0011 (south, column 3), EPA top 2, offset 0x14
        let eva = Eva::new(dram::BITMASK | (2 << 10) | (0b1_0011 << 5) | 0x14);
        let (npa, size) = dram_eva_to_npa(&cfg, StripingPolicy::Default, SRC, eva).unwrap();
        assert_eq!(npa, Npa::new(19, 16, (2 << 5) | 0x14));
        assert_eq!(size, 32 - 0x14);
    }

    #[test]
    fn consecutive_stripes_walk_the_north_row() {
        let cfg = McConfig::default();
        for i in 0..16u32 {
            let eva = Eva::new(dram::BITMASK | (i << 5));
            let (npa, size) = dram_eva_to_npa(&cfg, StripingPolicy::Default, SRC, eva).unwrap();
            assert_eq!((npa.x, npa.y, npa.epa), (16 + i, 7, 0));
            assert_eq!(size, 32);
        }
    }

    #[test]
    fn column_past_pod_is_invalid() {
        // 12-wide pods still carry a 4-bit column field.
        let cfg = McConfig {
            pod_dim: hb_chip::Dimension::new(12, 8),
            ..McConfig::default()
        };
        let eva = Eva::new(dram::BITMASK | (12 << 5));
        let err = dram_x_coord(&cfg, StripingPolicy::Default, SRC, eva).unwrap_err();
        assert!(matches!(err, HbError::InvalidAddress { .. }));
        let mirrored = Eva::new(dram::BITMASK | ((16 | 13) << 5));
        assert!(dram_x_coord(&cfg, StripingPolicy::LinearTlrbrl, SRC, mirrored).is_err());
    }

    #[test]
    fn epa_beyond_bank_is_invalid() {
        let cfg = McConfig {
            dram_enabled: false,
            ..McConfig::default()
        };
        // 16 KiB victim cache: 9 EPA-top bits above the 5-bit offset.
        let ok = Eva::new(dram::BITMASK | (0x1ff << 10));
        assert!(dram_epa(&cfg, ok).is_ok());
        let past = Eva::new(dram::BITMASK | (0x200 << 10));
        assert!(matches!(
            dram_epa(&cfg, past),
            Err(HbError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn reverse_promises_one_word() {
        let cfg = McConfig::default();
        let npa = Npa::new(20, 16, 0x1235);
        let (eva, size) = dram_npa_to_eva(&cfg, StripingPolicy::Default, SRC, &npa).unwrap();
        assert_eq!(size, 3);
        assert_eq!(round_trip_mismatch(&cfg, StripingPolicy::Default, SRC, &npa, eva), None);
    }

    #[test]
    fn mismatch_is_described() {
        let cfg = McConfig::default();
        let npa = Npa::new(20, 16, 0x40);
        let (eva, _) = dram_npa_to_eva(&cfg, StripingPolicy::Default, SRC, &npa).unwrap();
        let wrong = Npa::new(21, 7, 0x44);
        let msg = round_trip_mismatch(&cfg, StripingPolicy::Default, SRC, &wrong, eva).unwrap();
        assert!(msg.contains("X expected 21"));
        assert!(msg.contains("Y expected 7"));
        assert!(msg.contains("EPA expected"));
    }
}
