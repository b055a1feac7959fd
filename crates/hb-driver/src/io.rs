//! Region-spanning I/O
//!
//! One EVA range can cover several physically unrelated NPA segments: a DRAM
//! range changes bank every stripe, a tile range stops at the end of DMEM.
//! These loops translate the current EVA, move at most the reported
//! contiguous size, advance, and repeat until the request is exhausted.
//!
//! Segments are issued in increasing EVA order. The first translation or
//! transfer failure aborts the loop; segments already moved stay moved.

use crate::error::{HbError, Result};
use hb_chip::{Eva, Npa};
use tracing::{debug, error};

fn next_segment(
    eva: Eva,
    remaining: usize,
    translate: &mut impl FnMut(Eva) -> Result<(Npa, u32)>,
) -> Result<(Npa, usize)> {
    let (npa, size) = translate(eva).map_err(|e| {
        error!("Failed to translate EVA {eva}: {e}");
        e
    })?;
    if size == 0 {
        return Err(HbError::invalid_address(
            eva.addr(),
            "translation reported an empty segment",
        ));
    }
    let len = remaining.min(size as usize);
    Ok((npa, len))
}

fn advance(eva: Eva, len: usize) -> Eva {
    // len never exceeds the u32 segment size it was clamped to
    eva.advance(u32::try_from(len).unwrap_or(u32::MAX))
}

/// Write `data` starting at `eva`. Returns the number of segments issued.
///
/// # Errors
///
/// Propagates the first error from `translate` or `transfer`.
pub fn write_span<T, F>(eva: Eva, data: &[u8], mut translate: T, mut transfer: F) -> Result<usize>
where
    T: FnMut(Eva) -> Result<(Npa, u32)>,
    F: FnMut(&Npa, &[u8]) -> Result<()>,
{
    let mut cursor = eva;
    let mut rest = data;
    let mut segments = 0;
    while !rest.is_empty() {
        let (npa, len) = next_segment(cursor, rest.len(), &mut translate)?;
        let (chunk, tail) = rest.split_at(len);
        debug!("Writing {len} B to EVA {cursor} ({npa})");
        transfer(&npa, chunk).map_err(|e| {
            error!("Failed to write {len} B to NPA {npa}: {e}");
            e
        })?;
        rest = tail;
        cursor = advance(cursor, len);
        segments += 1;
    }
    Ok(segments)
}

/// Fill `buf` from memory starting at `eva`. Returns the number of segments
/// issued.
///
/// # Errors
///
/// Propagates the first error from `translate` or `transfer`.
pub fn read_span<T, F>(eva: Eva, buf: &mut [u8], mut translate: T, mut transfer: F) -> Result<usize>
where
    T: FnMut(Eva) -> Result<(Npa, u32)>,
    F: FnMut(&Npa, &mut [u8]) -> Result<()>,
{
    let mut cursor = eva;
    let mut rest = buf;
    let mut segments = 0;
    while !rest.is_empty() {
        let (npa, len) = next_segment(cursor, rest.len(), &mut translate)?;
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(len);
        debug!("Reading {len} B from EVA {cursor} ({npa})");
        transfer(&npa, chunk).map_err(|e| {
            error!("Failed to read {len} B from NPA {npa}: {e}");
            e
        })?;
        rest = tail;
        cursor = advance(cursor, len);
        segments += 1;
    }
    Ok(segments)
}

/// Set `len` bytes starting at `eva` to `value`. Returns the number of
/// segments issued.
///
/// # Errors
///
/// Propagates the first error from `translate` or `transfer`.
pub fn memset_span<T, F>(
    eva: Eva,
    value: u8,
    len: usize,
    mut translate: T,
    mut transfer: F,
) -> Result<usize>
where
    T: FnMut(Eva) -> Result<(Npa, u32)>,
    F: FnMut(&Npa, u8, usize) -> Result<()>,
{
    let mut cursor = eva;
    let mut remaining = len;
    let mut segments = 0;
    while remaining > 0 {
        let (npa, seg) = next_segment(cursor, remaining, &mut translate)?;
        debug!("Setting {seg} B at EVA {cursor} ({npa}) to 0x{value:02x}");
        transfer(&npa, value, seg).map_err(|e| {
            error!("Failed to set {seg} B at NPA {npa}: {e}");
            e
        })?;
        remaining -= seg;
        cursor = advance(cursor, seg);
        segments += 1;
    }
    Ok(segments)
}
