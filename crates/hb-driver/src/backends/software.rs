//! Software transport
//!
//! An in-memory model of every endpoint on the mesh. Memory is sparse: each
//! endpoint owns 4 KiB pages allocated on first write, and unwritten bytes
//! read as zero. Every transfer is recorded, and a failure can be injected
//! after a given number of transfers to exercise partial-failure paths.

use crate::error::{HbError, Result};
use crate::transport::Transport;
use hb_chip::{Coordinate, Npa};
use std::collections::HashMap;
use tracing::{debug, warn};

const PAGE_SIZE: u64 = 4096;

/// Kind of a recorded transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Mesh write
    Write,
    /// Mesh read
    Read,
    /// Mesh fill
    Memset,
    /// DMA write
    DmaWrite,
    /// DMA read
    DmaRead,
}

/// One completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecord {
    /// What was done
    pub kind: TransferKind,
    /// Where it started
    pub npa: Npa,
    /// How many bytes
    pub len: usize,
}

/// In-memory transport.
#[derive(Debug, Default)]
pub struct SoftwareTransport {
    memory: HashMap<Coordinate, HashMap<u64, Box<[u8]>>>,
    history: Vec<TransferRecord>,
    fail_after: Option<usize>,
    dma: bool,
}

impl SoftwareTransport {
    /// Empty memory, mesh transfers only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept DMA transfers.
    pub fn with_dma(mut self) -> Self {
        self.dma = true;
        self
    }

    /// Fail every transfer after the first `transfers` succeed.
    pub fn fail_after(mut self, transfers: usize) -> Self {
        self.fail_after = Some(transfers);
        self
    }

    /// Every completed transfer, oldest first.
    pub fn history(&self) -> &[TransferRecord] {
        &self.history
    }

    /// Number of completed transfers.
    pub fn transfer_count(&self) -> usize {
        self.history.len()
    }

    /// Total bytes moved by transfers of `kind`.
    pub fn bytes_moved(&self, kind: TransferKind) -> usize {
        self.history
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.len)
            .sum()
    }

    /// Forget the transfer history, keeping memory contents.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Copy of `len` bytes at `npa`, without recording a transfer.
    pub fn peek(&self, npa: &Npa, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        let Some(pages) = self.memory.get(&npa.xy()) else {
            return out;
        };
        for (i, byte) in out.iter_mut().enumerate() {
            let addr = u64::from(npa.epa) + i as u64;
            if let Some(page) = pages.get(&(addr / PAGE_SIZE)) {
                *byte = page[page_offset(addr)];
            }
        }
        out
    }

    fn admit(&self, kind: TransferKind, npa: &Npa, len: usize) -> Result<()> {
        if let Some(limit) = self.fail_after {
            if self.history.len() >= limit {
                warn!("Injected failure on {kind:?} of {len} B at {npa}");
                return Err(HbError::transport_failed(format!(
                    "injected failure after {limit} transfers"
                )));
            }
        }
        if u64::from(npa.epa) + len as u64 > 1 << 32 {
            return Err(HbError::transport_failed(format!(
                "{len} B at {npa} runs past the 32-bit EPA space"
            )));
        }
        Ok(())
    }

    fn record(&mut self, kind: TransferKind, npa: &Npa, len: usize) {
        debug!("{kind:?} {len} B at {npa}");
        self.history.push(TransferRecord {
            kind,
            npa: *npa,
            len,
        });
    }

    fn store(&mut self, npa: &Npa, len: usize, mut byte_at: impl FnMut(usize) -> u8) {
        let pages = self.memory.entry(npa.xy()).or_default();
        for i in 0..len {
            let addr = u64::from(npa.epa) + i as u64;
            let page = pages
                .entry(addr / PAGE_SIZE)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
            page[page_offset(addr)] = byte_at(i);
        }
    }

    fn load(&self, npa: &Npa, buf: &mut [u8]) {
        let data = self.peek(npa, buf.len());
        buf.copy_from_slice(&data);
    }

    fn require_dma(&self, operation: &str) -> Result<()> {
        if self.dma {
            Ok(())
        } else {
            Err(HbError::unsupported(operation))
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn page_offset(addr: u64) -> usize {
    (addr % PAGE_SIZE) as usize
}

impl Transport for SoftwareTransport {
    fn write(&mut self, npa: &Npa, data: &[u8]) -> Result<()> {
        self.admit(TransferKind::Write, npa, data.len())?;
        self.store(npa, data.len(), |i| data[i]);
        self.record(TransferKind::Write, npa, data.len());
        Ok(())
    }

    fn read(&mut self, npa: &Npa, buf: &mut [u8]) -> Result<()> {
        self.admit(TransferKind::Read, npa, buf.len())?;
        self.load(npa, buf);
        self.record(TransferKind::Read, npa, buf.len());
        Ok(())
    }

    fn memset(&mut self, npa: &Npa, value: u8, len: usize) -> Result<()> {
        self.admit(TransferKind::Memset, npa, len)?;
        self.store(npa, len, |_| value);
        self.record(TransferKind::Memset, npa, len);
        Ok(())
    }

    fn dma_write(&mut self, npa: &Npa, data: &[u8]) -> Result<()> {
        self.require_dma("dma_write")?;
        self.admit(TransferKind::DmaWrite, npa, data.len())?;
        self.store(npa, data.len(), |i| data[i]);
        self.record(TransferKind::DmaWrite, npa, data.len());
        Ok(())
    }

    fn dma_read(&mut self, npa: &Npa, buf: &mut [u8]) -> Result<()> {
        self.require_dma("dma_read")?;
        self.admit(TransferKind::DmaRead, npa, buf.len())?;
        self.load(npa, buf);
        self.record(TransferKind::DmaRead, npa, buf.len());
        Ok(())
    }

    fn transport_type(&self) -> &'static str {
        "software"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_memory_reads_zero() {
        let mut t = SoftwareTransport::new();
        let mut buf = [0xffu8; 8];
        t.read(&Npa::new(16, 7, 0x100), &mut buf).unwrap();
        assert_eq!(buf, [0; 8]);
    }

    #[test]
    fn write_crosses_pages() {
        let mut t = SoftwareTransport::new();
        let npa = Npa::new(16, 7, 4094);
        t.write(&npa, &[1, 2, 3, 4]).unwrap();
        assert_eq!(t.peek(&npa, 4), vec![1, 2, 3, 4]);
        assert_eq!(t.peek(&Npa::new(16, 7, 4096), 2), vec![3, 4]);
        assert_eq!(t.peek(&Npa::new(17, 7, 4094), 4), vec![0; 4]);
    }

    #[test]
    fn memset_and_counters() {
        let mut t = SoftwareTransport::new();
        t.memset(&Npa::new(20, 16, 0), 0xab, 32).unwrap();
        t.write(&Npa::new(20, 16, 4), &[1]).unwrap();
        assert_eq!(t.transfer_count(), 2);
        assert_eq!(t.bytes_moved(TransferKind::Memset), 32);
        assert_eq!(t.bytes_moved(TransferKind::Write), 1);
        assert_eq!(t.peek(&Npa::new(20, 16, 3), 3), vec![0xab, 1, 0xab]);
        t.clear_history();
        assert_eq!(t.transfer_count(), 0);
    }

    #[test]
    fn injected_failure() {
        let mut t = SoftwareTransport::new().fail_after(1);
        t.write(&Npa::new(16, 7, 0), &[1]).unwrap();
        let err = t.write(&Npa::new(16, 7, 1), &[2]).unwrap_err();
        assert!(matches!(err, HbError::TransportFailed { .. }));
        assert_eq!(t.peek(&Npa::new(16, 7, 0), 2), vec![1, 0]);
    }

    #[test]
    fn dma_needs_opt_in() {
        let npa = Npa::new(16, 7, 0);
        let mut t = SoftwareTransport::new();
        assert!(matches!(
            t.dma_write(&npa, &[1]),
            Err(HbError::Unsupported { .. })
        ));
        let mut t = SoftwareTransport::new().with_dma();
        t.dma_write(&npa, &[7, 8]).unwrap();
        let mut buf = [0u8; 2];
        t.dma_read(&npa, &mut buf).unwrap();
        assert_eq!(buf, [7, 8]);
        assert_eq!(t.history()[0].kind, TransferKind::DmaWrite);
        assert_eq!(t.transport_type(), "software");
    }

    #[test]
    fn epa_space_overflow_is_rejected() {
        let mut t = SoftwareTransport::new();
        assert!(t.write(&Npa::new(0, 1, u32::MAX), &[1, 2]).is_err());
        assert!(t.write(&Npa::new(0, 1, u32::MAX), &[1]).is_ok());
    }
}
