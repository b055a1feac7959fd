//! Transport abstraction
//!
//! A transport moves bytes to and from one NPA at a time. Callers never ask
//! it to cross the contiguous segment that translation reported, so a
//! transport does not need to know about EVAs or striping.

use crate::error::{HbError, Result};
use hb_chip::Npa;
use std::fmt::Debug;

/// Per-NPA data mover underneath the spanning I/O helpers.
pub trait Transport: Debug + Send {
    /// Write `data` starting at `npa`.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::TransportFailed`] if the transfer does not complete.
    fn write(&mut self, npa: &Npa, data: &[u8]) -> Result<()>;

    /// Fill `buf` from memory starting at `npa`.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::TransportFailed`] if the transfer does not complete.
    fn read(&mut self, npa: &Npa, buf: &mut [u8]) -> Result<()>;

    /// Set `len` bytes starting at `npa` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::TransportFailed`] if the transfer does not complete.
    fn memset(&mut self, npa: &Npa, value: u8, len: usize) -> Result<()>;

    /// Write `data` to DRAM at `npa`, bypassing the victim caches.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::Unsupported`] unless the transport has a DMA engine.
    fn dma_write(&mut self, npa: &Npa, data: &[u8]) -> Result<()> {
        let _ = (npa, data);
        Err(HbError::unsupported("dma_write"))
    }

    /// Read DRAM at `npa` into `buf`, bypassing the victim caches.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::Unsupported`] unless the transport has a DMA engine.
    fn dma_read(&mut self, npa: &Npa, buf: &mut [u8]) -> Result<()> {
        let _ = (npa, buf);
        Err(HbError::unsupported("dma_read"))
    }

    /// Short name for logs.
    fn transport_type(&self) -> &'static str;
}
