//! Manycore handle
//!
//! Bundles a validated configuration, the active striping policy and a
//! transport. Every device memory access in the host runtime goes through
//! one of these.

use crate::config::validate_config;
use crate::error::{HbError, Result};
use crate::eva::{self, classify, Region, StripingPolicy};
use crate::io::{memset_span, read_span, write_span};
use crate::transport::Transport;
use bytes::{Bytes, BytesMut};
use hb_chip::{Coordinate, Eva, McConfig, Npa};
use tracing::{error, info};

/// Host-side view of one manycore.
#[derive(Debug)]
pub struct Manycore<T: Transport> {
    config: McConfig,
    policy: StripingPolicy,
    transport: T,
}

impl<T: Transport> Manycore<T> {
    /// Open a manycore over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: McConfig, policy: StripingPolicy, transport: T) -> Result<Self> {
        validate_config(&config)?;
        info!(
            "Manycore: {} pods of {} vcores, {policy} striping, {} transport",
            config.pods,
            config.pod_dim,
            transport.transport_type()
        );
        Ok(Self {
            config,
            policy,
            transport,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &McConfig {
        &self.config
    }

    /// Active striping policy.
    pub const fn policy(&self) -> StripingPolicy {
        self.policy
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// See [`eva::eva_to_npa`].
    ///
    /// # Errors
    ///
    /// Translation errors.
    pub fn eva_to_npa(&self, src: Coordinate, eva: Eva) -> Result<(Npa, u32)> {
        eva::eva_to_npa(&self.config, self.policy, src, eva)
    }

    /// See [`eva::npa_to_eva`].
    ///
    /// # Errors
    ///
    /// Translation errors.
    pub fn npa_to_eva(&self, tgt: Coordinate, npa: &Npa) -> Result<(Eva, u32)> {
        eva::npa_to_eva(&self.config, self.policy, tgt, npa)
    }

    /// See [`eva::eva_size`].
    ///
    /// # Errors
    ///
    /// Translation errors.
    pub fn eva_size(&self, eva: Eva) -> Result<u32> {
        eva::eva_size(&self.config, self.policy, eva)
    }

    /// Write `data` at `eva` as seen by `tgt`, over the mesh.
    ///
    /// Not transactional: on error, segments before the failing one have
    /// already been written.
    ///
    /// # Errors
    ///
    /// The first translation or transport error.
    pub fn eva_write(&mut self, tgt: Coordinate, eva: Eva, data: &[u8]) -> Result<()> {
        let (cfg, policy, transport) = (&self.config, self.policy, &mut self.transport);
        write_span(
            eva,
            data,
            |e| eva::eva_to_npa(cfg, policy, tgt, e),
            |npa, chunk| transport.write(npa, chunk),
        )
        .map(drop)
    }

    /// Fill `buf` from `eva` as seen by `tgt`, over the mesh.
    ///
    /// # Errors
    ///
    /// The first translation or transport error.
    pub fn eva_read(&mut self, tgt: Coordinate, eva: Eva, buf: &mut [u8]) -> Result<()> {
        let (cfg, policy, transport) = (&self.config, self.policy, &mut self.transport);
        read_span(
            eva,
            buf,
            |e| eva::eva_to_npa(cfg, policy, tgt, e),
            |npa, chunk| transport.read(npa, chunk),
        )
        .map(drop)
    }

    /// Read `len` bytes from `eva` as seen by `tgt`, over the mesh.
    ///
    /// # Errors
    ///
    /// The first translation or transport error.
    pub fn eva_read_bytes(&mut self, tgt: Coordinate, eva: Eva, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        self.eva_read(tgt, eva, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Set `len` bytes at `eva` as seen by `tgt` to `value`, over the mesh.
    ///
    /// Not transactional, like [`eva_write`](Self::eva_write).
    ///
    /// # Errors
    ///
    /// The first translation or transport error.
    pub fn eva_memset(&mut self, tgt: Coordinate, eva: Eva, value: u8, len: usize) -> Result<()> {
        let (cfg, policy, transport) = (&self.config, self.policy, &mut self.transport);
        memset_span(
            eva,
            value,
            len,
            |e| eva::eva_to_npa(cfg, policy, tgt, e),
            |npa, v, n| transport.memset(npa, v, n),
        )
        .map(drop)
    }

    /// Write `data` at DRAM `eva` as seen by `tgt`, by DMA.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::InvalidAddress`] when a segment is not DRAM, or the
    /// first translation or transport error.
    pub fn eva_write_dma(&mut self, tgt: Coordinate, eva: Eva, data: &[u8]) -> Result<()> {
        let (cfg, policy, transport) = (&self.config, self.policy, &mut self.transport);
        write_span(
            eva,
            data,
            |e| dram_segment(cfg, policy, tgt, e),
            |npa, chunk| transport.dma_write(npa, chunk),
        )
        .map(drop)
    }

    /// Fill `buf` from DRAM `eva` as seen by `tgt`, by DMA.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::InvalidAddress`] when a segment is not DRAM, or the
    /// first translation or transport error.
    pub fn eva_read_dma(&mut self, tgt: Coordinate, eva: Eva, buf: &mut [u8]) -> Result<()> {
        let (cfg, policy, transport) = (&self.config, self.policy, &mut self.transport);
        read_span(
            eva,
            buf,
            |e| dram_segment(cfg, policy, tgt, e),
            |npa, chunk| transport.dma_read(npa, chunk),
        )
        .map(drop)
    }
}

fn dram_segment(
    cfg: &McConfig,
    policy: StripingPolicy,
    tgt: Coordinate,
    eva: Eva,
) -> Result<(Npa, u32)> {
    if classify(eva) != Region::Dram {
        error!("DMA to non-DRAM EVA {eva}");
        return Err(HbError::invalid_address(
            eva.addr(),
            "DMA requires a DRAM address",
        ));
    }
    eva::eva_to_npa(cfg, policy, tgt, eva)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{SoftwareTransport, TransferKind};
    use hb_chip::tile::EPA_DMEM_BASE;

    fn manycore() -> Manycore<SoftwareTransport> {
        Manycore::new(
            McConfig::default(),
            StripingPolicy::Default,
            SoftwareTransport::new().with_dma(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = McConfig {
            vcache_stripe_words: 3,
            ..McConfig::default()
        };
        assert!(Manycore::new(cfg, StripingPolicy::Default, SoftwareTransport::new()).is_err());
    }

    #[test]
    fn local_write_lands_in_dmem() {
        let mut mc = manycore();
        let tile = Coordinate::new(17, 9);
        mc.eva_write(tile, Eva::new(0x10), b"hello").unwrap();
        let npa = Npa::new(17, 9, EPA_DMEM_BASE + 0x10);
        assert_eq!(mc.transport().peek(&npa, 5), b"hello");
        assert_eq!(
            mc.eva_read_bytes(tile, Eva::new(0x10), 5).unwrap(),
            Bytes::from_static(b"hello")
        );
    }

    #[test]
    fn dram_write_stripes_across_banks() {
        let mut mc = manycore();
        let tgt = mc.config().vcore_origin;
        let data: Vec<u8> = (0..=255).collect();
        mc.eva_write(tgt, Eva::new(0x8000_0000), &data).unwrap();
        let history = mc.transport().history();
        assert_eq!(history.len(), 8);
        for (i, rec) in history.iter().enumerate() {
            assert_eq!(rec.npa, Npa::new(16 + i as u32, 7, 0));
            assert_eq!(rec.len, 32);
        }
    }

    #[test]
    fn dma_rejects_tile_addresses() {
        let mut mc = manycore();
        let tgt = mc.config().vcore_origin;
        let err = mc.eva_write_dma(tgt, Eva::new(0x100), &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, HbError::InvalidAddress { .. }));
        assert_eq!(mc.transport().transfer_count(), 0);
    }

    #[test]
    fn dma_round_trip() {
        let mut mc = manycore();
        let tgt = mc.config().vcore_origin;
        mc.eva_write_dma(tgt, Eva::new(0x8000_0010), &[9; 40]).unwrap();
        let mut buf = [0u8; 40];
        mc.eva_read_dma(tgt, Eva::new(0x8000_0010), &mut buf).unwrap();
        assert_eq!(buf, [9; 40]);
        assert_eq!(mc.transport().bytes_moved(TransferKind::DmaWrite), 40);
    }

    #[test]
    fn memset_then_read() {
        let mut mc = manycore();
        let tgt = mc.config().vcore_origin;
        mc.eva_memset(tgt, Eva::new(0x8000_0000), 0x5a, 100).unwrap();
        let back = mc.eva_read_bytes(tgt, Eva::new(0x8000_0000), 100).unwrap();
        assert!(back.iter().all(|&b| b == 0x5a));
    }
}
