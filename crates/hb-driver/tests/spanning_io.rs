//! Spanning I/O over the software transport

use hb_chip::tile::EPA_DMEM_BASE;
use hb_chip::{Coordinate, Eva, McConfig, Npa};
use hb_driver::backends::{SoftwareTransport, TransferKind};
use hb_driver::{HbError, Manycore, StripingPolicy};

fn open(policy: StripingPolicy, transport: SoftwareTransport) -> Manycore<SoftwareTransport> {
    Manycore::new(McConfig::default(), policy, transport).unwrap()
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

#[test]
fn segments_sum_and_respect_eva_size() {
    for policy in StripingPolicy::ALL {
        let mut mc = open(policy, SoftwareTransport::new());
        let tgt = mc.config().vcore_origin;
        let start = Eva::new(0x8000_0013);
        let data = pattern(1000);
        mc.eva_write(tgt, start, &data).unwrap();

        let records = mc.transport().history().to_vec();
        assert_eq!(records.iter().map(|r| r.len).sum::<usize>(), data.len());

        let mut cursor = start;
        for rec in &records {
            let limit = mc.eva_size(cursor).unwrap() as usize;
            assert!(rec.len <= limit, "{policy}: {} B at {cursor} > {limit}", rec.len);
            let (npa, _) = mc.eva_to_npa(tgt, cursor).unwrap();
            assert_eq!(rec.npa, npa);
            cursor = cursor.advance(u32::try_from(rec.len).unwrap());
        }
        // First segment runs to the end of the stripe.
        assert_eq!(records[0].len, 32 - 0x13);
    }
}

#[test]
fn write_then_read_every_policy() {
    for policy in StripingPolicy::ALL {
        let mut mc = open(policy, SoftwareTransport::new());
        let tgt = Coordinate::new(21, 12);
        let data = pattern(3 * 1024 + 5);
        mc.eva_write(tgt, Eva::new(0x8000_0400), &data).unwrap();
        let back = mc.eva_read_bytes(tgt, Eva::new(0x8000_0400), data.len()).unwrap();
        assert_eq!(&back[..], &data[..], "{policy}");
        assert_eq!(mc.transport().bytes_moved(TransferKind::Read), data.len());
    }
}

#[test]
fn policies_spread_the_same_range_differently() {
    let data = pattern(32 * 32);
    let mut layouts = Vec::new();
    for policy in StripingPolicy::ALL {
        let mut mc = open(policy, SoftwareTransport::new());
        mc.eva_write(mc.config().vcore_origin, Eva::new(0x8000_0000), &data)
            .unwrap();
        let banks: Vec<_> = mc.transport().history().iter().map(|r| r.npa.xy()).collect();
        // One full pass covers all 32 banks exactly once.
        let mut sorted = banks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 32, "{policy}");
        layouts.push(banks);
    }
    for (i, a) in layouts.iter().enumerate() {
        for b in &layouts[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn memset_covers_exactly_the_range() {
    let mut mc = open(StripingPolicy::StrideFourish, SoftwareTransport::new());
    let tgt = mc.config().vcore_origin;
    mc.eva_memset(tgt, Eva::new(0x8000_0008), 0xee, 70).unwrap();
    assert_eq!(mc.transport().bytes_moved(TransferKind::Memset), 70);

    let back = mc.eva_read_bytes(tgt, Eva::new(0x8000_0000), 96).unwrap();
    assert!(back[..8].iter().all(|&b| b == 0));
    assert!(back[8..78].iter().all(|&b| b == 0xee));
    assert!(back[78..].iter().all(|&b| b == 0));
}

#[test]
fn local_range_past_dmem_fails_after_partial_write() {
    let mut mc = open(StripingPolicy::Default, SoftwareTransport::new());
    let tile = Coordinate::new(17, 8);
    let err = mc.eva_write(tile, Eva::new(4090), &[0xaa; 10]).unwrap_err();
    assert!(matches!(err, HbError::InvalidAddress { addr: 4096, .. }));

    // The in-range tail of DMEM was written and stays written.
    assert_eq!(mc.transport().transfer_count(), 1);
    let tail = mc.transport().peek(&Npa::new(17, 8, EPA_DMEM_BASE + 4090), 6);
    assert_eq!(tail, vec![0xaa; 6]);
}

#[test]
fn transport_failure_leaves_earlier_segments() {
    let mut mc = open(StripingPolicy::Default, SoftwareTransport::new().fail_after(2));
    let tgt = mc.config().vcore_origin;
    let err = mc.eva_write(tgt, Eva::new(0x8000_0000), &[0x11; 128]).unwrap_err();
    assert!(matches!(err, HbError::TransportFailed { .. }));

    let t = mc.transport();
    assert_eq!(t.transfer_count(), 2);
    assert_eq!(t.peek(&Npa::new(16, 7, 0), 32), vec![0x11; 32]);
    assert_eq!(t.peek(&Npa::new(17, 7, 0), 32), vec![0x11; 32]);
    assert_eq!(t.peek(&Npa::new(18, 7, 0), 32), vec![0; 32]);
}

#[test]
fn dma_requires_dram_segments() {
    let mut mc = open(StripingPolicy::StrideRuche, SoftwareTransport::new().with_dma());
    let tgt = mc.config().vcore_origin;

    let data = pattern(200);
    mc.eva_write_dma(tgt, Eva::new(0x8000_1000), &data).unwrap();
    let mut buf = vec![0u8; 200];
    mc.eva_read_dma(tgt, Eva::new(0x8000_1000), &mut buf).unwrap();
    assert_eq!(buf, data);
    // DMA and mesh see the same memory.
    let mesh = mc.eva_read_bytes(tgt, Eva::new(0x8000_1000), 200).unwrap();
    assert_eq!(&mesh[..], &data[..]);

    let global = Eva::new(0x4000_0000 | (20 << 16) | (10 << 23));
    let err = mc.eva_write_dma(tgt, global, &[1]).unwrap_err();
    assert!(matches!(err, HbError::InvalidAddress { .. }));
}

#[test]
fn dma_without_engine_is_unsupported() {
    let mut mc = open(StripingPolicy::Default, SoftwareTransport::new());
    let tgt = mc.config().vcore_origin;
    let err = mc.eva_write_dma(tgt, Eva::new(0x8000_0000), &[1, 2]).unwrap_err();
    assert!(matches!(err, HbError::Unsupported { .. }));
}
