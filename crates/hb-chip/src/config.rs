//! Manycore configuration descriptor.
//!
//! [`McConfig`] is immutable once built. Every quantity the address
//! translators need is derived from it by a pure accessor.
//!
//! # Pod geometry
//!
//! ```text
//!            og.x              og.x + dim.x - 1
//!   og.y-1   [ vc ][ vc ] ... [ vc ]            north DRAM row
//!   og.y     [ T  ][ T  ] ... [ T  ]  ┐
//!    ...      ...                      │ dim.y rows of vanilla cores
//!            [ T  ][ T  ] ... [ T  ]  ┘
//!   og.y+dim.y [ vc ][ vc ] ... [ vc ]          south DRAM row
//! ```
//!
//! Pods repeat with an x pitch of `dim.x` and a y pitch of `2 * dim.y`.
//! Stacked pods need `dim.y >= 2`, otherwise a south DRAM row and the next
//! pod's north DRAM row coincide and [`McConfig::pod_of`] is ambiguous.
//! Accessors saturate instead of overflowing; `validate_config` in the
//! driver rejects the geometries where that matters.

use crate::bits::clog2;
use crate::coord::{Coordinate, Dimension};
use crate::tile::WORD_SIZE;

/// Default vcore origin of pod (0, 0).
pub const DEFAULT_VCORE_ORIGIN: Coordinate = Coordinate::new(16, 8);

/// Default vanilla-core dimension of one pod.
pub const DEFAULT_POD_DIM: Dimension = Dimension::new(16, 8);

/// Default DRAM bank size: 64 MiB.
pub const DEFAULT_DRAM_BANK_SIZE: u64 = 64 * 1024 * 1024;

/// Configuration of one manycore instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct McConfig {
    /// Hardware version word.
    pub version: u32,
    /// Top-left vanilla core of pod (0, 0).
    pub vcore_origin: Coordinate,
    /// Vanilla cores per pod.
    pub pod_dim: Dimension,
    /// Number of pods.
    pub pods: Dimension,
    /// Where the host interface sits on the mesh.
    pub host_interface: Coordinate,
    /// Bits in the NoC X coordinate.
    pub noc_coord_x_width: u32,
    /// Bits in the NoC Y coordinate.
    pub noc_coord_y_width: u32,
    /// Data memory per tile, in bytes.
    pub dmem_size: u32,
    /// Victim-cache associativity.
    pub vcache_ways: u32,
    /// Victim-cache sets.
    pub vcache_sets: u32,
    /// Words per victim-cache block.
    pub vcache_block_words: u32,
    /// Words per DRAM stripe.
    pub vcache_stripe_words: u32,
    /// Whether DRAM sits behind the victim caches.
    pub dram_enabled: bool,
    /// Bytes per DRAM bank.
    pub dram_bank_size: u64,
    /// NoC ruche factor.
    pub ruche_factor: u32,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            version: 0,
            vcore_origin: DEFAULT_VCORE_ORIGIN,
            pod_dim: DEFAULT_POD_DIM,
            pods: Dimension::new(1, 1),
            host_interface: Coordinate::new(0, 1),
            noc_coord_x_width: 7,
            noc_coord_y_width: 7,
            dmem_size: 4096,
            vcache_ways: 8,
            vcache_sets: 64,
            vcache_block_words: 8,
            vcache_stripe_words: 8,
            dram_enabled: true,
            dram_bank_size: DEFAULT_DRAM_BANK_SIZE,
            ruche_factor: 3,
        }
    }
}

impl McConfig {
    /// Vanilla cores per pod.
    #[must_use]
    pub const fn pod_dimension(&self) -> Dimension {
        self.pod_dim
    }

    /// Host interface coordinate.
    #[must_use]
    pub const fn host_interface(&self) -> Coordinate {
        self.host_interface
    }

    /// `ceil(log2(pod_dim.x))`: width of the bank X part of a DRAM index.
    #[must_use]
    pub const fn x_dimlog(&self) -> u32 {
        clog2(self.pod_dim.x as u64)
    }

    /// Bytes of one victim cache.
    #[must_use]
    pub const fn vcache_size(&self) -> u64 {
        (self.vcache_ways as u64)
            .saturating_mul(self.vcache_sets as u64)
            .saturating_mul(self.vcache_block_words as u64)
            .saturating_mul(WORD_SIZE as u64)
    }

    /// Bytes per stripe.
    #[must_use]
    pub const fn dram_stripe_size(&self) -> u32 {
        self.vcache_stripe_words.saturating_mul(WORD_SIZE)
    }

    /// `ceil(log2(stripe bytes))`.
    #[must_use]
    pub const fn dram_stripe_size_log(&self) -> u32 {
        clog2(self.dram_stripe_size() as u64)
    }

    /// Bytes addressable in one bank: DRAM size if enabled, else the victim cache.
    #[must_use]
    pub const fn dram_bank_size(&self) -> u64 {
        if self.dram_enabled {
            self.dram_bank_size
        } else {
            self.vcache_size()
        }
    }

    /// `ceil(log2(dram_bank_size()))`.
    #[must_use]
    pub const fn dram_bitwidth(&self) -> u32 {
        clog2(self.dram_bank_size())
    }

    /// Distance between corresponding coordinates of neighbouring pods.
    #[must_use]
    pub const fn pod_pitch(&self) -> Dimension {
        Dimension::new(self.pod_dim.x, self.pod_dim.y.saturating_mul(2))
    }

    /// Pod containing `xy`. DRAM rows belong to the pod they border.
    #[must_use]
    pub fn pod_of(&self, xy: Coordinate) -> Coordinate {
        let pitch = self.pod_pitch();
        let base_y = self.vcore_origin.y.saturating_sub(1);
        let px = xy
            .x
            .saturating_sub(self.vcore_origin.x)
            .checked_div(pitch.x)
            .unwrap_or(0);
        let py = xy.y.saturating_sub(base_y).checked_div(pitch.y).unwrap_or(0);
        Coordinate::new(px, py)
    }

    /// Top-left vanilla core of `pod`.
    #[must_use]
    pub const fn pod_vcore_origin(&self, pod: Coordinate) -> Coordinate {
        let pitch = self.pod_pitch();
        Coordinate::new(
            self.vcore_origin.x.saturating_add(pod.x.saturating_mul(pitch.x)),
            self.vcore_origin.y.saturating_add(pod.y.saturating_mul(pitch.y)),
        )
    }

    /// Whether `pod` exists in this configuration.
    #[must_use]
    pub const fn pod_exists(&self, pod: Coordinate) -> bool {
        pod.x < self.pods.x && pod.y < self.pods.y
    }

    /// Leftmost DRAM bank column of `pod`.
    #[must_use]
    pub const fn dram_min_x_coord(&self, pod: Coordinate) -> u32 {
        self.pod_vcore_origin(pod).x
    }

    /// Rightmost DRAM bank column of `pod`.
    #[must_use]
    pub const fn dram_max_x_coord(&self, pod: Coordinate) -> u32 {
        self.dram_min_x_coord(pod)
            .saturating_add(self.pod_dim.x.saturating_sub(1))
    }

    /// Row of the DRAM banks north of `pod`.
    #[must_use]
    pub const fn pod_dram_north_y(&self, pod: Coordinate) -> u32 {
        self.pod_vcore_origin(pod).y.saturating_sub(1)
    }

    /// Row of the DRAM banks south of `pod`.
    #[must_use]
    pub const fn pod_dram_south_y(&self, pod: Coordinate) -> u32 {
        self.pod_vcore_origin(pod).y.saturating_add(self.pod_dim.y)
    }

    fn in_dram_columns(&self, pod: Coordinate, x: u32) -> bool {
        x >= self.dram_min_x_coord(pod) && x <= self.dram_max_x_coord(pod)
    }

    /// Whether `xy` is a DRAM bank (victim cache) of some pod.
    #[must_use]
    pub fn is_dram(&self, xy: Coordinate) -> bool {
        let pod = self.pod_of(xy);
        self.pod_exists(pod)
            && self.in_dram_columns(pod, xy.x)
            && (xy.y == self.pod_dram_north_y(pod) || xy.y == self.pod_dram_south_y(pod))
    }

    /// Whether `xy` is a DRAM bank on the south side of its pod.
    #[must_use]
    pub fn is_dram_south(&self, xy: Coordinate) -> bool {
        self.is_dram(xy) && xy.y == self.pod_dram_south_y(self.pod_of(xy))
    }

    /// Whether `xy` is a vanilla core of some pod.
    #[must_use]
    pub fn is_vanilla_core(&self, xy: Coordinate) -> bool {
        let pod = self.pod_of(xy);
        if !self.pod_exists(pod) {
            return false;
        }
        let og = self.pod_vcore_origin(pod);
        xy.x >= og.x
            && xy.x < og.x + self.pod_dim.x
            && xy.y >= og.y
            && xy.y < og.y + self.pod_dim.y
    }

    /// Whether `xy` is the host interface.
    #[must_use]
    pub fn is_host_interface(&self, xy: Coordinate) -> bool {
        xy == self.host_interface
    }

    /// Every vanilla core, pod by pod, row-major inside a pod.
    pub fn vanilla_cores(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.pod_coordinates().flat_map(move |pod| {
            let og = self.pod_vcore_origin(pod);
            (0..self.pod_dim.y).flat_map(move |dy| {
                (0..self.pod_dim.x).map(move |dx| Coordinate::new(og.x + dx, og.y + dy))
            })
        })
    }

    /// Every pod, row-major.
    pub fn pod_coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.pods.y).flat_map(move |py| (0..self.pods.x).map(move |px| Coordinate::new(px, py)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_derived_quantities() {
        let cfg = McConfig::default();
        assert_eq!(cfg.x_dimlog(), 4);
        assert_eq!(cfg.dram_stripe_size(), 32);
        assert_eq!(cfg.dram_stripe_size_log(), 5);
        assert_eq!(cfg.vcache_size(), 16 * 1024);
        assert_eq!(cfg.dram_bank_size(), 64 * 1024 * 1024);
        assert_eq!(cfg.dram_bitwidth(), 26);
    }

    #[test]
    fn bank_size_falls_back_to_vcache() {
        let cfg = McConfig {
            dram_enabled: false,
            ..McConfig::default()
        };
        assert_eq!(cfg.dram_bank_size(), 16 * 1024);
        assert_eq!(cfg.dram_bitwidth(), 14);
    }

    #[test]
    fn pod_zero_geometry() {
        let cfg = McConfig::default();
        let pod = Coordinate::new(0, 0);
        assert_eq!(cfg.pod_vcore_origin(pod), Coordinate::new(16, 8));
        assert_eq!(cfg.dram_min_x_coord(pod), 16);
        assert_eq!(cfg.dram_max_x_coord(pod), 31);
        assert_eq!(cfg.pod_dram_north_y(pod), 7);
        assert_eq!(cfg.pod_dram_south_y(pod), 16);
    }

    #[test]
    fn pod_of_includes_dram_rows() {
        let cfg = McConfig {
            pods: Dimension::new(2, 2),
            ..McConfig::default()
        };
        assert_eq!(cfg.pod_of(Coordinate::new(16, 7)), Coordinate::new(0, 0));
        assert_eq!(cfg.pod_of(Coordinate::new(31, 16)), Coordinate::new(0, 0));
        assert_eq!(cfg.pod_of(Coordinate::new(32, 8)), Coordinate::new(1, 0));
        // Second pod row starts one row above its vcore origin.
        assert_eq!(cfg.pod_vcore_origin(Coordinate::new(0, 1)), Coordinate::new(16, 24));
        assert_eq!(cfg.pod_of(Coordinate::new(16, 23)), Coordinate::new(0, 1));
        assert_eq!(cfg.pod_of(Coordinate::new(47, 32)), Coordinate::new(1, 1));
    }

    #[test]
    fn endpoint_kinds() {
        let cfg = McConfig::default();
        assert!(cfg.is_dram(Coordinate::new(16, 7)));
        assert!(cfg.is_dram(Coordinate::new(31, 16)));
        assert!(!cfg.is_dram(Coordinate::new(32, 16)));
        assert!(!cfg.is_dram(Coordinate::new(20, 8)));
        assert!(cfg.is_dram_south(Coordinate::new(20, 16)));
        assert!(!cfg.is_dram_south(Coordinate::new(20, 7)));
        assert!(cfg.is_vanilla_core(Coordinate::new(16, 8)));
        assert!(cfg.is_vanilla_core(Coordinate::new(31, 15)));
        assert!(!cfg.is_vanilla_core(Coordinate::new(31, 16)));
        assert!(!cfg.is_vanilla_core(Coordinate::new(0, 1)));
        assert!(cfg.is_host_interface(Coordinate::new(0, 1)));
    }

    #[test]
    fn vanilla_core_enumeration() {
        let cfg = McConfig {
            pods: Dimension::new(2, 1),
            ..McConfig::default()
        };
        let cores: Vec<_> = cfg.vanilla_cores().collect();
        assert_eq!(cores.len(), 256);
        assert_eq!(cores[0], Coordinate::new(16, 8));
        assert_eq!(cores[127], Coordinate::new(31, 15));
        assert_eq!(cores[128], Coordinate::new(32, 8));
        assert!(cores.iter().all(|&xy| cfg.is_vanilla_core(xy)));
    }

    #[test]
    fn accessors_saturate_on_huge_geometry() {
        let cfg = McConfig {
            pods: Dimension::new(268_435_457, 1),
            vcache_ways: u32::MAX,
            vcache_sets: u32::MAX,
            vcache_block_words: u32::MAX,
            ..McConfig::default()
        };
        let last = Coordinate::new(268_435_456, 0);
        assert_eq!(cfg.pod_vcore_origin(last).x, u32::MAX);
        assert_eq!(cfg.dram_max_x_coord(last), u32::MAX);
        assert_eq!(cfg.vcache_size(), u64::MAX);
    }
}
