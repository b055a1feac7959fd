//! DRAM striping policies
//!
//! A DRAM EVA carries a `(x_dimlog + 1)`-bit bank index just above the
//! stripe offset. A policy turns that index into a bank column (relative to
//! the pod) and a north/south side, and back again.
//!
//! | Policy | Index → bank |
//! |--------|--------------|
//! | `default` | low bits are the column, next bit is the side |
//! | `linear_tlrbrl` | as `default`, south columns run right to left |
//! | `stride_twoish` / `fourish` / `eightish` | rotate left by 1 / 2 / 3 bits, then `c % dim.x` and `c >= dim.x` |
//! | `stride_ruche` / `five` / `seven` | multiply by 3 / 5 / 7 modulo `2 * dim.x` |
//!
//! The policy only decides the bank. EPA packing is the same for all of them.

use crate::error::{HbError, Result};
use hb_chip::bits::{make_mask, rotate_left, rotate_right};
use hb_chip::McConfig;
use std::fmt;
use std::str::FromStr;

/// How the bank index of a DRAM EVA selects a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StripingPolicy {
    /// Column from the low index bits, side from the top bit
    #[default]
    Default,
    /// Left to right along the north row, right to left along the south row
    LinearTlrbrl,
    /// Index rotated left by one bit
    StrideTwoish,
    /// Index rotated left by two bits
    StrideFourish,
    /// Index rotated left by three bits
    StrideEightish,
    /// Index multiplied by the ruche stride (3)
    StrideRuche,
    /// Index multiplied by 5
    StrideFive,
    /// Index multiplied by 7
    StrideSeven,
}

/// Stride of the ruche policy; matches the NoC's ruche links.
pub const RUCHE_STRIDE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexMap {
    Direct,
    Mirrored,
    Rotate(u32),
    Multiply(u32),
}

/// Bank picked by a DRAM index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSelect {
    /// Column relative to the pod's first DRAM column. May fall outside the
    /// pod; the caller range-checks it.
    pub column: i64,
    /// Whether the bank is on the pod's south row
    pub south: bool,
}

impl StripingPolicy {
    /// Every policy.
    pub const ALL: [Self; 8] = [
        Self::Default,
        Self::LinearTlrbrl,
        Self::StrideTwoish,
        Self::StrideFourish,
        Self::StrideEightish,
        Self::StrideRuche,
        Self::StrideFive,
        Self::StrideSeven,
    ];

    /// Stable name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::LinearTlrbrl => "linear_tlrbrl",
            Self::StrideTwoish => "stride_twoish",
            Self::StrideFourish => "stride_fourish",
            Self::StrideEightish => "stride_eightish",
            Self::StrideRuche => "stride_ruche",
            Self::StrideFive => "stride_five",
            Self::StrideSeven => "stride_seven",
        }
    }

    /// One-line description.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Default => "consecutive stripes walk the north row, then the south row",
            Self::LinearTlrbrl => "north row left to right, then south row right to left",
            Self::StrideTwoish => "index rotated left by 1 bit before picking the bank",
            Self::StrideFourish => "index rotated left by 2 bits before picking the bank",
            Self::StrideEightish => "index rotated left by 3 bits before picking the bank",
            Self::StrideRuche => "index times 3 modulo twice the pod width",
            Self::StrideFive => "index times 5 modulo twice the pod width",
            Self::StrideSeven => "index times 7 modulo twice the pod width",
        }
    }

    const fn index_map(self) -> IndexMap {
        match self {
            Self::Default => IndexMap::Direct,
            Self::LinearTlrbrl => IndexMap::Mirrored,
            Self::StrideTwoish => IndexMap::Rotate(1),
            Self::StrideFourish => IndexMap::Rotate(2),
            Self::StrideEightish => IndexMap::Rotate(3),
            Self::StrideRuche => IndexMap::Multiply(RUCHE_STRIDE),
            Self::StrideFive => IndexMap::Multiply(5),
            Self::StrideSeven => IndexMap::Multiply(7),
        }
    }

    /// Multiplier of a multiplicative-stride policy.
    pub const fn stride(self) -> Option<u32> {
        match self.index_map() {
            IndexMap::Multiply(m) => Some(m),
            _ => None,
        }
    }

    /// Bank selected by the `x_dimlog + 1`-bit DRAM `index`.
    pub fn select_bank(self, cfg: &McConfig, index: u32) -> BankSelect {
        let k = cfg.x_dimlog();
        let dim_x = u64::from(cfg.pod_dim.x);
        let index = index & make_mask(k + 1);
        match self.index_map() {
            IndexMap::Direct => BankSelect {
                column: i64::from(index & make_mask(k)),
                south: (index >> k) & 1 == 1,
            },
            IndexMap::Mirrored => {
                let raw = i64::from(index & make_mask(k));
                let south = (index >> k) & 1 == 1;
                let column = if south {
                    i64::from(cfg.pod_dim.x) - 1 - raw
                } else {
                    raw
                };
                BankSelect { column, south }
            }
            IndexMap::Rotate(bits) => {
                let cache = u64::from(rotate_left(k + 1, bits, index));
                BankSelect {
                    column: modulo(cache, dim_x),
                    south: cache >= dim_x,
                }
            }
            IndexMap::Multiply(m) => {
                let scaled = u64::from(index) * u64::from(m);
                let cache = scaled.checked_rem(2 * dim_x).unwrap_or(0);
                BankSelect {
                    column: modulo(scaled, dim_x),
                    south: cache >= dim_x,
                }
            }
        }
    }

    /// DRAM index that selects the bank at pod-relative `column` on `south`.
    ///
    /// Inverse of [`select_bank`](Self::select_bank) for every bank inside
    /// the pod.
    ///
    /// # Errors
    ///
    /// Returns [`HbError::InvalidConfig`] if the policy's stride has no
    /// inverse modulo `2 * pod_dim.x`.
    pub fn bank_index(self, cfg: &McConfig, column: u32, south: bool) -> Result<u32> {
        let k = cfg.x_dimlog();
        let dim_x = cfg.pod_dim.x;
        let cache = if south { dim_x + column } else { column };
        let index = match self.index_map() {
            IndexMap::Direct => column | (u32::from(south) << k),
            IndexMap::Mirrored => {
                let raw = if south {
                    (dim_x - 1).wrapping_sub(column)
                } else {
                    column
                };
                raw | (u32::from(south) << k)
            }
            IndexMap::Rotate(bits) => rotate_right(k + 1, bits, cache),
            IndexMap::Multiply(m) => {
                let modulus = 2 * u64::from(dim_x);
                let inverse = mod_inverse(u64::from(m), modulus).ok_or_else(|| {
                    HbError::invalid_config(format!(
                        "{self}: stride {m} has no inverse modulo {modulus}"
                    ))
                })?;
                let index = (u64::from(cache) * inverse) % modulus;
                u32::try_from(index).map_err(|_| {
                    HbError::invalid_config(format!("{self}: index {index} overflows"))
                })?
            }
        };
        Ok(index)
    }

    /// Full inverse table over every cache index `0..2 * pod_dim.x`.
    ///
    /// Entry `c` is the EVA index that lands on cache `c`, where caches
    /// `0..dim.x` are the north row and `dim.x..` the south row.
    ///
    /// # Errors
    ///
    /// See [`bank_index`](Self::bank_index).
    pub fn unmap_table(self, cfg: &McConfig) -> Result<Vec<u32>> {
        let dim_x = cfg.pod_dim.x;
        (0..2 * dim_x)
            .map(|cache| {
                let south = cache >= dim_x;
                let column = if south { cache - dim_x } else { cache };
                self.bank_index(cfg, column, south)
            })
            .collect()
    }
}

fn modulo(value: u64, modulus: u64) -> i64 {
    i64::try_from(value.checked_rem(modulus).unwrap_or(0)).unwrap_or(i64::MAX)
}

/// Inverse of `a` modulo `m`, by the extended Euclidean algorithm.
///
/// `None` if `gcd(a, m) != 1` or `m < 2`.
pub fn mod_inverse(a: u64, m: u64) -> Option<u64> {
    if m < 2 {
        return None;
    }
    let (mut old_r, mut r) = (i128::from(a % m), i128::from(m));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    if old_r != 1 {
        return None;
    }
    u64::try_from(old_s.rem_euclid(i128::from(m))).ok()
}

impl fmt::Display for StripingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for StripingPolicy {
    type Err = HbError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted || p.name().strip_prefix("stride_") == Some(wanted.as_str()))
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|p| p.name()).collect();
                HbError::invalid_config(format!(
                    "unknown striping policy `{s}` (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUCHE_UNMAP: [u32; 32] = [
        0, 11, 22, 1, 12, 23, 2, 13, 24, 3, 14, 25, 4, 15, 26, 5, 16, 27, 6, 17, 28, 7, 18, 29, 8,
        19, 30, 9, 20, 31, 10, 21,
    ];
    const FIVE_UNMAP: [u32; 32] = [
        0, 13, 26, 7, 20, 1, 14, 27, 8, 21, 2, 15, 28, 9, 22, 3, 16, 29, 10, 23, 4, 17, 30, 11, 24,
        5, 18, 31, 12, 25, 6, 19,
    ];
    const SEVEN_UNMAP: [u32; 32] = [
        0, 23, 14, 5, 28, 19, 10, 1, 24, 15, 6, 29, 20, 11, 2, 25, 16, 7, 30, 21, 12, 3, 26, 17, 8,
        31, 22, 13, 4, 27, 18, 9,
    ];

    #[test]
    fn inverses_of_hardware_strides() {
        assert_eq!(mod_inverse(3, 32), Some(11));
        assert_eq!(mod_inverse(5, 32), Some(13));
        assert_eq!(mod_inverse(7, 32), Some(23));
        assert_eq!(mod_inverse(4, 32), None);
        assert_eq!(mod_inverse(3, 1), None);
        assert_eq!(mod_inverse(35, 32), Some(11));
    }

    #[test]
    fn multiplicative_tables_match_hardware() {
        let cfg = McConfig::default();
        assert_eq!(StripingPolicy::StrideRuche.unmap_table(&cfg).unwrap(), RUCHE_UNMAP);
        assert_eq!(StripingPolicy::StrideFive.unmap_table(&cfg).unwrap(), FIVE_UNMAP);
        assert_eq!(StripingPolicy::StrideSeven.unmap_table(&cfg).unwrap(), SEVEN_UNMAP);
    }

    #[test]
    fn ruche_cache_eleven() {
        let cfg = McConfig::default();
        assert_eq!(StripingPolicy::StrideRuche.bank_index(&cfg, 11, false).unwrap(), 25);
        let bank = StripingPolicy::StrideRuche.select_bank(&cfg, 25);
        assert_eq!(bank, BankSelect { column: 11, south: false });
    }

    #[test]
    fn every_table_is_a_permutation() {
        let cfg = McConfig::default();
        for policy in StripingPolicy::ALL {
            let mut table = policy.unmap_table(&cfg).unwrap();
            table.sort_unstable();
            assert_eq!(table, (0..32).collect::<Vec<_>>(), "{policy}");
        }
    }

    #[test]
    fn select_inverts_bank_index() {
        let cfg = McConfig::default();
        for policy in StripingPolicy::ALL {
            for south in [false, true] {
                for column in 0..cfg.pod_dim.x {
                    let index = policy.bank_index(&cfg, column, south).unwrap();
                    let bank = policy.select_bank(&cfg, index);
                    assert_eq!(
                        bank,
                        BankSelect { column: i64::from(column), south },
                        "{policy} column {column} south {south}"
                    );
                }
            }
        }
    }

    #[test]
    fn linear_mirrors_south_row() {
        let cfg = McConfig::default();
        let p = StripingPolicy::LinearTlrbrl;
        assert_eq!(p.select_bank(&cfg, 0), BankSelect { column: 0, south: false });
        assert_eq!(p.select_bank(&cfg, 16), BankSelect { column: 15, south: true });
        assert_eq!(p.select_bank(&cfg, 31), BankSelect { column: 0, south: true });
    }

    #[test]
    fn twoish_interleaves_sides() {
        let cfg = McConfig::default();
        let p = StripingPolicy::StrideTwoish;
        // {idx[3:0], idx[4]}
        assert_eq!(p.select_bank(&cfg, 0), BankSelect { column: 0, south: false });
        assert_eq!(p.select_bank(&cfg, 16), BankSelect { column: 1, south: false });
        assert_eq!(p.select_bank(&cfg, 8), BankSelect { column: 0, south: true });
    }

    #[test]
    fn non_invertible_stride_is_config_error() {
        let cfg = McConfig {
            pod_dim: hb_chip::Dimension::new(3, 8),
            ..McConfig::default()
        };
        let err = StripingPolicy::StrideRuche.bank_index(&cfg, 0, false).unwrap_err();
        assert!(matches!(err, HbError::InvalidConfig { .. }));
    }

    #[test]
    fn names_parse_back() {
        for policy in StripingPolicy::ALL {
            assert_eq!(policy.name().parse::<StripingPolicy>().unwrap(), policy);
            assert!(!policy.description().is_empty());
        }
        assert_eq!("ruche".parse::<StripingPolicy>().unwrap(), StripingPolicy::StrideRuche);
        assert_eq!(" Default ".parse::<StripingPolicy>().unwrap(), StripingPolicy::Default);
        assert!("zigzag".parse::<StripingPolicy>().is_err());
    }
}
