//! Configuration loading and validation
//!
//! A configuration comes from one of two places:
//!
//! - a TOML file or string, every key optional and defaulting to
//!   [`McConfig::default`]
//! - the device's configuration ROM, plus the few parameters the ROM does
//!   not carry ([`RomDefaults`])
//!
//! Either way the result passes through [`validate_config`] before use.
//!
//! ```toml
//! vcore_origin = { x = 16, y = 8 }
//! pod_dim = { x = 16, y = 8 }
//! pods = { x = 1, y = 1 }
//! vcache_stripe_words = 8
//! dram_bank_size = 67108864
//! ```

use crate::error::{HbError, Result};
use hb_chip::bits::clog2;
use hb_chip::config::{DEFAULT_DRAM_BANK_SIZE, DEFAULT_VCORE_ORIGIN};
use hb_chip::layout::{dram, GLOBAL_EPA_MASK};
use hb_chip::rom::ConfigId;
use hb_chip::tile::{EPA_CSR_BASE, EPA_DMEM_BASE};
use hb_chip::{Coordinate, Dimension, McConfig};
use std::path::Path;
use tracing::{debug, info};

/// Widest NoC coordinate field the packet formats carry.
const MAX_NOC_COORD_WIDTH: u32 = 32;

/// Load and validate a configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid TOML for
/// [`McConfig`], or fails [`validate_config`].
pub fn load_config(path: impl AsRef<Path>) -> Result<McConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let cfg = parse_config(&text)?;
    info!("Loaded configuration from {}", path.display());
    Ok(cfg)
}

/// Parse and validate a configuration from TOML text.
///
/// # Errors
///
/// Returns error if the text is not valid TOML for [`McConfig`] or fails
/// [`validate_config`].
pub fn parse_config(text: &str) -> Result<McConfig> {
    let cfg: McConfig = toml::from_str(text)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Render a configuration as TOML.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn render_config(cfg: &McConfig) -> Result<String> {
    toml::to_string_pretty(cfg).map_err(|e| HbError::invalid_config(e.to_string()))
}

fn require_nonzero(value: u64, what: &str) -> Result<()> {
    if value == 0 {
        return Err(HbError::invalid_config(format!("{what} must be nonzero")));
    }
    Ok(())
}

/// Rightmost DRAM column and southmost DRAM row of the last pod, or `None`
/// if either overflows a `u32`.
fn mesh_extent(cfg: &McConfig) -> Option<(u32, u32)> {
    let pitch = cfg.pod_pitch();
    let max_x = (cfg.pods.x - 1)
        .checked_mul(pitch.x)?
        .checked_add(cfg.vcore_origin.x)?
        .checked_add(cfg.pod_dim.x - 1)?;
    let max_y = (cfg.pods.y - 1)
        .checked_mul(cfg.pod_dim.y.checked_mul(2)?)?
        .checked_add(cfg.vcore_origin.y)?
        .checked_add(cfg.pod_dim.y)?;
    Some((max_x, max_y))
}

/// Check that a configuration describes a mesh the translators can address.
///
/// # Errors
///
/// Returns [`HbError::InvalidConfig`] naming the first failed check.
pub fn validate_config(cfg: &McConfig) -> Result<()> {
    require_nonzero(cfg.pod_dim.x.into(), "pod_dim.x")?;
    require_nonzero(cfg.pod_dim.y.into(), "pod_dim.y")?;
    require_nonzero(cfg.pods.x.into(), "pods.x")?;
    require_nonzero(cfg.pods.y.into(), "pods.y")?;
    require_nonzero(cfg.dmem_size.into(), "dmem_size")?;
    require_nonzero(cfg.vcache_ways.into(), "vcache_ways")?;
    require_nonzero(cfg.vcache_sets.into(), "vcache_sets")?;
    require_nonzero(cfg.vcache_block_words.into(), "vcache_block_words")?;
    require_nonzero(cfg.vcache_stripe_words.into(), "vcache_stripe_words")?;
    if cfg.dram_enabled {
        require_nonzero(cfg.dram_bank_size, "dram_bank_size")?;
    }

    if cfg.vcore_origin.y == 0 {
        return Err(HbError::invalid_config(
            "vcore_origin.y must leave room for the north DRAM row",
        ));
    }

    let stripe = cfg.dram_stripe_size();
    if !stripe.is_power_of_two() {
        return Err(HbError::invalid_config(format!(
            "stripe size {stripe} bytes is not a power of two"
        )));
    }
    if u64::from(stripe) > cfg.dram_bank_size() {
        return Err(HbError::invalid_config(format!(
            "stripe size {stripe} exceeds bank size {}",
            cfg.dram_bank_size()
        )));
    }

    let dmem_limit = (EPA_CSR_BASE - EPA_DMEM_BASE).min(GLOBAL_EPA_MASK + 1);
    if cfg.dmem_size > dmem_limit {
        return Err(HbError::invalid_config(format!(
            "dmem_size {} exceeds the {dmem_limit}-byte tile window",
            cfg.dmem_size
        )));
    }

    if cfg.pods.y > 1 && cfg.pod_dim.y < 2 {
        // With one row per pod, a pod's south DRAM row is the next pod's north row.
        return Err(HbError::invalid_config(format!(
            "pod_dim.y {} leaves no room between stacked pods",
            cfg.pod_dim.y
        )));
    }

    for (width, axis) in [(cfg.noc_coord_x_width, "X"), (cfg.noc_coord_y_width, "Y")] {
        if width == 0 || width > MAX_NOC_COORD_WIDTH {
            return Err(HbError::invalid_config(format!(
                "NoC {axis} width {width} is outside [1, {MAX_NOC_COORD_WIDTH}]"
            )));
        }
    }

    let (max_x, max_y) = mesh_extent(cfg).ok_or_else(|| {
        HbError::invalid_config(format!(
            "{} pods of {} vcores at {} overflow the coordinate space",
            cfg.pods, cfg.pod_dim, cfg.vcore_origin
        ))
    })?;
    if u64::from(max_x) >> cfg.noc_coord_x_width != 0 {
        return Err(HbError::invalid_config(format!(
            "column {max_x} does not fit in {} NoC X bits",
            cfg.noc_coord_x_width
        )));
    }
    if u64::from(max_y) >> cfg.noc_coord_y_width != 0 {
        return Err(HbError::invalid_config(format!(
            "row {max_y} does not fit in {} NoC Y bits",
            cfg.noc_coord_y_width
        )));
    }

    let dram_field = cfg.dram_bitwidth() + cfg.x_dimlog() + 1;
    if dram_field > dram::BITIDX {
        return Err(HbError::invalid_config(format!(
            "DRAM EVA needs {dram_field} bits below the DRAM bit, only {} available",
            dram::BITIDX
        )));
    }

    debug!(
        "Configuration valid: {} pods of {} vcores, origin {}, stripe {} B, bank {} B",
        cfg.pods,
        cfg.pod_dim,
        cfg.vcore_origin,
        stripe,
        cfg.dram_bank_size()
    );
    Ok(())
}

/// Parameters that the configuration ROM does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomDefaults {
    /// Top-left vanilla core of pod (0, 0)
    pub vcore_origin: Coordinate,
    /// Data memory per tile, in bytes
    pub dmem_size: u32,
    /// Whether DRAM sits behind the victim caches
    pub dram_enabled: bool,
    /// Bytes per DRAM bank
    pub dram_bank_size: u64,
}

impl Default for RomDefaults {
    fn default() -> Self {
        let cfg = McConfig::default();
        Self {
            vcore_origin: DEFAULT_VCORE_ORIGIN,
            dmem_size: cfg.dmem_size,
            dram_enabled: cfg.dram_enabled,
            dram_bank_size: DEFAULT_DRAM_BANK_SIZE,
        }
    }
}

/// Build a configuration from configuration-ROM words.
///
/// # Errors
///
/// Returns [`HbError::InvalidConfig`] if `words` is shorter than
/// [`ConfigId::COUNT`] or the result fails [`validate_config`].
pub fn config_from_rom(words: &[u32], defaults: RomDefaults) -> Result<McConfig> {
    if words.len() < ConfigId::COUNT {
        return Err(HbError::invalid_config(format!(
            "configuration ROM has {} words, expected {}",
            words.len(),
            ConfigId::COUNT
        )));
    }
    let rom = |id: ConfigId| words[id.index()];

    let cfg = McConfig {
        version: rom(ConfigId::Version),
        vcore_origin: defaults.vcore_origin,
        pod_dim: Dimension::new(rom(ConfigId::PodDimX), rom(ConfigId::PodDimY)),
        pods: Dimension::new(rom(ConfigId::DimPodsX), rom(ConfigId::DimPodsY)),
        host_interface: Coordinate::new(
            rom(ConfigId::HostInterfaceCoordX),
            rom(ConfigId::HostInterfaceCoordY),
        ),
        noc_coord_x_width: rom(ConfigId::NocCoordXWidth),
        noc_coord_y_width: rom(ConfigId::NocCoordYWidth),
        dmem_size: defaults.dmem_size,
        vcache_ways: rom(ConfigId::VcacheWays),
        vcache_sets: rom(ConfigId::VcacheSets),
        vcache_block_words: rom(ConfigId::VcacheBlockWords),
        vcache_stripe_words: rom(ConfigId::VcacheStripeWords),
        dram_enabled: defaults.dram_enabled,
        dram_bank_size: defaults.dram_bank_size,
        ruche_factor: rom(ConfigId::NocRucheFactorX),
    };

    for id in ConfigId::ALL {
        debug!("ROM {:<45} = 0x{:08x}", id.name(), rom(id));
    }
    validate_config(&cfg)?;
    info!(
        "Configuration ROM v0x{:08x}: {} pods of {} vcores, {}-bit DRAM EPA",
        cfg.version,
        cfg.pods,
        cfg.pod_dim,
        clog2(cfg.dram_bank_size())
    );
    Ok(cfg)
}

/// Configuration ROM image describing `cfg`.
///
/// Fields with no counterpart in [`McConfig`] are zero.
#[must_use]
pub fn rom_image(cfg: &McConfig) -> Vec<u32> {
    let mut words = vec![0u32; ConfigId::COUNT];
    let mut set = |id: ConfigId, value: u32| words[id.index()] = value;
    set(ConfigId::Version, cfg.version);
    set(ConfigId::PodDimX, cfg.pod_dim.x);
    set(ConfigId::PodDimY, cfg.pod_dim.y);
    set(ConfigId::DimPodsX, cfg.pods.x);
    set(ConfigId::DimPodsY, cfg.pods.y);
    set(ConfigId::HostInterfaceCoordX, cfg.host_interface.x);
    set(ConfigId::HostInterfaceCoordY, cfg.host_interface.y);
    set(ConfigId::NocCoordXWidth, cfg.noc_coord_x_width);
    set(ConfigId::NocCoordYWidth, cfg.noc_coord_y_width);
    set(ConfigId::NocRucheFactorX, cfg.ruche_factor);
    set(ConfigId::VcacheWays, cfg.vcache_ways);
    set(ConfigId::VcacheSets, cfg.vcache_sets);
    set(ConfigId::VcacheBlockWords, cfg.vcache_block_words);
    set(ConfigId::VcacheStripeWords, cfg.vcache_stripe_words);
    words
}
