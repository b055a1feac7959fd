//! Host runtime for the HammerBlade manycore.
//!
//! Every device memory access starts as an EVA (Endpoint Virtual Address)
//! and reaches the mesh as one or more NPAs (Network Physical Addresses).
//! This crate owns that translation and the I/O loops built on it.
//!
//! # Layers
//!
//! ```text
//! Manycore<T>                 eva_write / eva_read / eva_memset / *_dma
//!   io::{write,read,memset}_span   split a range into contiguous segments
//!     eva::{eva_to_npa, npa_to_eva, eva_size}
//!       eva::region             DRAM → global → group → local
//!       eva::tile               shared tile mapping
//!       eva::dram + policy      per-policy DRAM striping
//!   Transport                   per-NPA data mover (SoftwareTransport)
//! ```
//!
//! # Quick start
//!
//! ```
//! use hb_driver::prelude::*;
//!
//! # fn main() -> hb_driver::Result<()> {
//! let cfg = McConfig::default();
//! let mut mc = Manycore::new(cfg, StripingPolicy::StrideRuche, SoftwareTransport::new())?;
//!
//! let tgt = mc.config().vcore_origin;
//! mc.eva_write(tgt, Eva::new(0x8000_0000), &[1, 2, 3, 4])?;
//! let (npa, size) = mc.eva_to_npa(tgt, Eva::new(0x8000_0000))?;
//! println!("{npa}, {size} bytes contiguous");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
pub mod config;
mod error;
pub mod eva;
pub mod io;
mod manycore;
mod transport;

pub use backends::SoftwareTransport;
pub use config::{config_from_rom, load_config, parse_config, validate_config, RomDefaults};
pub use error::{HbError, Result};
pub use eva::{eva_size, eva_to_npa, npa_to_eva, verify_dram_npa, Region, StripingPolicy};
pub use manycore::Manycore;
pub use transport::Transport;

/// Everything needed to open a manycore and move data.
pub mod prelude {
    pub use crate::{HbError, Manycore, SoftwareTransport, StripingPolicy, Transport};
    pub use hb_chip::{Coordinate, Dimension, Eva, McConfig, Npa};
}
