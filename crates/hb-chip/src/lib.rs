//! Silicon model for the HammerBlade (Bladerunner) manycore.
//!
//! This crate has **no required dependencies** and **no hardware access**. It
//! is a pure model of the chip as the host sees it: mesh coordinates, the
//! 32-bit EVA bit layout, the tile memory map, and the configuration
//! descriptor with every quantity derived from it.
//!
//! Enable the `serde` feature to (de)serialize [`config::McConfig`] and the
//! coordinate types.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`bits`] | Width-explicit mask and circular-shift helpers, `clog2` |
//! | [`coord`] | Mesh [`Coordinate`](coord::Coordinate) and [`Dimension`](coord::Dimension) |
//! | [`addr`] | [`Eva`](addr::Eva), [`Npa`](addr::Npa) and EPA value types |
//! | [`layout`] | EVA bit positions for the DRAM, global and group regions |
//! | [`tile`] | Tile EPA map: DMEM window and CSRs |
//! | [`config`] | Configuration descriptor, pod geometry, DRAM geometry |
//! | [`rom`] | Configuration-ROM field ids and names |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod addr;
pub mod bits;
pub mod config;
pub mod coord;
pub mod layout;
pub mod rom;
pub mod tile;

pub use addr::{Epa, Eva, Npa};
pub use config::McConfig;
pub use coord::{Coordinate, Dimension};
