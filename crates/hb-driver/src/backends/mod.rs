//! Transport implementations
//!
//! - **Software**: in-memory mesh model for tests and offline tooling

pub mod software;

pub use software::{SoftwareTransport, TransferKind, TransferRecord};
