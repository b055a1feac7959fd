//! Error types for manycore host operations

use thiserror::Error;

/// Result type alias for manycore operations
pub type Result<T> = std::result::Result<T, HbError>;

/// Errors that can occur during translation, configuration and transfer
#[derive(Debug, Error)]
pub enum HbError {
    /// Address lies outside the configured bounds of its region
    #[error("Invalid address 0x{addr:08x}: {reason}")]
    InvalidAddress {
        /// Offending EVA or EPA
        addr: u32,
        /// What bound was violated
        reason: String,
    },

    /// Address classifies to no known region
    #[error("Address 0x{addr:08x} does not map to a known region")]
    UnmappedAddress {
        /// Offending EVA or EPA
        addr: u32,
    },

    /// Underlying transport rejected a transfer
    #[error("Transport failed: {reason}")]
    TransportFailed {
        /// Reason for failure
        reason: String,
    },

    /// Configuration is inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What check failed
        reason: String,
    },

    /// Configuration file is not valid TOML for [`hb_chip::McConfig`]
    #[error("Failed to parse configuration: {source}")]
    ConfigParse {
        /// Underlying parse error
        #[from]
        source: toml::de::Error,
    },

    /// I/O error while reading configuration
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Transport does not implement the requested operation
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// Operation name
        operation: String,
    },
}

impl HbError {
    /// Create an invalid address error
    pub fn invalid_address(addr: u32, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            addr,
            reason: reason.into(),
        }
    }

    /// Create an unmapped address error
    pub const fn unmapped_address(addr: u32) -> Self {
        Self::UnmappedAddress { addr }
    }

    /// Create a transport failed error
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        Self::TransportFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Whether this is a translation failure rather than a transfer or setup failure
    pub const fn is_translation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. } | Self::UnmappedAddress { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_address() {
        let err = HbError::invalid_address(0x8000_0100, "X out of range");
        assert_eq!(
            err.to_string(),
            "Invalid address 0x80000100: X out of range"
        );
        assert_eq!(
            HbError::unmapped_address(0x40).to_string(),
            "Address 0x00000040 does not map to a known region"
        );
    }

    #[test]
    fn translation_errors_are_classified() {
        assert!(HbError::unmapped_address(0).is_translation_error());
        assert!(HbError::invalid_address(0, "x").is_translation_error());
        assert!(!HbError::transport_failed("link down").is_translation_error());
        assert!(!HbError::unsupported("dma_write").is_translation_error());
    }
}
