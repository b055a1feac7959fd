//! Configuration ROM.
//!
//! The device publishes its build parameters as a ROM of 32-bit words. Word
//! `i` holds the field whose [`ConfigId::index`] is `i`.

use std::fmt;

/// Field of the configuration ROM, in ROM order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum ConfigId {
    Version = 0,
    Timestamp,
    NetworkAddrWidth,
    NetworkDataWidth,
    PodDimX,
    PodDimY,
    DimPodsX,
    DimPodsY,
    HostInterfaceCoordX,
    HostInterfaceCoordY,
    NocCoordXWidth,
    NocCoordYWidth,
    NocRucheFactorX,
    BarrierRucheFactorX,
    WormholeRucheFactorX,
    RepoBasejumpHash,
    RepoManycoreHash,
    RepoF1Hash,
    VcacheWays,
    VcacheSets,
    VcacheBlockWords,
    VcacheStripeWords,
    VcacheMissFifoEls,
    IoRemoteLoadCap,
    IoHostCreditsCap,
    IoEpMaxOutCredits,
}

impl ConfigId {
    /// Number of ROM words.
    pub const COUNT: usize = 26;

    /// Every field, in ROM order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Version,
        Self::Timestamp,
        Self::NetworkAddrWidth,
        Self::NetworkDataWidth,
        Self::PodDimX,
        Self::PodDimY,
        Self::DimPodsX,
        Self::DimPodsY,
        Self::HostInterfaceCoordX,
        Self::HostInterfaceCoordY,
        Self::NocCoordXWidth,
        Self::NocCoordYWidth,
        Self::NocRucheFactorX,
        Self::BarrierRucheFactorX,
        Self::WormholeRucheFactorX,
        Self::RepoBasejumpHash,
        Self::RepoManycoreHash,
        Self::RepoF1Hash,
        Self::VcacheWays,
        Self::VcacheSets,
        Self::VcacheBlockWords,
        Self::VcacheStripeWords,
        Self::VcacheMissFifoEls,
        Self::IoRemoteLoadCap,
        Self::IoHostCreditsCap,
        Self::IoEpMaxOutCredits,
    ];

    /// Word offset in the ROM.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Field at ROM word `index`, if any.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Human-readable field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Version => "BLADERUNNER HARDWARE VERSION",
            Self::Timestamp => "BLADERUNNER COMPILATION DATE TIMESTAMP",
            Self::NetworkAddrWidth => "BLADERUNNER NETWORK ADDRESS WIDTH",
            Self::NetworkDataWidth => "BLADERUNNER NETWORK DATA WIDTH",
            Self::PodDimX => "BLADERUNNER POD DIMENSION X",
            Self::PodDimY => "BLADERUNNER POD DIMENSION Y",
            Self::DimPodsX => "BLADERUNNER NUMBER OF PODS X",
            Self::DimPodsY => "BLADERUNNER NUMBER OF PODS Y",
            Self::HostInterfaceCoordX => "BLADERUNNER HOST INTERFACE DIMENSION X",
            Self::HostInterfaceCoordY => "BLADERUNNER HOST INTERFACE DIMENSION Y",
            Self::NocCoordXWidth => "BLADERUNNER NOC COORD X WIDTH",
            Self::NocCoordYWidth => "BLADERUNNER NOC COORD Y WIDTH",
            Self::NocRucheFactorX => "BLADERUNNER NOC RUCHE FACTOR X",
            Self::BarrierRucheFactorX => "BLADERUNNER BARRIER RUCHE FACTOR X",
            Self::WormholeRucheFactorX => "BLADERUNNER WH RUCHE FACTOR X",
            Self::RepoBasejumpHash => "BLADERUNNER REPO BASEJUMP HASH",
            Self::RepoManycoreHash => "BLADERUNNER REPO MANYCORE HASH",
            Self::RepoF1Hash => "BLADERUNNER REPO F1 HASH",
            Self::VcacheWays => "BLADERUNNER VCACHE WAYS",
            Self::VcacheSets => "BLADERUNNER VCACHE SETS",
            Self::VcacheBlockWords => "BLADERUNNER VCACHE BLOCK SIZE IN WORDS",
            Self::VcacheStripeWords => "BLADERUNNER VCACHE STRIPE SIZE IN WORDS",
            Self::VcacheMissFifoEls => "BLADERUNNER VCACHE MISS FIFO ELS",
            Self::IoRemoteLoadCap => "BLADERUNNER IO REMOTE LOAD CAPACITY",
            Self::IoHostCreditsCap => "BLADERUNNER IO HOST REQUEST CREDITS CAPACITY",
            Self::IoEpMaxOutCredits => "BLADERUNNER IO ENDPOINT MAX OUT CREDITS",
        }
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
