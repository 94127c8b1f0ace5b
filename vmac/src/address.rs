// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Virtual MAC addresses and their direction flags.

use crate::errors::{VmacError, VmacResult};
use crate::layout::FLAGS_MASK;
use crate::mac::Mac;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

bitflags! {
    /// Direction flags, in place in a 48-bit address.
    ///
    /// No flag set means the forward (default) direction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct VmacFlags: u64 {
        const REVERSE = 1 << 23;
        const BACKWARD = 1 << 22;
    }
}

impl VmacFlags {
    pub const FORWARD: VmacFlags = VmacFlags::empty();

    /// The [`Direction`] these flags encode, if they encode exactly one.
    #[must_use]
    pub fn direction(self) -> Option<Direction> {
        if self == Self::FORWARD {
            Some(Direction::Forward)
        } else if self == Self::BACKWARD {
            Some(Direction::Backward)
        } else if self == Self::REVERSE {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

const _: () = assert!(VmacFlags::all().bits() == FLAGS_MASK);

/// Direction of travel along a service chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Forward,
    Backward,
    Reverse,
}

impl From<Direction> for VmacFlags {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => VmacFlags::FORWARD,
            Direction::Backward => VmacFlags::BACKWARD,
            Direction::Reverse => VmacFlags::REVERSE,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// A MAC address carrying service chain state.
///
/// The numeric value is kept so that hop addresses can be derived by plain addition. It is
/// always within 48 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Mac", into = "Mac")]
pub struct VirtualMac(u64);

impl VirtualMac {
    pub(crate) const fn from_raw(value: u64) -> Self {
        Self(value & Mac::MAX_U64)
    }

    /// The numeric value of the address
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn mac(&self) -> Mac {
        Mac::from_u64(self.0)
    }

    /// The 24-bit prefix
    #[must_use]
    pub const fn prefix(&self) -> u32 {
        // fits: the value is 48 bits wide
        #[allow(clippy::cast_possible_truncation)]
        let prefix = (self.0 >> crate::layout::PREFIX_SHIFT) as u32;
        prefix
    }

    #[must_use]
    pub const fn flags(&self) -> VmacFlags {
        VmacFlags::from_bits_truncate(self.0)
    }

    /// The direction encoded in the flags, or `None` if both flags are set
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.flags().direction()
    }

    /// The address used at hop `index`: the numeric address plus `index`.
    ///
    /// Whether callers count hops up or down is their business, this only adds.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::AddressOverflow`] if the sum does not fit in 48 bits.
    pub fn hop(&self, index: u16) -> VmacResult<VirtualMac> {
        match self.0.checked_add(u64::from(index)) {
            Some(value) if value <= Mac::MAX_U64 => Ok(VirtualMac(value)),
            _ => Err(VmacError::AddressOverflow { base: *self, index }),
        }
    }
}

impl From<Mac> for VirtualMac {
    fn from(mac: Mac) -> Self {
        VirtualMac(mac.as_u64())
    }
}

impl From<VirtualMac> for Mac {
    fn from(vmac: VirtualMac) -> Self {
        vmac.mac()
    }
}

impl Display for VirtualMac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.mac().fmt(f)
    }
}
