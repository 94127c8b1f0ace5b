// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bit layout of a virtual MAC address.
//!
//! ```text
//!  47                      24 23 22 21      16 15        8 7         0
//! +--------------------------+--+--+----------+-----------+-----------+
//! |          PREFIX          |R |B |   PORT   | CHAIN-ID  |    HOP    |
//! +--------------------------+--+--+----------+-----------+-----------+
//! ```
//!
//! The prefix and the two direction flags (`R`everse, `B`ackward) are fixed. The 22 bits below
//! the flags are split between PORT, CHAIN-ID and HOP according to a [`VmacLayout`]. Changing
//! that split changes the meaning of every address on the wire, so layouts are versioned and a
//! deployment must use the same version on all controllers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bits in a MAC address
pub const ADDRESS_LEN: u32 = 48;
/// Width of the fixed prefix
pub const PREFIX_LEN: u32 = 24;
/// Position of the least significant bit of the prefix
pub const PREFIX_SHIFT: u32 = ADDRESS_LEN - PREFIX_LEN;
/// Width of the direction flags
pub const FLAGS_LEN: u32 = 2;
/// Position of the least significant direction flag
pub const FLAGS_SHIFT: u32 = PREFIX_SHIFT - FLAGS_LEN;
/// Mask covering both direction flags
pub const FLAGS_MASK: u64 = ((1 << FLAGS_LEN) - 1) << FLAGS_SHIFT;
/// Bits left for PORT, CHAIN-ID and HOP
pub const FIELDS_LEN: u32 = FLAGS_SHIFT;

/// Reasons a [`VmacLayout`] is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("prefix {0:#x} does not fit in {PREFIX_LEN} bits")]
    Prefix(u32),
    #[error("port, chain id and hop widths add up to {0} bits instead of {FIELDS_LEN}")]
    Widths(u32),
    #[error("field '{0}' must be at least one bit wide")]
    EmptyField(&'static str),
    #[error("chain id field of {0} bits is wider than 16 bits")]
    ChainIdTooWide(u8),
    #[error("port field of {0} bits is wider than 8 bits")]
    PortTooWide(u8),
}

/// Field widths and prefix of one version of the virtual MAC scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLayout", into = "RawLayout")]
pub struct VmacLayout {
    version: u8,
    prefix: u32,
    port_len: u8,
    cid_len: u8,
    hop_len: u8,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawLayout {
    version: u8,
    prefix: u32,
    port_len: u8,
    cid_len: u8,
    hop_len: u8,
}

impl VmacLayout {
    /// 6-bit port, 8-bit chain id (256 chains), 8-bit hop field.
    pub const V1: VmacLayout = VmacLayout {
        version: 1,
        prefix: 0xF0_00_00,
        port_len: 6,
        cid_len: 8,
        hop_len: 8,
    };

    /// Build a layout, checking that the fields exactly fill the 22 bits below the flags.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] if the prefix is wider than 24 bits, if a field is empty, if the
    /// chain id (resp. port) field is wider than 16 (resp. 8) bits or if the widths do not add
    /// up.
    pub fn new(
        version: u8,
        prefix: u32,
        port_len: u8,
        cid_len: u8,
        hop_len: u8,
    ) -> Result<Self, LayoutError> {
        if prefix >> PREFIX_LEN != 0 {
            return Err(LayoutError::Prefix(prefix));
        }
        for (name, len) in [("port", port_len), ("chain-id", cid_len), ("hop", hop_len)] {
            if len == 0 {
                return Err(LayoutError::EmptyField(name));
            }
        }
        if cid_len > 16 {
            return Err(LayoutError::ChainIdTooWide(cid_len));
        }
        if port_len > 8 {
            return Err(LayoutError::PortTooWide(port_len));
        }
        let total = u32::from(port_len) + u32::from(cid_len) + u32::from(hop_len);
        if total != FIELDS_LEN {
            return Err(LayoutError::Widths(total));
        }
        Ok(Self {
            version,
            prefix,
            port_len,
            cid_len,
            hop_len,
        })
    }

    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }
    #[must_use]
    pub const fn prefix(&self) -> u32 {
        self.prefix
    }
    /// The prefix, in place in a 48-bit address
    #[must_use]
    pub const fn prefix_bits(&self) -> u64 {
        (self.prefix as u64) << PREFIX_SHIFT
    }
    #[must_use]
    pub const fn port_len(&self) -> u8 {
        self.port_len
    }
    #[must_use]
    pub const fn cid_len(&self) -> u8 {
        self.cid_len
    }
    #[must_use]
    pub const fn hop_len(&self) -> u8 {
        self.hop_len
    }

    #[must_use]
    pub const fn hop_shift(&self) -> u32 {
        0
    }
    #[must_use]
    pub const fn cid_shift(&self) -> u32 {
        self.hop_len as u32
    }
    #[must_use]
    pub const fn port_shift(&self) -> u32 {
        self.cid_shift() + self.cid_len as u32
    }

    /// Mask of the HOP field, which is also its initial (all-ones) value
    #[must_use]
    pub const fn hop_mask(&self) -> u64 {
        (1 << self.hop_len) - 1
    }
    #[must_use]
    pub const fn cid_mask(&self) -> u64 {
        ((1 << self.cid_len) - 1) << self.cid_shift()
    }
    #[must_use]
    pub const fn port_mask(&self) -> u64 {
        ((1 << self.port_len) - 1) << self.port_shift()
    }

    /// Number of distinct port values, i.e. ports are in `[0, port_count)`
    #[must_use]
    pub const fn port_count(&self) -> u32 {
        1 << self.port_len
    }

    /// Number of distinct chain ids, i.e. the size of the chain id pool
    #[must_use]
    pub const fn chain_id_capacity(&self) -> usize {
        1 << self.cid_len
    }
}

impl Default for VmacLayout {
    fn default() -> Self {
        Self::V1
    }
}

impl TryFrom<RawLayout> for VmacLayout {
    type Error = LayoutError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        VmacLayout::new(raw.version, raw.prefix, raw.port_len, raw.cid_len, raw.hop_len)
    }
}

impl From<VmacLayout> for RawLayout {
    fn from(layout: VmacLayout) -> Self {
        RawLayout {
            version: layout.version,
            prefix: layout.prefix,
            port_len: layout.port_len,
            cid_len: layout.cid_len,
            hop_len: layout.hop_len,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // valid in tests
mod test {
    use super::*;

    #[test]
    fn v1_is_valid() {
        let v1 = VmacLayout::V1;
        assert_eq!(
            VmacLayout::new(1, v1.prefix(), v1.port_len(), v1.cid_len(), v1.hop_len()),
            Ok(v1)
        );
        assert_eq!(v1.chain_id_capacity(), 256);
        assert_eq!(v1.port_count(), 64);
        assert_eq!(v1.hop_mask(), 0xFF);
        assert_eq!(v1.cid_shift(), 8);
        assert_eq!(v1.port_shift(), 16);
        assert_eq!(v1.prefix_bits(), 0xF0_00_00_00_00_00);
    }

    #[test]
    fn fields_do_not_overlap() {
        let v1 = VmacLayout::V1;
        let fields = [v1.prefix_bits(), FLAGS_MASK, v1.port_mask(), v1.cid_mask(), v1.hop_mask()];
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                assert_eq!(a & b, 0);
            }
        }
        assert_eq!(
            (0xFF_FF_FF << PREFIX_SHIFT) | FLAGS_MASK | v1.port_mask() | v1.cid_mask() | v1.hop_mask(),
            (1 << ADDRESS_LEN) - 1
        );
    }

    #[test]
    fn bad_layouts() {
        assert_eq!(VmacLayout::new(2, 0x1_00_00_00, 6, 8, 8), Err(LayoutError::Prefix(0x1_00_00_00)));
        assert_eq!(VmacLayout::new(2, 0xF0_00_00, 6, 8, 9), Err(LayoutError::Widths(23)));
        assert_eq!(VmacLayout::new(2, 0xF0_00_00, 0, 14, 8), Err(LayoutError::EmptyField("port")));
        assert_eq!(VmacLayout::new(2, 0xF0_00_00, 2, 17, 3), Err(LayoutError::ChainIdTooWide(17)));
        assert_eq!(VmacLayout::new(2, 0xF0_00_00, 9, 5, 8), Err(LayoutError::PortTooWide(9)));
        // wider chain id, narrower port
        let v2 = VmacLayout::new(2, 0xF0_00_00, 4, 10, 8).unwrap();
        assert_eq!(v2.chain_id_capacity(), 1024);
        assert_eq!(v2.port_count(), 16);
    }

    #[test]
    fn serde_validates() {
        let yaml = "version: 1\nprefix: 15728640\nport-len: 6\ncid-len: 8\nhop-len: 8\n";
        let layout: VmacLayout = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(layout, VmacLayout::V1);

        let yaml = "version: 1\nprefix: 15728640\nport-len: 6\ncid-len: 8\nhop-len: 7\n";
        assert!(serde_yaml_ng::from_str::<VmacLayout>(yaml).is_err());
    }
}
