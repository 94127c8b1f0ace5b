// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Encoding of service chain state into virtual MAC addresses.

use crate::address::{Direction, VirtualMac, VmacFlags};
use crate::chainid::{ChainId, ChainIdAllocator, ChainUuid};
use crate::errors::{InvalidParameter, VmacError, VmacResult};
use crate::layout::VmacLayout;
use crate::mac::Mac;
use concurrency::sync::Arc;
use tracectl::trace_target;
use tracing::debug;

trace_target!("vmac-codec", LevelFilter::INFO, &["vmac"]);

/// The fields of a virtual MAC, as decoded with a given [`VmacLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmacFields {
    pub flags: VmacFlags,
    pub port: u8,
    pub chain_id: ChainId,
    pub hop: u32,
}

/// Builds and decodes virtual MACs for one [`VmacLayout`].
///
/// The codec itself is stateless. It holds a handle to the [`ChainIdAllocator`] shared by
/// everything that renders paths, which the chain-based constructors
/// ([`AddressCodec::forward_address`], [`AddressCodec::backward_address`]) go through.
#[derive(Debug, Clone)]
pub struct AddressCodec {
    layout: VmacLayout,
    allocator: Arc<ChainIdAllocator>,
}

impl AddressCodec {
    /// Create a codec for `layout` drawing chain ids from `allocator`.
    ///
    /// # Errors
    ///
    /// Fails if the allocator can hand out ids which do not fit the layout's CHAIN-ID field.
    pub fn new(layout: VmacLayout, allocator: Arc<ChainIdAllocator>) -> VmacResult<Self> {
        let capacity = layout.chain_id_capacity();
        if allocator.capacity() > capacity {
            // the largest id the allocator may hand out is its capacity minus one
            let id = u16::try_from(allocator.capacity() - 1).unwrap_or(u16::MAX);
            return Err(InvalidParameter::ChainId {
                id: ChainId::new(id),
                capacity,
            }
            .into());
        }
        Ok(Self { layout, allocator })
    }

    #[must_use]
    pub fn layout(&self) -> &VmacLayout {
        &self.layout
    }

    #[must_use]
    pub fn allocator(&self) -> &Arc<ChainIdAllocator> {
        &self.allocator
    }

    fn check_port(&self, port: u8) -> VmacResult<()> {
        let count = self.layout.port_count();
        if u32::from(port) >= count {
            return Err(InvalidParameter::Port {
                port,
                max: count - 1,
            }
            .into());
        }
        Ok(())
    }

    /// Build the base address for `flags`, `port` and `chain_id`. The HOP field is all ones.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::InvalidParameter`] if `port` or `chain_id` do not fit their field,
    /// or if `flags` has bits outside the two direction flags.
    pub fn construct(
        &self,
        flags: VmacFlags,
        port: u8,
        chain_id: ChainId,
    ) -> VmacResult<VirtualMac> {
        let layout = &self.layout;
        self.check_port(port)?;
        if !VmacFlags::all().contains(flags) {
            return Err(InvalidParameter::Flags(flags.bits()).into());
        }
        if usize::from(chain_id.as_u16()) >= layout.chain_id_capacity() {
            return Err(InvalidParameter::ChainId {
                id: chain_id,
                capacity: layout.chain_id_capacity(),
            }
            .into());
        }
        let value = layout.prefix_bits()
            | flags.bits()
            | (u64::from(port) << layout.port_shift())
            | (u64::from(chain_id.as_u16()) << layout.cid_shift())
            | layout.hop_mask();
        Ok(VirtualMac::from_raw(value))
    }

    /// Build the base address of `chain` in `direction`, binding a chain id to the chain if it
    /// does not have one yet.
    ///
    /// # Errors
    ///
    /// Fails if `port` is out of range, in which case no chain id is bound, or if no chain id
    /// is left for a new chain.
    pub fn address(
        &self,
        direction: Direction,
        chain: ChainUuid,
        port: u8,
    ) -> VmacResult<VirtualMac> {
        self.check_port(port)?;
        let chain_id = self.allocator.get_or_allocate(chain)?;
        let vmac = self.construct(direction.into(), port, chain_id)?;
        debug!("{direction} address of chain {chain} (id {chain_id}, port {port}): {vmac}");
        Ok(vmac)
    }

    /// Base address of `chain` in the forward direction.
    ///
    /// # Errors
    ///
    /// See [`AddressCodec::address`].
    pub fn forward_address(&self, chain: ChainUuid, port: u8) -> VmacResult<VirtualMac> {
        self.address(Direction::Forward, chain, port)
    }

    /// Base address of `chain` in the backward direction.
    ///
    /// # Errors
    ///
    /// See [`AddressCodec::address`].
    pub fn backward_address(&self, chain: ChainUuid, port: u8) -> VmacResult<VirtualMac> {
        self.address(Direction::Backward, chain, port)
    }

    /// The address to use at hop `index` of a path whose base address is `base`.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::AddressOverflow`] if the result leaves the 48-bit address space.
    pub fn hop_address(&self, base: VirtualMac, index: u16) -> VmacResult<VirtualMac> {
        base.hop(index)
    }

    /// The addresses of hops `0..hops` of a path whose base address is `base`.
    pub fn hop_addresses(
        &self,
        base: VirtualMac,
        hops: u16,
    ) -> impl Iterator<Item = VmacResult<VirtualMac>> {
        (0..hops).map(move |index| base.hop(index))
    }

    /// Split a MAC into the fields of this codec's layout.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::NotVirtual`] if `mac` does not carry this layout's prefix.
    pub fn decode(&self, mac: Mac) -> VmacResult<VmacFields> {
        let vmac = VirtualMac::from(mac);
        if vmac.prefix() != self.layout.prefix() {
            return Err(VmacError::NotVirtual(mac));
        }
        let value = vmac.as_u64();
        let layout = &self.layout;
        let field = |mask: u64, shift: u32| (value & mask) >> shift;
        // no field is wider than its type, see VmacLayout::new
        Ok(VmacFields {
            flags: vmac.flags(),
            port: u8::try_from(field(layout.port_mask(), layout.port_shift()))
                .unwrap_or(u8::MAX),
            chain_id: ChainId::new(
                u16::try_from(field(layout.cid_mask(), layout.cid_shift())).unwrap_or(u16::MAX),
            ),
            hop: u32::try_from(field(layout.hop_mask(), layout.hop_shift())).unwrap_or(u32::MAX),
        })
    }
}
