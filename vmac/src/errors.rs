// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error results used by this library.

use crate::address::VirtualMac;
use crate::chainid::ChainId;
use crate::mac::Mac;
use thiserror::Error;

/// Inputs rejected before any state is touched
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParameter {
    #[error("port {port} does not fit the port field (max {max})")]
    Port { port: u8, max: u32 },
    #[error("flags {0:#x} set bits outside the direction flags")]
    Flags(u64),
    #[error("chain id {id} is outside [0, {capacity})")]
    ChainId { id: ChainId, capacity: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmacError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] InvalidParameter),

    #[error("No free chain id left (capacity {0})")]
    ExhaustedPool(usize),

    #[error("Chain id {0} is not in use")]
    DoubleRelease(ChainId),

    #[error("Hop {index} from {base} leaves the 48-bit address space")]
    AddressOverflow { base: VirtualMac, index: u16 },

    #[error("{0} does not carry the virtual MAC prefix")]
    NotVirtual(Mac),
}

pub type VmacResult<T> = Result<T, VmacError>;
